//! Merkle inclusion proofs.

use crate::{keccak_concat, Hash, MerkleError};

/// Inclusion witness for a node of `log2_target_size` within a tree of
/// `log2_root_size`.
///
/// `sibling_hashes` is ordered bottom-up: index 0 is the sibling at the
/// target level, the last entry is the sibling just below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub target_address: u64,
    pub log2_target_size: u32,
    pub target_hash: Hash,
    pub log2_root_size: u32,
    pub root_hash: Hash,
    pub sibling_hashes: Vec<Hash>,
}

impl Proof {
    /// Recomputes the root implied by the target hash and the sibling path.
    pub fn compute_root(&self) -> Hash {
        let mut hash = self.target_hash;
        for (i, sibling) in self.sibling_hashes.iter().enumerate() {
            let level = self.log2_target_size + i as u32;
            hash = if (self.target_address >> level) & 1 == 1 {
                keccak_concat(sibling, &hash)
            } else {
                keccak_concat(&hash, sibling)
            };
        }
        hash
    }

    /// Checks the sibling path against the recorded root.
    pub fn verify(&self) -> bool {
        self.sibling_hashes.len() == (self.log2_root_size - self.log2_target_size) as usize
            && self.compute_root() == self.root_hash
    }

    /// Extracts the sub-proof between two log2 levels.
    ///
    /// The returned proof is rooted at `log2_root_size` and targets the
    /// ancestor of the original target at `log2_target_size`; its root is
    /// recomputed from the retained sibling path, and its address is the
    /// target's offset within the new root's subtree.
    pub fn slice(&self, log2_root_size: u32, log2_target_size: u32) -> Result<Proof, MerkleError> {
        if log2_target_size < self.log2_target_size
            || log2_root_size > self.log2_root_size
            || log2_target_size > log2_root_size
        {
            return Err(MerkleError::InvalidSlice(log2_root_size, log2_target_size));
        }
        let sibling = |level: u32| self.sibling_hashes[(level - self.log2_target_size) as usize];
        let climb = |mut hash: Hash, from: u32, to: u32| {
            for level in from..to {
                hash = if (self.target_address >> level) & 1 == 1 {
                    keccak_concat(&sibling(level), &hash)
                } else {
                    keccak_concat(&hash, &sibling(level))
                };
            }
            hash
        };
        let target_hash = climb(self.target_hash, self.log2_target_size, log2_target_size);
        let root_hash = climb(target_hash, log2_target_size, log2_root_size);
        let root_mask = if log2_root_size == 64 {
            u64::MAX
        } else {
            (1u64 << log2_root_size) - 1
        };
        let target_address = (self.target_address & root_mask) >> log2_target_size << log2_target_size;
        Ok(Proof {
            target_address,
            log2_target_size,
            target_hash,
            log2_root_size,
            root_hash,
            sibling_hashes: (log2_target_size..log2_root_size).map(sibling).collect(),
        })
    }
}
