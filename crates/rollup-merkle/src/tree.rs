//! The append-only complete Merkle tree.

use crate::{keccak_concat, MerkleError, Hash, PristineHashes, Proof};

/// A fixed-depth sparse Merkle tree that accepts leaf hashes in order.
///
/// The tree spans addresses `[0, 2^log2_root_size)`; each leaf covers
/// `2^log2_leaf_size` addresses. Leaves beyond the appended prefix are
/// pristine, so the root and all proofs are well defined at every size and
/// independent of insertion timing.
#[derive(Debug, Clone)]
pub struct CompleteMerkleTree {
    log2_root_size: u32,
    log2_leaf_size: u32,
    pristine: PristineHashes,
    leaves: Vec<Hash>,
}

impl CompleteMerkleTree {
    /// Creates an empty tree.
    ///
    /// `log2_word_size` is the granularity below which proofs are never
    /// requested; it must not exceed the leaf size.
    pub fn new(log2_root_size: u32, log2_leaf_size: u32, log2_word_size: u32) -> Self {
        assert!(log2_word_size <= log2_leaf_size, "word larger than leaf");
        assert!(log2_leaf_size <= log2_root_size, "leaf larger than root");
        assert!(log2_root_size < 64, "root size out of bounds");
        Self {
            log2_root_size,
            log2_leaf_size,
            pristine: PristineHashes::new(log2_root_size, log2_leaf_size),
            leaves: Vec::new(),
        }
    }

    /// Number of leaves appended so far.
    pub fn size(&self) -> u64 {
        self.leaves.len() as u64
    }

    /// Maximum number of leaves the tree can hold.
    pub fn max_size(&self) -> u64 {
        1u64 << (self.log2_root_size - self.log2_leaf_size)
    }

    /// Appends a leaf hash.
    pub fn push_back(&mut self, leaf: Hash) -> Result<(), MerkleError> {
        if self.size() == self.max_size() {
            return Err(MerkleError::TreeFull);
        }
        self.leaves.push(leaf);
        Ok(())
    }

    /// Root hash over the full address span.
    pub fn root(&self) -> Hash {
        self.node_hash(0, self.log2_root_size)
    }

    /// Inclusion proof for the node of `log2_size` at `address`.
    pub fn get_proof(&self, address: u64, log2_size: u32) -> Result<Proof, MerkleError> {
        if log2_size < self.log2_leaf_size || log2_size > self.log2_root_size {
            return Err(MerkleError::SizeOutOfRange(
                log2_size,
                self.log2_leaf_size,
                self.log2_root_size,
            ));
        }
        let span = 1u64 << self.log2_root_size;
        if address & ((1u64 << log2_size) - 1) != 0 || address >= span {
            return Err(MerkleError::MisalignedAddress(address, log2_size));
        }
        let sibling_hashes = (log2_size..self.log2_root_size)
            .map(|level| {
                let ancestor = address & !((1u64 << level) - 1);
                self.node_hash(ancestor ^ (1u64 << level), level)
            })
            .collect();
        Ok(Proof {
            target_address: address,
            log2_target_size: log2_size,
            target_hash: self.node_hash(address, log2_size),
            log2_root_size: self.log2_root_size,
            root_hash: self.root(),
            sibling_hashes,
        })
    }

    fn node_hash(&self, address: u64, log2_size: u32) -> Hash {
        let first_leaf = address >> self.log2_leaf_size;
        if first_leaf >= self.leaves.len() as u64 {
            return self.pristine.at(log2_size);
        }
        if log2_size == self.log2_leaf_size {
            return self.leaves[first_leaf as usize];
        }
        let half = 1u64 << (log2_size - 1);
        keccak_concat(
            &self.node_hash(address, log2_size - 1),
            &self.node_hash(address + half, log2_size - 1),
        )
    }
}
