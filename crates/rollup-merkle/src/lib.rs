//! Append-only Merkle accumulator for rollup epoch commitments.
//!
//! An epoch commits the outputs of its inputs under a pair of fixed-depth
//! sparse Merkle trees. Leaves are 32-byte Keccak-256 hashes appended in
//! input order; unpopulated leaves hash as zero. The tree produces inclusion
//! proofs for any aligned node between the leaf level and the root, and
//! proofs can be sliced to re-root them at an intermediate level.

pub mod pristine;
pub mod proof;
pub mod tree;

pub use pristine::PristineHashes;
pub use proof::Proof;
pub use tree::CompleteMerkleTree;

use sha3::{Digest, Keccak256};
use thiserror::Error;

/// 32-byte Keccak-256 output.
pub type Hash = [u8; 32];

/// Number of bytes in a hash.
pub const HASH_SIZE: usize = 32;

/// The all-zero hash used for unpopulated leaves.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Hashes the concatenation of two sibling nodes.
pub fn keccak_concat(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Hashes a byte slice.
pub fn keccak(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("tree is full")]
    TreeFull,
    #[error("address {0:#x} is not aligned to a node of log2 size {1}")]
    MisalignedAddress(u64, u32),
    #[error("log2 size {0} is outside the tree's [{1}, {2}] range")]
    SizeOutOfRange(u32, u32, u32),
    #[error("cannot slice proof between log2 sizes {0} and {1}")]
    InvalidSlice(u32, u32),
}
