//! Conversions between wire messages and domain types.

use rollup_merkle::{Hash, Proof};

use crate::error::{ManagerError, Result};
use crate::proto::cartesi::machine::v1 as machine;

pub fn hash_from_proto(hash: Option<machine::Hash>) -> Result<Hash> {
    hash.ok_or_else(|| ManagerError::OutOfRange("missing hash".to_string()))?
        .data
        .as_slice()
        .try_into()
        .map_err(|_| ManagerError::OutOfRange("invalid hash length".to_string()))
}

pub fn hash_to_proto(hash: &Hash) -> machine::Hash {
    machine::Hash {
        data: hash.to_vec(),
    }
}

pub fn proof_from_proto(proof: Option<machine::MerkleTreeProof>) -> Result<Proof> {
    let proof = proof.ok_or_else(|| ManagerError::OutOfRange("missing proof".to_string()))?;
    let log2_target_size = u32::try_from(proof.log2_target_size)
        .map_err(|_| ManagerError::OutOfRange("invalid proof target size".to_string()))?;
    let log2_root_size = u32::try_from(proof.log2_root_size)
        .map_err(|_| ManagerError::OutOfRange("invalid proof root size".to_string()))?;
    let target_hash = hash_from_proto(proof.target_hash)?;
    let root_hash = hash_from_proto(proof.root_hash)?;
    let sibling_hashes = proof
        .sibling_hashes
        .into_iter()
        .map(|hash| hash_from_proto(Some(hash)))
        .collect::<Result<Vec<Hash>>>()?;
    if sibling_hashes.len() != (log2_root_size.saturating_sub(log2_target_size)) as usize {
        return Err(ManagerError::OutOfRange(
            "proof has wrong number of siblings".to_string(),
        ));
    }
    Ok(Proof {
        target_address: proof.target_address,
        log2_target_size,
        target_hash,
        log2_root_size,
        root_hash,
        sibling_hashes,
    })
}

pub fn proof_to_proto(proof: &Proof) -> machine::MerkleTreeProof {
    machine::MerkleTreeProof {
        target_address: proof.target_address,
        log2_target_size: u64::from(proof.log2_target_size),
        target_hash: Some(hash_to_proto(&proof.target_hash)),
        log2_root_size: u64::from(proof.log2_root_size),
        root_hash: Some(hash_to_proto(&proof.root_hash)),
        sibling_hashes: proof.sibling_hashes.iter().map(hash_to_proto).collect(),
    }
}
