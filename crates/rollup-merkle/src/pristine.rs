//! Hashes of fully unpopulated subtrees, one per level.

use crate::{keccak_concat, Hash, ZERO_HASH};

/// Precomputed hashes of pristine subtrees.
///
/// The pristine leaf is the all-zero hash; each level above hashes the
/// concatenation of two pristine children.
#[derive(Debug, Clone)]
pub struct PristineHashes {
    log2_leaf_size: u32,
    hashes: Vec<Hash>,
}

impl PristineHashes {
    pub fn new(log2_root_size: u32, log2_leaf_size: u32) -> Self {
        let depth = (log2_root_size - log2_leaf_size) as usize;
        let mut hashes = Vec::with_capacity(depth + 1);
        hashes.push(ZERO_HASH);
        for level in 0..depth {
            let child = hashes[level];
            hashes.push(keccak_concat(&child, &child));
        }
        Self {
            log2_leaf_size,
            hashes,
        }
    }

    /// Hash of a pristine subtree whose node has the given log2 size.
    pub fn at(&self, log2_size: u32) -> Hash {
        self.hashes[(log2_size - self.log2_leaf_size) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First levels of the ladder over a zero 32-byte leaf, as published by
    // the hyperlane incremental tree.
    const LEVEL_1: &str = "ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5";
    const LEVEL_2: &str = "b4c11951957c6f8f642c4af61cd6b24640fec6dc7fc607ee8206a99e92410d30";
    const LEVEL_3: &str = "21ddb9a356815c3fac1026b6dec5df3124afbadb485c9ba5a3e3398a04b7ba85";

    fn decode(s: &str) -> Hash {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    #[test]
    fn ladder_matches_known_constants() {
        let pristine = PristineHashes::new(37, 5);
        assert_eq!(pristine.at(5), ZERO_HASH);
        assert_eq!(pristine.at(6), decode(LEVEL_1));
        assert_eq!(pristine.at(7), decode(LEVEL_2));
        assert_eq!(pristine.at(8), decode(LEVEL_3));
    }

    #[test]
    fn root_level_is_reachable() {
        let pristine = PristineHashes::new(37, 5);
        // Must not panic at the top of the ladder.
        let _ = pristine.at(37);
    }
}
