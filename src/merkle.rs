//! Merkle commitment over a block's transactions

use crate::crypto::sha256;
use crate::types::*;

/// MerkleRoot: ℍ* → ℍ
///
/// 1. If one hash remains, return it
/// 2. If the count is odd, duplicate the last hash (at every level)
/// 3. Replace each adjacent pair with SHA256(left ‖ right) and repeat
///
/// Returns `None` for an empty list.
pub fn merkle_root(hashes: &[Hash]) -> Option<Hash> {
    if hashes.is_empty() {
        return None;
    }

    let mut level = hashes.to_vec();
    while level.len() > 1 {
        if level.len() % 2 != 0 {
            let last = level[level.len() - 1];
            level.push(last);
        }

        level = level
            .chunks(2)
            .map(|pair| {
                let mut combined = [0u8; 64];
                combined[..32].copy_from_slice(&pair[0]);
                combined[32..].copy_from_slice(&pair[1]);
                sha256(&combined)
            })
            .collect();
    }

    Some(level[0])
}

/// Leaf hash of a transaction: a single SHA-256 of its serialization, not its id
pub fn leaf_hash(tx: &Transaction) -> Hash {
    sha256(&tx.serialize())
}

/// Merkle root committed to by a block header
pub fn block_merkle_root(transactions: &[Transaction]) -> Option<Hash> {
    let leaves: Vec<Hash> = transactions.iter().map(leaf_hash).collect();
    merkle_root(&leaves)
}
