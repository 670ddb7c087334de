//! Merkle root calculation over transaction hashes
//!
//! Pairs are concatenated in internal byte order and hashed with double
//! SHA-256; an odd level duplicates its last hash.

use super::hash::{double_sha256, Hash256};

/// Calculate the merkle root from a list of transaction hashes
pub fn merkle_root(hashes: &[Hash256]) -> Hash256 {
    if hashes.is_empty() {
        return Hash256::ZERO;
    }

    let mut current_level: Vec<Hash256> = hashes.to_vec();

    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|chunk| {
                let right = chunk.get(1).unwrap_or(&chunk[0]);
                hash_pair(&chunk[0], right)
            })
            .collect();
    }

    current_level[0]
}

/// Fold a leaf up a merkle branch; bit `i` of `index` set means the
/// branch hash at depth `i` sits on the left
pub fn fold_branch(leaf: Hash256, branch: &[Hash256], mut index: i32) -> Hash256 {
    let mut current = leaf;
    for sibling in branch {
        current = if index & 1 == 1 {
            hash_pair(sibling, &current)
        } else {
            hash_pair(&current, sibling)
        };
        index >>= 1;
    }
    current
}

fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&left.0);
    data[32..].copy_from_slice(&right.0);
    double_sha256(&data)
}
