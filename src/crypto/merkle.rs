//! Merkle tree implementation
//!
//! Used for computing transaction merkle roots in blocks.

use super::{hash_pair, Hash};

/// Compute the merkle root of a list of hashes
///
/// If the list is empty, returns zero hash.
/// If a level has an odd number of elements, the last one is paired with itself.
pub fn compute_merkle_root(hashes: &[Hash]) -> Hash {
    compute_merkle_root_checked(hashes).0
}

/// Compute the merkle root and report whether the tree is mutated
///
/// A tree is mutated when two identical siblings are hashed together at any
/// level where they were not produced by odd-length padding. Such a list has
/// the same root as a shorter list, so blocks built from it must be rejected.
pub fn compute_merkle_root_checked(hashes: &[Hash]) -> (Hash, bool) {
    if hashes.is_empty() {
        return (Hash::zero(), false);
    }

    let mut mutated = false;
    let mut level: Vec<Hash> = hashes.to_vec();

    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let (left, right) = match pair {
                [left, right] => {
                    if left == right {
                        mutated = true;
                    }
                    (left, right)
                }
                [last] => (last, last),
                _ => unreachable!("chunks(2) yields one or two elements"),
            };
            next.push(hash_pair(left, right));
        }
        level = next;
    }

    (level[0], mutated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash_bytes;

    fn make_hashes(n: usize) -> Vec<Hash> {
        (0..n).map(|i| hash_bytes(&i.to_le_bytes())).collect()
    }

    #[test]
    fn test_empty_merkle_root() {
        assert_eq!(compute_merkle_root(&[]), Hash::zero());
    }

    #[test]
    fn test_single_element_is_root() {
        let hashes = make_hashes(1);
        assert_eq!(compute_merkle_root(&hashes), hashes[0]);
    }

    #[test]
    fn test_two_elements() {
        let hashes = make_hashes(2);
        assert_eq!(compute_merkle_root(&hashes), hash_pair(&hashes[0], &hashes[1]));
    }

    #[test]
    fn test_odd_count_duplicates_last() {
        let hashes = make_hashes(3);
        let expected = hash_pair(
            &hash_pair(&hashes[0], &hashes[1]),
            &hash_pair(&hashes[2], &hashes[2]),
        );
        let (root, mutated) = compute_merkle_root_checked(&hashes);
        assert_eq!(root, expected);
        assert!(!mutated);
    }

    #[test]
    fn test_duplicated_tail_is_mutated() {
        let mut hashes = make_hashes(3);
        let honest = compute_merkle_root(&hashes);
        hashes.push(hashes[2]);

        let (root, mutated) = compute_merkle_root_checked(&hashes);
        assert_eq!(root, honest);
        assert!(mutated);
    }
}
