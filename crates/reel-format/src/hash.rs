//! Content hashing for the world blob embedded in recording headers.
//!
//! Uses FNV-1a: fast and deterministic, not cryptographically secure.
//! The hash only has to let clients detect that their copy of the world
//! content diverged from the server's.

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// FNV-1a over a byte slice.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in data {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hex content hash over the catalog and world blobs, in that order, with
/// each blob's length folded in so boundary shifts change the hash.
pub fn content_hash(catalog: &[u8], world: &[u8]) -> String {
    let mut hash = FNV_OFFSET;
    for blob in [catalog, world] {
        for &b in (blob.len() as u64).to_be_bytes().iter() {
            hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
        }
        for &b in blob {
            hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
        }
    }
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(fnv1a_64(&[]), FNV_OFFSET);
    }

    #[test]
    fn content_hash_is_stable_and_sensitive() {
        let a = content_hash(&[1, 2], &[3, 4]);
        assert_eq!(a, content_hash(&[1, 2], &[3, 4]));
        assert_ne!(a, content_hash(&[1, 2], &[3, 5]));
        // Moving a byte across the blob boundary must change the hash.
        assert_ne!(content_hash(&[1, 2, 3], &[4]), content_hash(&[1, 2], &[3, 4]));
        assert_eq!(a.len(), 16);
    }
}
