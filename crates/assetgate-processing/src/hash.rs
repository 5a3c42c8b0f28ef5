//! SHA-256 content hashing

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub struct ContentHasher;

impl ContentHasher {
    /// Lowercase hex SHA-256 of `data`.
    pub fn digest(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Whether `data` hashes to `expected` (hex, any case). Constant time in
    /// the digest comparison.
    pub fn verify(data: &[u8], expected: &str) -> bool {
        let actual = Self::digest(data);
        let expected = expected.to_ascii_lowercase();
        actual.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            ContentHasher::digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_same_bytes_same_hash() {
        let data = vec![7u8; 4096];
        assert_eq!(ContentHasher::digest(&data), ContentHasher::digest(&data.clone()));
        assert_ne!(ContentHasher::digest(&data), ContentHasher::digest(&data[1..]));
    }

    #[test]
    fn test_verify() {
        let hash = ContentHasher::digest(b"payload");
        assert!(ContentHasher::verify(b"payload", &hash));
        assert!(ContentHasher::verify(b"payload", &hash.to_uppercase()));
        assert!(!ContentHasher::verify(b"payloae", &hash));
        assert!(!ContentHasher::verify(b"payload", "abc"));
    }
}
