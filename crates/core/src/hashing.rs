//! Shared SHA-256 hex digest utility.
//!
//! Used for refresh-token hashes, statistics cache keys and the API-key
//! encryption key derivation.

use sha2::{Digest, Sha256};

/// Raw 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        let hash = sha256_hex(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn output_is_stable_hex() {
        let data = b"PokerStars Hand #1";
        assert_eq!(sha256_hex(data), sha256_hex(data));
        assert_eq!(sha256_hex(data).len(), 64);
    }

    #[test]
    fn hex_digest_encodes_raw_digest() {
        let data = b"api-key-secret";
        assert_eq!(sha256_hex(data), hex::encode(sha256(data)));
    }
}
