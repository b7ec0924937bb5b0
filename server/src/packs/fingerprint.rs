//! Content fingerprinting for uploaded pack archives.
//!
//! The fingerprint is a SHA-256 digest over the full file bytes, hex-encoded
//! (64 lowercase chars). It is deterministic and content-only: filename and
//! metadata never affect it. Byte-identical files always fingerprint
//! identically anywhere in the system — this is the sole duplicate-detection
//! mechanism, so nothing weaker than a cryptographic hash is acceptable.

use sha2::{Digest, Sha256};
use std::io::Read;

/// Length of a hex-encoded fingerprint (SHA-256 = 32 bytes = 64 hex chars).
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Compute the fingerprint of an in-memory byte buffer.
pub fn fingerprint_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compute the fingerprint of a stream without buffering it whole.
/// Used when hashing archives straight off disk.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Validate a client-supplied fingerprint string (lowercase hex accepted in
/// any case, decoded to exactly 32 bytes).
pub fn is_valid_fingerprint(s: &str) -> bool {
    s.len() == FINGERPRINT_HEX_LEN && hex::decode(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_and_content_only() {
        let a = fingerprint_bytes(b"kick snare hat");
        let b = fingerprint_bytes(b"kick snare hat");
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_HEX_LEN);
        assert_ne!(a, fingerprint_bytes(b"kick snare hat "));
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![7u8; 20_000]; // spans multiple read chunks
        let from_reader = fingerprint_reader(&data[..]).unwrap();
        assert_eq!(from_reader, fingerprint_bytes(&data));
    }

    #[test]
    fn fingerprint_is_order_sensitive() {
        assert_ne!(fingerprint_bytes(b"ab"), fingerprint_bytes(b"ba"));
    }

    #[test]
    fn validates_format() {
        let good = fingerprint_bytes(b"x");
        assert!(is_valid_fingerprint(&good));
        assert!(!is_valid_fingerprint("deadbeef"));
        assert!(!is_valid_fingerprint(&"z".repeat(FINGERPRINT_HEX_LEN)));
    }
}
