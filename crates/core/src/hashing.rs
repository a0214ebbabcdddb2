//! One-way digests for refresh tokens.
//!
//! The store only ever sees the SHA-256 hex digest of a refresh token.
//! Digests are compared in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Digests token text for storage and comparison.
pub trait TokenHasher: Send + Sync {
    fn hash_token(&self, token: &str) -> String;
}

/// [`TokenHasher`] producing lowercase SHA-256 hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256TokenHasher;

impl TokenHasher for Sha256TokenHasher {
    fn hash_token(&self, token: &str) -> String {
        sha256_hex(token.as_bytes())
    }
}

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Constant-time equality of two digests.
pub fn digests_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}
