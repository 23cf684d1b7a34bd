//! Keyed hashing for change detection and log references
//!
//! The scrubbers never log raw identifying values. Where a value has to be
//! referenced (a dropped value, a failed compilation) the log carries its
//! hash instead, computed with the same [`Hasher`] used for config hashes.

use crate::config::SecretString;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

/// Caller-supplied hash function
///
/// Implementations must be deterministic: equal input gives equal output for
/// the lifetime of the key.
pub trait Hasher: Send + Sync {
    fn hash(&self, data: &str) -> String;
}

/// Keyed SHA-256: lowercase hex of `SHA-256(key || data)`
#[derive(Clone)]
pub struct Sha256Hasher {
    key: SecretString,
}

impl Sha256Hasher {
    pub fn new(key: SecretString) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for Sha256Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256Hasher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &str) -> String {
        let mut digest = Sha256::new();
        let key: &[u8] = self.key.expose_secret().as_ref();
        digest.update(key);
        digest.update(data.as_bytes());
        format!("{:x}", digest.finalize())
    }
}
