//! Hashing key protection using the secrecy crate
//!
//! The hashing key decides every hash the scrubber emits (config hashes,
//! word-list hashes, value references in logs). It is held in a `Secret`
//! so the memory is zeroed on drop and the key never appears in Debug output.
//!
//! # Example
//!
//! ```rust
//! use anonymiser::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let key = secret_string("per-site-hashing-key".to_string());
//! assert_eq!(key.expose_secret(), "per-site-hashing-key");
//!
//! // Debug output is redacted
//! assert!(!format!("{key:?}").contains("per-site"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for SecretValue {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the secret in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
///
/// This wraps a `SecretValue` in a `Secret` container that:
/// - Zeros the memory when dropped
/// - Prevents accidental logging via Debug
/// - Requires explicit `expose_secret()` to access
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("hashing-key".to_string());
        assert_eq!(secret.expose_secret(), "hashing-key");
        assert_eq!(secret.expose_secret().len(), 11);
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-key".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("sensitive-key"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_secret_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Section {
            key: SecretString,
        }

        let section: Section = toml::from_str(r#"key = "abc123""#).unwrap();
        assert_eq!(section.key.expose_secret(), "abc123");
        assert!(!section.key.expose_secret().is_empty());
    }
}
