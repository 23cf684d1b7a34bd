//! CLI command implementations

pub mod hash;
pub mod patterns;
pub mod scrub;
pub mod validate;

use crate::config::AnonymiserConfig;
use crate::domain::{AnonymiserError, Result};
use crate::scrub::{Hasher, ScrubRequest, Sha256Hasher};
use std::path::Path;
use std::sync::Arc;

/// Read a request file, filling unset settings from the configuration
pub(crate) fn load_request(config: &AnonymiserConfig, path: &Path) -> Result<ScrubRequest> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        AnonymiserError::Configuration(format!(
            "Failed to read scrub request {}: {}",
            path.display(),
            e
        ))
    })?;
    let request = ScrubRequest::from_json_with_defaults(&json, &config.scrubber)?;
    request.settings.validate()?;
    Ok(request)
}

/// Keyed hasher for the configured key
pub(crate) fn hasher_for(config: &AnonymiserConfig) -> Arc<dyn Hasher> {
    Arc::new(Sha256Hasher::new(config.hashing.key.clone()))
}
