//! Hash command implementation
//!
//! Prints the configuration hash of the scrubber a request would build.
//! Two runs print the same hash exactly when they would scrub identically.

use super::{hasher_for, load_request};
use crate::config::load_config;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the hash command
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Scrub request (JSON)
    #[arg(short, long)]
    pub request: PathBuf,
}

impl HashArgs {
    /// Execute the hash command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let hasher = hasher_for(&config);
        let scrubber = match load_request(&config, &self.request)
            .and_then(|request| request.build_scrubber(hasher))
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Invalid scrub request");
                eprintln!("Invalid scrub request: {e}");
                return Ok(2);
            }
        };

        println!("{}", scrubber.get_hash());
        Ok(0)
    }
}
