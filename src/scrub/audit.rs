//! Audit trail for scrubbed documents
//!
//! One entry per document: timestamp, document reference, scrubber config
//! hash, replacement counts per stage and processing time. Neither the input
//! text nor any scrub value is ever written.

use crate::scrub::compiled::ScrubCounts;
use crate::scrub::personalized::ScrubOutcome;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry<'a> {
    timestamp: String,
    document: &'a str,
    config_hash: &'a str,
    replacements: usize,
    counts: &'a ScrubCounts,
    processing_time_ms: u64,
}

/// Append-only audit logger
#[derive(Debug)]
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            // Ensure parent directory exists
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Logger that writes nothing
    pub fn disabled() -> Self {
        Self {
            log_path: PathBuf::new(),
            json_format: true,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one scrubbed document
    ///
    /// `document` should be a reference that is not itself identifying, such
    /// as a file name or a hashed record id.
    pub fn log_scrub(&self, document: &str, outcome: &ScrubOutcome, processing_time_ms: u64) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            document,
            config_hash: &outcome.config_hash,
            replacements: outcome.counts.total(),
            counts: &outcome.counts,
            processing_time_ms,
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry<'_>) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        // Single write per entry; workers share the file
        let line = if self.json_format {
            serde_json::to_string(entry).context("Failed to serialize audit entry")?
        } else {
            format!(
                "[{}] Document: {} | Config: {} | Replacements: {} | Time: {}ms",
                entry.timestamp,
                entry.document,
                entry.config_hash,
                entry.replacements,
                entry.processing_time_ms
            )
        };
        file.write_all(format!("{line}\n").as_bytes())
            .context("Failed to write audit entry")?;

        Ok(())
    }
}
