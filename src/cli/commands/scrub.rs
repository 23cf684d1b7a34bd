//! Scrub command implementation
//!
//! Scrubs documents with the scrubber described by a request file. Files
//! are shared out to blocking workers; each worker owns its own
//! [`PersonalizedScrubber`] while the allowlist and denylist are built once
//! and shared.

use super::{hasher_for, load_request};
use crate::config::load_config;
use crate::domain::Result;
use crate::scrub::{AuditLogger, Hasher, PersonalizedScrubber, ScrubRequest, SharedLists};
use anyhow::{anyhow, Context};
use clap::Args;
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;

/// Arguments for the scrub command
#[derive(Args, Debug)]
pub struct ScrubArgs {
    /// Scrub request (JSON) with the subject's values and policy overrides
    #[arg(short, long)]
    pub request: PathBuf,

    /// Directory for scrubbed output (defaults to each input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of workers (defaults to application.workers)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Text files to scrub; reads stdin when none are given
    pub files: Vec<PathBuf>,
}

impl ScrubArgs {
    /// Execute the scrub command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let hasher = hasher_for(&config);
        let prepared = load_request(&config, &self.request).and_then(|request| {
            let lists = request.prepare_lists(hasher.as_ref())?;
            Ok((request, lists))
        });
        let (request, lists) = match prepared {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Invalid scrub request");
                eprintln!("Invalid scrub request: {e}");
                return Ok(2);
            }
        };

        let audit = AuditLogger::new(
            PathBuf::from(&config.audit.log_path),
            config.audit.json_format,
            config.audit.enabled,
        )?;

        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create output directory: {}", dir.display())
            })?;
        }

        let job = Arc::new(ScrubJob::new(
            request,
            hasher,
            lists,
            audit,
            self.output_dir.clone(),
        ));

        // Catch request errors before any worker starts
        match job.scrubber() {
            Ok(scrubber) => {
                tracing::info!(config_hash = %scrubber.get_hash(), "Scrubber ready");
            }
            Err(e) => {
                eprintln!("Invalid scrub request: {e}");
                return Ok(2);
            }
        }

        if self.files.is_empty() {
            job.scrub_stdin()?;
            return Ok(0);
        }

        if let Some((first, second, output)) =
            output_collision(&self.files, self.output_dir.as_deref())
        {
            eprintln!(
                "Inputs {} and {} would both be written to {}",
                first.display(),
                second.display(),
                output.display()
            );
            return Ok(2);
        }

        let workers = self.workers.unwrap_or(config.application.workers);
        tracing::info!(files = self.files.len(), workers, "Starting scrub");

        let summary = job
            .run(self.files.clone(), workers, shutdown_signal)
            .await?;

        eprintln!();
        eprintln!("📊 Scrub Summary:");
        eprintln!("  Scrubbed: {}", summary.scrubbed);
        eprintln!("  Failed: {}", summary.failed);
        eprintln!("  Replacements: {}", summary.replacements);

        let exit_code = if summary.interrupted {
            eprintln!("⚠️  Scrub interrupted; remaining files were not processed.");
            130
        } else if summary.failed > 0 {
            1
        } else {
            0
        };
        Ok(exit_code)
    }
}

/// Totals over one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrubSummary {
    pub scrubbed: usize,
    pub failed: usize,
    pub replacements: usize,
    pub interrupted: bool,
}

impl ScrubSummary {
    fn merge(&mut self, other: ScrubSummary) {
        self.scrubbed += other.scrubbed;
        self.failed += other.failed;
        self.replacements += other.replacements;
        self.interrupted |= other.interrupted;
    }
}

/// Everything a worker needs to build its scrubber and write results
pub struct ScrubJob {
    request: ScrubRequest,
    hasher: Arc<dyn Hasher>,
    lists: SharedLists,
    audit: AuditLogger,
    output_dir: Option<PathBuf>,
}

impl ScrubJob {
    pub fn new(
        request: ScrubRequest,
        hasher: Arc<dyn Hasher>,
        lists: SharedLists,
        audit: AuditLogger,
        output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            request,
            hasher,
            lists,
            audit,
            output_dir,
        }
    }

    fn scrubber(&self) -> Result<PersonalizedScrubber> {
        self.request
            .build_scrubber_with(Arc::clone(&self.hasher), &self.lists)
    }

    /// Scrub `files` with `workers` blocking workers
    ///
    /// Once `shutdown` flips to true, workers finish their current file and
    /// take no new ones.
    pub async fn run(
        self: Arc<Self>,
        files: Vec<PathBuf>,
        workers: usize,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<ScrubSummary> {
        let queue = Arc::new(Mutex::new(files.into_iter().collect::<VecDeque<_>>()));

        let handles: Vec<_> = (0..workers.max(1))
            .map(|worker_id| {
                let job = Arc::clone(&self);
                let queue = Arc::clone(&queue);
                let shutdown = shutdown.clone();
                tokio::task::spawn_blocking(move || job.work(worker_id, &queue, &shutdown))
            })
            .collect();

        let mut summary = ScrubSummary::default();
        for handle in handles {
            summary.merge(handle.await.context("Scrub worker panicked")??);
        }
        Ok(summary)
    }

    fn work(
        &self,
        worker_id: usize,
        queue: &Mutex<VecDeque<PathBuf>>,
        shutdown: &watch::Receiver<bool>,
    ) -> anyhow::Result<ScrubSummary> {
        let scrubber = self.scrubber()?;
        let mut summary = ScrubSummary::default();

        loop {
            let mut pending = queue.lock().map_err(|_| anyhow!("Work queue poisoned"))?;
            if *shutdown.borrow() {
                summary.interrupted = !pending.is_empty();
                break;
            }
            let Some(path) = pending.pop_front() else {
                break;
            };
            drop(pending);

            match self.scrub_file(&scrubber, &path) {
                Ok(replacements) => {
                    summary.scrubbed += 1;
                    summary.replacements += replacements;
                }
                Err(e) => {
                    tracing::error!(
                        worker = worker_id,
                        file = %path.display(),
                        error = %e,
                        "Failed to scrub file"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::debug!(worker = worker_id, scrubbed = summary.scrubbed, "Worker finished");
        Ok(summary)
    }

    fn scrub_file(&self, scrubber: &PersonalizedScrubber, path: &Path) -> anyhow::Result<usize> {
        let started = Instant::now();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let outcome = scrubber.scrub_with_report(&text);

        let output = output_path_for(path, self.output_dir.as_deref());
        std::fs::write(&output, &outcome.text)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        let document = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.audit
            .log_scrub(&document, &outcome, started.elapsed().as_millis() as u64)?;

        Ok(outcome.counts.total())
    }

    /// Scrub stdin to stdout
    pub fn scrub_stdin(&self) -> anyhow::Result<usize> {
        let started = Instant::now();
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;

        let outcome = self.scrubber()?.scrub_with_report(&text);

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(outcome.text.as_bytes())?;
        stdout.flush()?;

        self.audit
            .log_scrub("<stdin>", &outcome, started.elapsed().as_millis() as u64)?;
        Ok(outcome.counts.total())
    }
}

/// `<dir>/<stem>.scrubbed.<ext>`, next to the input unless `output_dir` is set
///
/// An input without an extension gives `<stem>.scrubbed`.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{stem}.scrubbed.{}", ext.to_string_lossy()),
        None => format!("{stem}.scrubbed"),
    };
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(name)
}

/// First pair of inputs that would write the same output file
pub fn output_collision<'a>(
    files: &'a [PathBuf],
    output_dir: Option<&Path>,
) -> Option<(&'a Path, &'a Path, PathBuf)> {
    let mut seen: HashMap<PathBuf, &'a Path> = HashMap::new();
    for file in files {
        let output = output_path_for(file, output_dir);
        if let Some(&earlier) = seen.get(&output) {
            return Some((earlier, file.as_path(), output));
        }
        seen.insert(output, file.as_path());
    }
    None
}
