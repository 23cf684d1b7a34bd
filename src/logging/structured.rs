//! Subscriber setup
//!
//! Human-readable events go to stderr so that `scrub` can stream scrubbed
//! text on stdout. When `logging.local_enabled` is set, the same events are
//! also written as JSON lines to a rotating `anonymiser.log`.
//!
//! `ANONYMISER_LOG` takes an `EnvFilter` directive and wins over the
//! configured level.

use crate::config::LoggingConfig;
use crate::domain::{AnonymiserError, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding a filter directive
pub const LOG_FILTER_ENV: &str = "ANONYMISER_LOG";

const LOG_FILE_NAME: &str = "anonymiser.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer's worker alive; drop it last
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// The level is checked before anything is installed, so a bad level never
/// leaves a half-configured subscriber behind.
///
/// ```no_run
/// use anonymiser::config::LoggingConfig;
/// use anonymiser::logging::init_logging;
///
/// let _guard = init_logging("debug", &LoggingConfig::default()).unwrap();
/// ```
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = filter_for(level);

    let mut layers: Vec<BoxedLayer> = vec![console_layer(filter.clone())];
    let file_guard = if config.local_enabled {
        let (layer, guard) = file_layer(config, filter)?;
        layers.push(layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).init();

    tracing::debug!(
        %level,
        file_logging = config.local_enabled,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("anonymiser={level}")))
}

fn console_layer(filter: EnvFilter) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter)
        .boxed()
}

fn file_layer(config: &LoggingConfig, filter: EnvFilter) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = Path::new(&config.local_path);
    std::fs::create_dir_all(dir).map_err(|e| {
        AnonymiserError::Configuration(format!(
            "Failed to create log directory {}: {e}",
            dir.display()
        ))
    })?;

    let appender = RollingFileAppender::new(rotation_for(&config.local_rotation), dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();

    Ok((layer, guard))
}

/// "hourly" rotates hourly; anything else (including "size") daily
fn rotation_for(setting: &str) -> Rotation {
    if setting.eq_ignore_ascii_case("hourly") {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    const LEVELS: [(&str, Level); 5] = [
        ("trace", Level::TRACE),
        ("debug", Level::DEBUG),
        ("info", Level::INFO),
        ("warn", Level::WARN),
        ("error", Level::ERROR),
    ];

    LEVELS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(level.trim()))
        .map(|(_, parsed)| *parsed)
        .ok_or_else(|| {
            AnonymiserError::Configuration(format!(
                "Invalid log level {level:?}; expected trace, debug, info, warn or error"
            ))
        })
}
