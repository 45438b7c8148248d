//! Subscriber installation
//!
//! Human-readable output always goes to the console. With
//! `logging.local_enabled` a second layer writes JSON lines to a rolling
//! `vitex.log` under `logging.local_path`.

use crate::config::LoggingConfig;
use crate::domain::{Result, VitexError};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_NAME: &str = "vitex.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flushes the background file writer when dropped
///
/// Hold it in `main` until the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _writer: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `level` when present. Fails when the level is not
/// recognised, the log directory cannot be created, or a subscriber is
/// already installed.
///
/// ```no_run
/// use vitex::config::LoggingConfig;
/// use vitex::logging::init_logging;
///
/// let _guard = init_logging("debug", &LoggingConfig::console_only()).unwrap();
/// ```
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("vitex={level},tower_http=info")))
    };

    let mut layers: Vec<BoxedLayer> = vec![tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(filter())
        .boxed()];

    let writer = if config.local_enabled {
        let (layer, guard) = json_file_layer(config)?;
        layers.push(layer.with_filter(filter()).boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| VitexError::Configuration(format!("Cannot install log subscriber: {e}")))?;

    tracing::debug!(
        file_output = config.local_enabled,
        directory = %config.local_path,
        rotation = %config.local_rotation,
        "Log subscriber installed"
    );

    Ok(LoggingGuard { _writer: writer })
}

fn json_file_layer(config: &LoggingConfig) -> Result<(BoxedLayer, WorkerGuard)> {
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        VitexError::Configuration(format!(
            "Log directory {} is not writable: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(
        rotation_for(&config.local_rotation),
        &config.local_path,
        LOG_FILE_NAME,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(writer)
        .boxed();

    Ok((layer, guard))
}

fn rotation_for(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(name: &str) -> Result<Level> {
    const LEVELS: [(&str, Level); 5] = [
        ("trace", Level::TRACE),
        ("debug", Level::DEBUG),
        ("info", Level::INFO),
        ("warn", Level::WARN),
        ("error", Level::ERROR),
    ];

    LEVELS
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(name))
        .map(|(_, level)| *level)
        .ok_or_else(|| {
            VitexError::Configuration(format!(
                "Unknown log level '{name}' (expected trace, debug, info, warn or error)"
            ))
        })
}
