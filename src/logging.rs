use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Where log lines go.
pub enum LogSink<'a> {
    Stderr,
    /// The terminal belongs to the editor; log to a file if one is configured.
    FileOnly(Option<&'a Path>),
}

/// Install the global subscriber. `RUST_LOG` wins over `-v` and the config.
pub fn init(verbosity: u8, config: &LogConfig, sink: LogSink<'_>) -> Result<()> {
    let level = match verbosity {
        0 => config.level.clone().unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (stderr_layer, file_layer) = match sink {
        LogSink::Stderr => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
        LogSink::FileOnly(Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            (
                None,
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                ),
            )
        }
        LogSink::FileOnly(None) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .with_context(|| "Failed to install logger")?;
    Ok(())
}
