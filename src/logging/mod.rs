//! Process-wide `tracing` subscriber.
//!
//! Two layers: a console layer on the configured stream, filtered by
//! `RUST_LOG` when set and by `io.cli_mode` otherwise, and a plain-text file
//! layer at `io.log_mode` written through a non-blocking appender.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

use crate::config::{IoConfig, LogLevel, LogStream};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global subscriber.
///
/// Returns the file writer's guard, or `None` when file logging is off. Keep
/// the guard alive for the life of the process; dropping it flushes and stops
/// the writer.
pub fn init(io: &IoConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(io.cli_mode.as_str()));
    let console = match io.log_stream {
        LogStream::Stderr => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogStream::Stdout => fmt::layer().with_writer(std::io::stdout).boxed(),
    }
    .with_filter(console_filter);

    let (file_layer, guard) = if io.log_mode == LogLevel::Off {
        (None, None)
    } else {
        let path = io.log_file(&timestamp());
        let (writer, guard) = tracing_appender::non_blocking(open_log_file(&path)?);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(io.log_mode.as_filter());
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let io_err = |source| LoggingError::Io {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("router.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn generated_name_uses_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let io = IoConfig {
            log_directory: Some(dir.path().to_owned()),
            ..IoConfig::default()
        };
        let path = io.log_file(&timestamp());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pathrouter-20"), "{name}");
        assert!(name.ends_with(".log"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // a regular file cannot be a parent directory
        let err = open_log_file(&file.path().join("router.log")).unwrap_err();
        assert!(matches!(err, LoggingError::Io { .. }));
    }
}
