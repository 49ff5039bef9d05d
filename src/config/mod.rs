//! Service configuration, loaded from a YAML file.
//!
//! Every field is optional; a missing file section falls back to the defaults
//! below.
//!
//! ```yaml
//! webserver:
//!   host: 127.0.0.1
//!   port: 44777
//!   api_prefix: ""
//!   cors_origins: ["*"]
//! io:
//!   cli_mode: info
//!   log_mode: warning
//!   log_filepath: null
//!   log_directory: null
//!   log_stream: stderr
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Errors raised while reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub webserver: WebserverConfig,
    pub io: IoConfig,
}

impl Config {
    /// Reads and parses the YAML file at `path`. An empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigFileError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Listener and front-controller settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebserverConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix of the catch-all entry point, e.g. `/api/w`.
    pub api_prefix: String,
    /// Origins allowed by CORS; `*` allows all.
    pub cors_origins: Vec<String>,
}

impl Default for WebserverConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 44777,
            api_prefix: String::new(),
            cors_origins: vec!["*".to_owned()],
        }
    }
}

impl WebserverConfig {
    /// `host:port`, as accepted by [`Server::bind`](crate::server::Server::bind).
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Prefix without trailing slashes; `""` when routes are served from the root.
    pub fn prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }

    pub fn mount_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.prefix())
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IoConfig {
    /// Console level.
    pub cli_mode: LogLevel,
    /// Log file level.
    pub log_mode: LogLevel,
    /// Explicit log file. Wins over `log_directory`.
    pub log_filepath: Option<PathBuf>,
    /// Directory for a generated `pathrouter-<timestamp>.log`.
    pub log_directory: Option<PathBuf>,
    pub log_stream: LogStream,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            cli_mode: LogLevel::Info,
            log_mode: LogLevel::Warn,
            log_filepath: None,
            log_directory: None,
            log_stream: LogStream::Stderr,
        }
    }
}

impl IoConfig {
    /// Where the log file goes. `timestamp` names the file when no explicit
    /// path is configured.
    pub fn log_file(&self, timestamp: &str) -> PathBuf {
        if let Some(path) = &self.log_filepath {
            return path.clone();
        }
        let name = format!("pathrouter-{timestamp}.log");
        match &self.log_directory {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// A log level as written in the config file. Case-insensitive; `warning`
/// and `critical` are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::OFF,
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" | "critical" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_owned()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Console stream. `sys:stderr`/`sys:stdout` are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogStream {
    Stderr,
    Stdout,
}

impl TryFrom<String> for LogStream {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let lower = value.to_ascii_lowercase();
        match lower.strip_prefix("sys:").unwrap_or(&lower) {
            "stderr" => Ok(Self::Stderr),
            "stdout" => Ok(Self::Stdout),
            _ => Err(format!("unknown log stream '{value}'")),
        }
    }
}

impl From<LogStream> for String {
    fn from(stream: LogStream) -> Self {
        match stream {
            LogStream::Stderr => "stderr".to_owned(),
            LogStream::Stdout => "stdout".to_owned(),
        }
    }
}
