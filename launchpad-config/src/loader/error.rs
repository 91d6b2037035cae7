//! Configuration load failures.

use std::path::PathBuf;

use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// An explicitly requested file does not exist.
    #[error("configuration file missing: {path}")]
    MissingConfig {
        /// Requested path.
        path: PathBuf,
    },
    /// The file exists but could not be read.
    #[error("failed to read configuration {path}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("failed to parse configuration {path}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A required value was given by neither source.
    #[error("missing required setting {setting} (env {env})")]
    MissingSetting {
        /// Dotted TOML key.
        setting: &'static str,
        /// Environment variable.
        env: &'static str,
    },
    /// A numeric environment variable did not parse.
    #[error("{name}={value} is not a valid number")]
    InvalidNumber {
        /// Environment variable.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// The permissions base URL did not parse.
    #[error("invalid permissions URL '{value}'")]
    InvalidPermissionsUrl {
        /// Raw value.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The permissions timeout is not a humantime duration.
    #[error("invalid permissions timeout '{value}'")]
    InvalidTimeout {
        /// Raw value.
        value: String,
        /// Parse failure.
        #[source]
        source: humantime::DurationError,
    },
    /// The ranking window is not a duration of at least one second.
    #[error("invalid ranking window '{value}': {reason}")]
    InvalidRankingWindow {
        /// Raw value.
        value: String,
        /// What was wrong with it.
        reason: String,
    },
    /// `.env` exists but is malformed.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
