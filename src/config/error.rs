//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid duration value (zero).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Unknown regulation policy.
    #[error("Invalid mode '{value}': expected debounce or throttle")]
    InvalidMode {
        /// The invalid value provided
        value: String,
    },

    /// Trigger word that can never match an input line.
    #[error("Invalid trigger '{value}': must contain a non-whitespace character")]
    InvalidTrigger {
        /// The invalid value provided
        value: String,
    },
}

/// Well-known field names for `InvalidDuration` errors.
pub mod field {
    /// The regulator due time.
    pub const DUE_TIME: &str = "due_time";
}
