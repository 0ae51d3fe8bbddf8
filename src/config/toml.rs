//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Regulator configuration section
    #[serde(default)]
    pub regulator: RegulatorSection,

    /// Input handling section
    #[serde(default)]
    pub input: InputSection,
}

/// Regulator configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegulatorSection {
    /// Regulation policy: "debounce" or "throttle"
    pub mode: Option<String>,

    /// Due time in milliseconds
    pub due_time_ms: Option<u64>,

    /// Throttle sampling: most recent (true) or first (false) value per window
    pub latest: Option<bool>,
}

/// Input handling section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    /// Line that fires the trigger
    pub trigger: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Regulate Configuration File

[regulator]
# Regulation policy: "debounce" or "throttle" (default: debounce)
mode = "debounce"

# Due time in milliseconds (default: 1000)
# Debounce: quiet gap required before emitting
# Throttle: window length
due_time_ms = 1000

# Throttle only: emit the most recent value of each window (true)
# or the first one (false). The --first CLI flag forces false.
# latest = true

[input]
# Input line that fires the trigger (default: "!")
# trigger = "!"
"#
    .to_string()
}
