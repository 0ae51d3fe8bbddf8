//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Regulation policy applied to input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emit the last value after a quiet gap of one due time.
    Debounce,
    /// Emit at most once per due time window.
    Throttle,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debounce => write!(f, "debounce"),
            Self::Throttle => write!(f, "throttle"),
        }
    }
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Regulation policy
    pub mode: Mode,

    /// Debounce quiet gap or throttle window length
    pub due_time: Duration,

    /// Throttle sampling; ignored in debounce mode
    pub latest: bool,

    /// Input line that fires the trigger, already trimmed
    pub trigger: String,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ mode: {}, due_time: {}ms, latest: {}, trigger: {:?} }}",
            self.mode,
            self.due_time.as_millis(),
            self.latest,
            self.trigger,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML mode is not a known policy
    /// - The due time is zero
    /// - The trigger word is blank
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let mode = Self::resolve_mode(cli, toml)?;
        let due_time = Self::resolve_due_time(cli, toml)?;

        // --first can only disable latest
        let latest = !cli.first
            && toml
                .and_then(|t| t.regulator.latest)
                .unwrap_or(defaults::LATEST);

        let trigger = Self::resolve_trigger(cli, toml)?;

        Ok(Self {
            mode,
            due_time,
            latest,
            trigger,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_mode(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Mode, ConfigError> {
        if let Some(mode) = cli.mode {
            return Ok(mode.into());
        }

        let mode_str = toml
            .and_then(|t| t.regulator.mode.as_deref())
            .unwrap_or(defaults::MODE);

        parse_mode(mode_str)
    }

    fn resolve_due_time(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let millis = cli
            .due_time
            .or_else(|| toml.and_then(|t| t.regulator.due_time_ms))
            .unwrap_or(defaults::DUE_TIME_MS);

        if millis == 0 {
            return Err(ConfigError::InvalidDuration {
                field: field::DUE_TIME,
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_millis(millis))
    }

    fn resolve_trigger(cli: &Cli, toml: Option<&TomlConfig>) -> Result<String, ConfigError> {
        let trigger = cli
            .trigger
            .as_deref()
            .or_else(|| toml.and_then(|t| t.input.trigger.as_deref()))
            .unwrap_or(defaults::TRIGGER);

        let trimmed = trigger.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidTrigger {
                value: trigger.to_string(),
            });
        }

        Ok(trimmed.to_string())
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_mode(s: &str) -> Result<Mode, ConfigError> {
    match s.to_lowercase().as_str() {
        "debounce" => Ok(Mode::Debounce),
        "throttle" => Ok(Mode::Throttle),
        _ => Err(ConfigError::InvalidMode {
            value: s.to_string(),
        }),
    }
}
