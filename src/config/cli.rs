//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::Mode;

/// Regulate: debounce or throttle lines read from stdin
///
/// Every input line is fed to a regulator; the regulated values are logged.
/// A line equal to the trigger word fires a separately regulated action.
#[derive(Debug, Parser)]
#[command(name = "regulate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Regulation policy
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Due time in milliseconds
    #[arg(long = "due-time", value_name = "MS")]
    pub due_time: Option<u64>,

    /// Throttle emits the first value of each window instead of the latest
    #[arg(long)]
    pub first: bool,

    /// Input line that fires the trigger
    #[arg(long, value_name = "WORD")]
    pub trigger: Option<String>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for regulate
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "regulate.toml")]
        output: PathBuf,
    },
}

/// Regulation policy argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Emit after a quiet gap of one due time
    Debounce,
    /// Emit at most once per due time
    Throttle,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Debounce => Self::Debounce,
            ModeArg::Throttle => Self::Throttle,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
