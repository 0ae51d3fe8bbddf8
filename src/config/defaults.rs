//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default regulation policy.
pub const MODE: &str = "debounce";

/// Default due time in milliseconds.
pub const DUE_TIME_MS: u64 = 1000;

/// Default throttle sampling: emit the most recent value of each window.
pub const LATEST: bool = true;

/// Default input line that fires the trigger.
pub const TRIGGER: &str = "!";

/// Default due time as Duration.
#[must_use]
pub const fn due_time() -> Duration {
    Duration::from_millis(DUE_TIME_MS)
}
