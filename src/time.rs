//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait that allows injecting mock clocks
//! in tests while using the Tokio clock in production.
//!
//! Deadlines are monotonic [`Instant`]s from Tokio rather than wall-clock
//! time, so regulators behave deterministically under
//! `#[tokio::test(start_paused = true)]`.

use std::time::Duration;

use tokio::time::Instant;

/// Farthest a deadline is scheduled ahead of its base instant, about 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Abstraction over the monotonic time source used to stamp deadlines.
///
/// # Example
///
/// ```
/// use regulate::time::{Clock, TokioClock};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let clock = TokioClock;
/// let before = tokio::time::Instant::now();
/// assert!(clock.now() >= before);
/// # }
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Production clock delegating to [`tokio::time::Instant::now`].
///
/// Honors Tokio's paused test clock, which [`std::time::Instant`] does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Returns `base + delay`, capped at [`FAR_FUTURE`] past `base`.
///
/// Never panics. If the platform cannot represent even the capped instant,
/// `base` itself is returned.
pub(crate) fn deadline_after(base: Instant, delay: Duration) -> Instant {
    base.checked_add(delay.min(FAR_FUTURE)).unwrap_or(base)
}
