//! Error types for the regulation state machines.

use thiserror::Error;

/// A state machine was consumed while it had nothing in flight.
///
/// Lock serialization makes this unreachable in a correctly wired regulator:
/// only the timer loop consumes a machine, and it stops as soon as the machine
/// reports it went idle. The timer loop logs the violation and ends its
/// episode; it never surfaces to `push` callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("inconsistent {policy} state: {operation} called while idle")]
pub struct InvariantViolation {
    /// Regulation policy whose machine was consumed (`"debounce"` or `"throttle"`).
    pub policy: &'static str,
    /// Operation that observed the idle state.
    pub operation: &'static str,
}

impl InvariantViolation {
    /// Creates a violation for `operation` observed on an idle `policy` machine.
    #[must_use]
    pub const fn idle(policy: &'static str, operation: &'static str) -> Self {
        Self { policy, operation }
    }
}
