//! Timer-loop handle for one episode.
//!
//! An [`Episode`] is what a timer loop holds while it runs: a weak
//! back-reference to the container, the epoch it was started in, and a
//! receiver for the cancellation signal. It never keeps the container alive.

use std::sync::Weak;

use tokio::sync::watch;
use tokio::time::Instant;

use super::InvariantViolation;
use super::guarded::{Guarded, Slot, StateMachine};

/// Ends a loop that found its machine in an impossible state.
///
/// Fails fast in debug builds only; the panic stays inside the loop's task.
pub(crate) fn abandon(violation: &InvariantViolation) {
    tracing::error!("Abandoning episode: {violation}");
    debug_assert!(false, "{violation}");
}

pub(crate) struct Episode<M, V> {
    shared: Weak<Guarded<M, V>>,
    epoch: u64,
    cancelled: watch::Receiver<u64>,
    deadline: Instant,
}

impl<M: StateMachine, V> Episode<M, V> {
    pub(crate) const fn new(
        shared: Weak<Guarded<M, V>>,
        epoch: u64,
        cancelled: watch::Receiver<u64>,
        deadline: Instant,
    ) -> Self {
        Self {
            shared,
            epoch,
            cancelled,
            deadline,
        }
    }

    /// Deadline of the push that started this episode.
    pub(crate) const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Sleeps until `deadline`.
    ///
    /// Returns `false` if the episode was cancelled or its container dropped
    /// while sleeping; the loop must then exit without touching shared state.
    pub(crate) async fn sleep_until(&mut self, deadline: Instant) -> bool {
        tokio::select! {
            biased;

            // Ok: a cancel was signalled. Err: the container is gone.
            _ = self.cancelled.changed() => false,

            () = tokio::time::sleep_until(deadline) => true,
        }
    }

    /// Runs `step` under the container lock.
    ///
    /// Returns `None` without calling `step` if the container is gone or a
    /// cancel landed since this episode started.
    pub(crate) fn step<R>(&self, step: impl FnOnce(&mut Slot<M, V>) -> R) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let mut slot = shared.lock();
        if slot.epoch != self.epoch {
            return None;
        }
        Some(step(&mut slot))
    }
}
