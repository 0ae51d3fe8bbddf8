//! Regulation layer: debounce and throttle an async output.
//!
//! This module provides:
//! - The [`Regulator`] contract shared by both policies
//! - Debouncing ([`Debouncer`], driven by [`DebounceState`])
//! - Throttling ([`Throttler`], driven by [`ThrottleState`])
//! - Output callbacks ([`Output`], [`output`])
//! - Factory shortcuts ([`debounce`], [`throttle`])
//!
//! # Episodes
//!
//! A regulator is idle until a push arrives. That push, and only that push,
//! spawns a timer loop which runs until the state machine returns to idle.
//! Pushes from any thread are serialized by one mutex; the state machines
//! are pure and never block while it is held.
//!
//! # Due time
//!
//! `due_time` may be changed at any time and is read live whenever a deadline
//! is computed: a debounce push stamps `now + due_time`, a throttle loop
//! schedules each next window with the value current at that tick. Deadlines
//! already computed are never rewritten.
//!
//! # Output dispatch
//!
//! The output callback is read under the lock at dispatch time. Throttle
//! emissions are spawned as independent tasks that are never joined, neither
//! by the loop nor by teardown.

mod debounce;
mod debouncer;
mod episode;
mod error;
mod guarded;
mod output;
mod throttle;
mod throttler;

#[cfg(test)]
mod test_support;

pub use debounce::{DebounceState, Debounced, PendingValue};
pub use debouncer::Debouncer;
pub use error::InvariantViolation;
pub use output::{Output, OutputFuture, output};
pub use throttle::{ThrottleState, Ticked};
pub use throttler::Throttler;

use std::future::Future;
use std::time::Duration;

/// Paces calls to an async output driven by pushed values.
///
/// Implemented by [`Debouncer`] and [`Throttler`]. The trait is object safe so
/// the policy can be chosen at runtime (`Box<dyn Regulator<V>>`).
pub trait Regulator<V>: Send + Sync {
    /// Feeds a value. Never blocks beyond a short critical section.
    fn push(&self, value: V);

    /// Stops the in-flight episode, if any, and suppresses its pending output.
    ///
    /// Idempotent. The next push starts a fresh episode.
    fn cancel(&self);

    /// Returns the registered output callback.
    fn output(&self) -> Option<Output<V>>;

    /// Replaces the output callback. Takes effect for the next dispatch,
    /// including one already scheduled by the in-flight episode.
    fn set_output(&self, output: Option<Output<V>>);

    /// Returns the current due time.
    fn due_time(&self) -> Duration;

    /// Changes the due time used for deadlines computed from now on.
    fn set_due_time(&self, due_time: Duration);
}

impl<V, R: Regulator<V> + ?Sized> Regulator<V> for Box<R> {
    fn push(&self, value: V) {
        (**self).push(value);
    }

    fn cancel(&self) {
        (**self).cancel();
    }

    fn output(&self) -> Option<Output<V>> {
        (**self).output()
    }

    fn set_output(&self, output: Option<Output<V>>) {
        (**self).set_output(output);
    }

    fn due_time(&self) -> Duration {
        (**self).due_time()
    }

    fn set_due_time(&self, due_time: Duration) {
        (**self).set_due_time(due_time);
    }
}

/// Creates a [`Debouncer`] that calls `f` only after `due_time` elapses
/// without a new push.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn debounce<V, F, Fut>(due_time: Duration, f: F) -> Debouncer<V>
where
    V: Send + 'static,
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Debouncer::new(due_time).with_output(f)
}

/// Creates a [`Throttler`] that calls `f` at most once per `due_time` with
/// either the most recent (`latest`) or the first value of each window.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn throttle<V, F, Fut>(due_time: Duration, latest: bool, f: F) -> Throttler<V>
where
    V: Clone + Send + 'static,
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Throttler::new(due_time, latest).with_output(f)
}
