//! Debouncing regulator and its timer loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::debounce::{DebounceState, Debounced, PendingValue};
use super::episode::{Episode, abandon};
use super::guarded::Guarded;
use super::{Output, Regulator, output};
use crate::time::{Clock, TokioClock};

/// Calls the output only after `due_time` elapses without a new push.
///
/// Only the last value pushed before a full quiet gap is emitted, exactly
/// once per episode.
///
/// ```
/// use regulate::regulator::{Debouncer, Regulator};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let debouncer = Debouncer::new(Duration::from_millis(200))
///     .with_output(|value: u32| async move { println!("{value}") });
///
/// for index in 0..100 {
///     debouncer.push(index);
///     tokio::time::sleep(Duration::from_millis(100)).await;
/// }
/// // prints "99" 200ms after the last push
/// # tokio::time::sleep(Duration::from_secs(1)).await;
/// # }
/// ```
pub struct Debouncer<V, C = TokioClock> {
    shared: Arc<Guarded<DebounceState<V>, V>>,
    clock: C,
    runtime: Handle,
}

impl<V: Send + 'static> Debouncer<V> {
    /// Creates a debouncer waiting `due_time` of quiet before emitting.
    ///
    /// Timer loops run on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(due_time: Duration) -> Self {
        Self::with_clock(due_time, TokioClock)
    }
}

impl<V: Send + 'static, C: Clock> Debouncer<V, C> {
    /// Creates a debouncer stamping deadlines with a custom clock.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_clock(due_time: Duration, clock: C) -> Self {
        Self {
            shared: Guarded::new(due_time, None),
            clock,
            runtime: Handle::current(),
        }
    }

    /// Runs timer loops on `runtime` instead of the one active at construction.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = runtime;
        self
    }

    /// Registers the output callback.
    #[must_use]
    pub fn with_output<F, Fut>(self, f: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shared.set_output(Some(output(f)));
        self
    }

    /// Returns true if no episode is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.shared.is_idle()
    }
}

impl<V: Send + 'static, C: Clock> Regulator<V> for Debouncer<V, C> {
    fn push(&self, value: V) {
        let now = self.clock.now();
        let Some(episode) = self
            .shared
            .push(now, |deadline| PendingValue::new(value, deadline))
        else {
            tracing::trace!("Debounce value queued behind running episode");
            return;
        };

        tracing::debug!("Debounce episode started");
        self.runtime.spawn(run_episode(episode));
    }

    fn cancel(&self) {
        if self.shared.cancel() {
            tracing::debug!("Debounce episode cancelled");
        }
    }

    fn output(&self) -> Option<Output<V>> {
        self.shared.output()
    }

    fn set_output(&self, output: Option<Output<V>>) {
        self.shared.set_output(output);
    }

    fn due_time(&self) -> Duration {
        self.shared.due_time()
    }

    fn set_due_time(&self, due_time: Duration) {
        self.shared.set_due_time(due_time);
    }
}

impl<V, C> Drop for Debouncer<V, C> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl<V, C: std::fmt::Debug> std::fmt::Debug for Debouncer<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.lock();
        f.debug_struct("Debouncer")
            .field("due_time", &slot.due_time)
            .field("idle", &slot.machine.is_idle())
            .field("has_output", &slot.output.is_some())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Timer loop for one debounce episode.
///
/// Sleeps towards the current value's deadline. If newer values were queued
/// meanwhile, sleeps again towards the newest one; otherwise emits the current
/// value and ends the episode.
async fn run_episode<V: Send + 'static>(mut episode: Episode<DebounceState<V>, V>) {
    let mut deadline = episode.deadline();

    loop {
        if !episode.sleep_until(deadline).await {
            tracing::debug!("Debounce episode stopped while waiting");
            return;
        }

        let Some(step) = episode.step(|slot| {
            slot.machine
                .consume_due()
                .map(|debounced| (debounced, slot.output.clone()))
        }) else {
            tracing::debug!("Debounce episode stopped before consuming its value");
            return;
        };

        match step {
            Ok((Debounced::Continue(next), _)) => deadline = next,
            Ok((Debounced::Finish(value), output)) => {
                tracing::debug!("Debounce episode finished");
                if let Some(output) = output {
                    output(value).await;
                }
                return;
            }
            Err(violation) => {
                abandon(&violation);
                return;
            }
        }
    }
}
