//! Throttling regulator and its timer loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::episode::{Episode, abandon};
use super::guarded::Guarded;
use super::throttle::ThrottleState;
use super::{Output, Regulator, output};
use crate::time::{Clock, TokioClock, deadline_after};

/// Calls the output at most once per `due_time` window.
///
/// The first push out of idle opens a window; every window boundary emits
/// either the most recent (`latest`) or the first value pushed into it. The
/// episode ends at the first boundary that closes an empty window.
///
/// ```
/// use regulate::regulator::{Regulator, Throttler};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let throttler = Throttler::new(Duration::from_secs(2), true)
///     .with_output(|value: u32| async move { println!("{value}") });
///
/// for index in 0..100 {
///     throttler.push(index);
///     tokio::time::sleep(Duration::from_millis(100)).await;
/// }
/// // prints the latest index once every 2 seconds
/// # tokio::time::sleep(Duration::from_secs(5)).await;
/// # }
/// ```
pub struct Throttler<V, C = TokioClock> {
    shared: Arc<Guarded<ThrottleState<V>, V>>,
    latest: bool,
    clock: C,
    runtime: Handle,
}

impl<V: Clone + Send + 'static> Throttler<V> {
    /// Creates a throttler emitting once per `due_time`.
    ///
    /// `latest` selects the most recent value of each window; otherwise the
    /// first one is emitted. It cannot be changed afterwards.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(due_time: Duration, latest: bool) -> Self {
        Self::with_clock(due_time, latest, TokioClock)
    }
}

impl<V: Clone + Send + 'static, C: Clock> Throttler<V, C> {
    /// Creates a throttler timing its first window with a custom clock.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_clock(due_time: Duration, latest: bool, clock: C) -> Self {
        Self {
            shared: Guarded::new(due_time, None),
            latest,
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

    /// Returns true if windows emit their most recent value.
    #[must_use]
    pub const fn latest(&self) -> bool {
        self.latest
    }

    /// Returns true if no episode is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.shared.is_idle()
    }
}

impl<V: Clone + Send + 'static, C: Clock> Regulator<V> for Throttler<V, C> {
    fn push(&self, value: V) {
        let now = self.clock.now();
        let Some(episode) = self.shared.push(now, |_| value) else {
            tracing::trace!("Throttle value recorded in open window");
            return;
        };

        tracing::debug!("Throttle episode started (latest: {})", self.latest);
        self.runtime.spawn(run_episode(episode, self.latest));
    }

    fn cancel(&self) {
        if self.shared.cancel() {
            tracing::debug!("Throttle episode cancelled");
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

impl<V, C> Drop for Throttler<V, C> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl<V, C: std::fmt::Debug> std::fmt::Debug for Throttler<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.lock();
        f.debug_struct("Throttler")
            .field("due_time", &slot.due_time)
            .field("latest", &self.latest)
            .field("idle", &slot.machine.is_idle())
            .field("has_output", &slot.output.is_some())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Timer loop for one throttle episode.
///
/// Ticks on a fixed period. Each emission is spawned and never awaited, so a
/// slow output cannot delay the next window boundary.
async fn run_episode<V: Clone + Send + 'static>(
    mut episode: Episode<ThrottleState<V>, V>,
    latest: bool,
) {
    let mut deadline = episode.deadline();

    loop {
        if !episode.sleep_until(deadline).await {
            tracing::debug!("Throttle episode stopped while waiting");
            return;
        }

        let Some(step) = episode.step(|slot| {
            slot.machine
                .tick()
                .map(|ticked| (ticked, slot.output.clone(), slot.due_time))
        }) else {
            tracing::debug!("Throttle episode stopped before its tick");
            return;
        };

        let (ticked, output, due_time) = match step {
            Ok(step) => step,
            Err(violation) => {
                abandon(&violation);
                return;
            }
        };

        let Some(value) = ticked.sample(latest) else {
            tracing::debug!("Throttle episode finished");
            return;
        };

        if let Some(output) = output {
            tokio::spawn(output(value));
        }
        deadline = deadline_after(deadline, due_time);
    }
}
