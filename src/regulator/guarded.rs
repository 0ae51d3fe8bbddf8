//! Lock-guarded state shared by a regulator facade and its timer loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::Output;
use super::episode::Episode;
use crate::time::deadline_after;

/// Pure transition logic driven under the container lock.
///
/// Implementations must not block or perform I/O.
pub(crate) trait StateMachine: Default {
    /// What a push records (the bare value, or a value stamped with its deadline).
    type Input;

    /// Records a push. Returns `true` only for the transition out of idle.
    fn record_push(&mut self, input: Self::Input) -> bool;

    /// Returns true if no episode is in flight.
    fn is_idle(&self) -> bool;
}

/// Everything mutated under the container lock.
pub(crate) struct Slot<M, V> {
    pub(crate) machine: M,
    /// Bumped by every cancel; episodes started under an older epoch are stale.
    pub(crate) epoch: u64,
    pub(crate) due_time: Duration,
    pub(crate) output: Option<Output<V>>,
}

/// A state machine behind a mutex, plus the signal that wakes cancelled loops.
///
/// The start decision, the cancel reset and output dispatch reads all happen
/// inside the same critical section, which gives them a total order.
pub(crate) struct Guarded<M, V> {
    slot: Mutex<Slot<M, V>>,
    cancelled: watch::Sender<u64>,
}

impl<M: StateMachine, V> Guarded<M, V> {
    pub(crate) fn new(due_time: Duration, output: Option<Output<V>>) -> Arc<Self> {
        let (cancelled, _) = watch::channel(0);
        Arc::new(Self {
            slot: Mutex::new(Slot {
                machine: M::default(),
                epoch: 0,
                due_time,
                output,
            }),
            cancelled,
        })
    }

    /// Acquires the lock.
    ///
    /// Every critical section leaves the slot consistent, so a poisoned lock
    /// is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Slot<M, V>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a push stamped at `now`.
    ///
    /// `input` receives the deadline `now + due_time`, capped far in the
    /// future. Returns the episode to run when this push left idle; exactly
    /// one of any set of racing pushers gets `Some`.
    pub(crate) fn push(
        self: &Arc<Self>,
        now: Instant,
        input: impl FnOnce(Instant) -> M::Input,
    ) -> Option<Episode<M, V>> {
        let mut slot = self.lock();
        let deadline = deadline_after(now, slot.due_time);
        if !slot.machine.record_push(input(deadline)) {
            return None;
        }

        Some(Episode::new(
            Arc::downgrade(self),
            slot.epoch,
            self.cancelled.subscribe(),
            deadline,
        ))
    }

    /// Resets the machine to idle and invalidates the running episode, if any.
    ///
    /// Returns true if an episode was in flight. Idempotent.
    pub(crate) fn cancel(&self) -> bool {
        let mut slot = self.lock();
        let was_active = !slot.machine.is_idle();
        slot.machine = M::default();
        slot.epoch = slot.epoch.wrapping_add(1);
        let epoch = slot.epoch;
        drop(slot);

        self.cancelled.send_replace(epoch);
        was_active
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.lock().machine.is_idle()
    }

    pub(crate) fn due_time(&self) -> Duration {
        self.lock().due_time
    }

    pub(crate) fn set_due_time(&self, due_time: Duration) {
        self.lock().due_time = due_time;
    }

    pub(crate) fn output(&self) -> Option<Output<V>> {
        self.lock().output.clone()
    }

    pub(crate) fn set_output(&self, output: Option<Output<V>>) {
        self.lock().output = output;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regulator::{DebounceState, PendingValue, ThrottleState, output};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn throttle_container() -> Arc<Guarded<ThrottleState<usize>, usize>> {
        Guarded::new(Duration::from_millis(100), None)
    }

    #[tokio::test]
    async fn first_push_starts_an_episode_with_deadline() {
        let container = throttle_container();
        let now = Instant::now();

        let episode = container.push(now, |_| 1).expect("first push starts");

        assert_eq!(episode.deadline(), now + Duration::from_millis(100));
        assert!(!container.is_idle());
    }

    #[tokio::test]
    async fn subsequent_pushes_do_not_start_another_episode() {
        let container = throttle_container();
        let now = Instant::now();

        assert!(container.push(now, |_| 1).is_some());
        assert!(container.push(now, |_| 2).is_none());
        assert!(container.push(now, |_| 3).is_none());
    }

    #[tokio::test]
    async fn deadline_uses_current_due_time() {
        let container: Arc<Guarded<DebounceState<&str>, &str>> =
            Guarded::new(Duration::from_millis(100), None);
        container.set_due_time(Duration::from_millis(250));
        let now = Instant::now();

        container.push(now, |deadline| PendingValue::new("a", deadline));

        let slot = container.lock();
        assert_eq!(
            slot.machine,
            DebounceState::Debouncing {
                current: PendingValue::new("a", now + Duration::from_millis(250)),
                queued: None,
            }
        );
    }

    #[tokio::test]
    async fn racing_pushers_observe_exactly_one_start() {
        let container = throttle_container();
        let now = Instant::now();
        let starts = AtomicUsize::new(0);

        thread::scope(|scope| {
            for pusher in 0..8 {
                let container = &container;
                let starts = &starts;
                scope.spawn(move || {
                    for i in 0..250 {
                        if container.push(now, |_| pusher * 1000 + i).is_some() {
                            starts.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_resets_to_idle_and_bumps_epoch() {
        let container = throttle_container();
        container.push(Instant::now(), |_| 1);

        assert!(container.cancel());

        let slot = container.lock();
        assert!(slot.machine.is_idle());
        assert_eq!(slot.epoch, 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let container = throttle_container();

        assert!(!container.cancel());
        assert!(!container.cancel());
        assert!(container.is_idle());
        assert_eq!(container.lock().epoch, 2);
    }

    #[tokio::test]
    async fn push_after_cancel_starts_a_fresh_episode() {
        let container = throttle_container();
        let now = Instant::now();
        container.push(now, |_| 1);
        container.cancel();

        assert!(container.push(now, |_| 2).is_some());
    }

    #[test]
    fn output_slot_can_be_replaced_and_cleared() {
        let container = throttle_container();
        assert!(container.output().is_none());

        container.set_output(Some(output(|_: usize| async {})));
        assert!(container.output().is_some());

        container.set_output(None);
        assert!(container.output().is_none());
    }

    #[test]
    fn lock_recovers_from_poisoning() {
        let container = throttle_container();

        let poisoner = Arc::clone(&container);
        let result = thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());

        container.set_due_time(Duration::from_secs(1));
        assert_eq!(container.due_time(), Duration::from_secs(1));
    }
}
