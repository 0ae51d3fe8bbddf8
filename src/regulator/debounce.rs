//! Debounce state machine.
//!
//! Pure value transitions; the timer loop in [`super::Debouncer`] drives them
//! under the container lock.

use tokio::time::Instant;

use super::InvariantViolation;
use super::guarded::StateMachine;

/// A pushed value stamped with the instant it becomes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingValue<V> {
    /// The pushed value.
    pub value: V,
    /// `push time + due time`.
    pub deadline: Instant,
}

impl<V> PendingValue<V> {
    /// Creates a pending value due at `deadline`.
    #[must_use]
    pub const fn new(value: V, deadline: Instant) -> Self {
        Self { value, deadline }
    }
}

/// State of a debounce episode.
///
/// | State | Push | Consume |
/// |-------|------|---------|
/// | `Idle` | `Debouncing(v, None)`, starts a loop | invariant violation |
/// | `Debouncing(c, _)` | `Debouncing(c, Some(v))` | queued becomes current, or idle |
///
/// A push while debouncing does not move the in-flight deadline. It only
/// replaces the value the loop will pick up when that deadline fires.
#[derive(Debug, PartialEq, Eq)]
pub enum DebounceState<V> {
    /// No episode in flight.
    Idle,
    /// An episode is waiting for `current.deadline`.
    Debouncing {
        /// Value whose deadline the loop is sleeping towards.
        current: PendingValue<V>,
        /// Most recent value pushed since `current` was taken.
        queued: Option<PendingValue<V>>,
    },
}

impl<V> Default for DebounceState<V> {
    fn default() -> Self {
        Self::Idle
    }
}

/// Outcome of [`DebounceState::consume_due`].
#[derive(Debug, PartialEq, Eq)]
pub enum Debounced<V> {
    /// A newer value arrived during the wait; sleep again until this deadline.
    Continue(Instant),
    /// A full quiet gap elapsed; emit this value. The machine is idle.
    Finish(V),
}

impl<V> DebounceState<V> {
    /// Records a pushed value.
    ///
    /// Returns `true` only for the push that leaves [`DebounceState::Idle`];
    /// the caller must then start the timer loop.
    pub fn record_push(&mut self, pending: PendingValue<V>) -> bool {
        match self {
            Self::Idle => {
                *self = Self::Debouncing {
                    current: pending,
                    queued: None,
                };
                true
            }
            Self::Debouncing { queued, .. } => {
                *queued = Some(pending);
                false
            }
        }
    }

    /// Consumes the value whose deadline just fired.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] when called on an idle machine, which
    /// stays idle.
    pub fn consume_due(&mut self) -> Result<Debounced<V>, InvariantViolation> {
        match std::mem::take(self) {
            Self::Idle => Err(InvariantViolation::idle("debounce", "consume_due")),
            Self::Debouncing {
                queued: Some(next), ..
            } => {
                let deadline = next.deadline;
                *self = Self::Debouncing {
                    current: next,
                    queued: None,
                };
                Ok(Debounced::Continue(deadline))
            }
            Self::Debouncing {
                current,
                queued: None,
            } => Ok(Debounced::Finish(current.value)),
        }
    }

    /// Returns true if no episode is in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl<V> StateMachine for DebounceState<V> {
    type Input = PendingValue<V>;

    fn record_push(&mut self, input: Self::Input) -> bool {
        Self::record_push(self, input)
    }

    fn is_idle(&self) -> bool {
        Self::is_idle(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(origin: Instant, millis: u64) -> Instant {
        origin + Duration::from_millis(millis)
    }

    #[tokio::test]
    async fn first_push_starts_an_episode() {
        let origin = Instant::now();
        let mut state = DebounceState::default();

        assert!(state.record_push(PendingValue::new(1, at(origin, 200))));
        assert_eq!(
            state,
            DebounceState::Debouncing {
                current: PendingValue::new(1, at(origin, 200)),
                queued: None,
            }
        );
    }

    #[tokio::test]
    async fn later_pushes_only_replace_the_queued_value() {
        let origin = Instant::now();
        let mut state = DebounceState::default();

        assert!(state.record_push(PendingValue::new(1, at(origin, 200))));
        assert!(!state.record_push(PendingValue::new(2, at(origin, 300))));
        assert!(!state.record_push(PendingValue::new(3, at(origin, 400))));

        assert_eq!(
            state,
            DebounceState::Debouncing {
                current: PendingValue::new(1, at(origin, 200)),
                queued: Some(PendingValue::new(3, at(origin, 400))),
            }
        );
    }

    #[tokio::test]
    async fn consume_with_queued_value_continues_until_its_deadline() {
        let origin = Instant::now();
        let mut state = DebounceState::default();
        state.record_push(PendingValue::new("a", at(origin, 200)));
        state.record_push(PendingValue::new("b", at(origin, 350)));

        let outcome = state.consume_due().unwrap();

        assert_eq!(outcome, Debounced::Continue(at(origin, 350)));
        assert_eq!(
            state,
            DebounceState::Debouncing {
                current: PendingValue::new("b", at(origin, 350)),
                queued: None,
            }
        );
    }

    #[tokio::test]
    async fn consume_without_queued_value_finishes_with_current() {
        let origin = Instant::now();
        let mut state = DebounceState::default();
        state.record_push(PendingValue::new("a", at(origin, 200)));
        state.record_push(PendingValue::new("b", at(origin, 350)));

        state.consume_due().unwrap();
        let outcome = state.consume_due().unwrap();

        assert_eq!(outcome, Debounced::Finish("b"));
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn push_after_finish_starts_a_new_episode() {
        let origin = Instant::now();
        let mut state = DebounceState::default();
        state.record_push(PendingValue::new(1, at(origin, 100)));
        state.consume_due().unwrap();

        assert!(state.record_push(PendingValue::new(2, at(origin, 500))));
    }

    #[test]
    fn consume_while_idle_is_an_invariant_violation() {
        let mut state = DebounceState::<u8>::default();

        let error = state.consume_due().unwrap_err();

        assert_eq!(error, InvariantViolation::idle("debounce", "consume_due"));
        assert!(state.is_idle());
    }

    #[test]
    fn default_is_idle() {
        assert!(DebounceState::<()>::default().is_idle());
    }
}
