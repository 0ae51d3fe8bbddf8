//! Throttle state machine.

use super::InvariantViolation;
use super::guarded::StateMachine;

/// State of a throttle episode.
///
/// The window between two ticks accumulates the first and the most recent
/// value pushed into it. A tick hands both out and opens an empty window; a
/// tick on an empty window ends the episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleState<V> {
    /// No episode in flight.
    Idle,
    /// Episode running, nothing pushed since the last tick.
    AccumulatingEmpty,
    /// Exactly one value pushed in the current window.
    AccumulatingFirst(V),
    /// Several values pushed in the current window.
    AccumulatingFirstAndLast {
        /// First value of the window.
        first: V,
        /// Most recent value of the window.
        last: V,
    },
}

impl<V> Default for ThrottleState<V> {
    fn default() -> Self {
        Self::Idle
    }
}

/// Outcome of [`ThrottleState::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ticked<V> {
    /// The window was empty; the machine is idle and the episode is over.
    Finish,
    /// The window held values; emit one of them and keep ticking.
    ContinueWith {
        /// First value of the window.
        first: V,
        /// Most recent value of the window.
        last: V,
    },
}

impl<V> Ticked<V> {
    /// Picks the value to emit: `last` when `latest`, `first` otherwise.
    ///
    /// Returns `None` for [`Ticked::Finish`].
    #[must_use]
    pub fn sample(self, latest: bool) -> Option<V> {
        match self {
            Self::Finish => None,
            Self::ContinueWith { first, last } => Some(if latest { last } else { first }),
        }
    }
}

impl<V> ThrottleState<V> {
    /// Records a pushed value.
    ///
    /// Returns `true` only for the push that leaves [`ThrottleState::Idle`].
    /// A push into an empty window of a running episode returns `false`: the
    /// loop is already ticking.
    pub fn record_push(&mut self, value: V) -> bool {
        match std::mem::take(self) {
            Self::Idle => {
                *self = Self::AccumulatingFirst(value);
                true
            }
            Self::AccumulatingEmpty => {
                *self = Self::AccumulatingFirst(value);
                false
            }
            Self::AccumulatingFirst(first) | Self::AccumulatingFirstAndLast { first, .. } => {
                *self = Self::AccumulatingFirstAndLast { first, last: value };
                false
            }
        }
    }

    /// Closes the current window.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] when called on an idle machine, which
    /// stays idle.
    pub fn tick(&mut self) -> Result<Ticked<V>, InvariantViolation>
    where
        V: Clone,
    {
        match std::mem::take(self) {
            Self::Idle => Err(InvariantViolation::idle("throttle", "tick")),
            Self::AccumulatingEmpty => Ok(Ticked::Finish),
            Self::AccumulatingFirst(first) => {
                *self = Self::AccumulatingEmpty;
                Ok(Ticked::ContinueWith {
                    last: first.clone(),
                    first,
                })
            }
            Self::AccumulatingFirstAndLast { first, last } => {
                *self = Self::AccumulatingEmpty;
                Ok(Ticked::ContinueWith { first, last })
            }
        }
    }

    /// Returns true if no episode is in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl<V> StateMachine for ThrottleState<V> {
    type Input = V;

    fn record_push(&mut self, input: Self::Input) -> bool {
        Self::record_push(self, input)
    }

    fn is_idle(&self) -> bool {
        Self::is_idle(self)
    }
}
