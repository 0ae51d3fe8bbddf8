//! Adapters that put a regulator in front of a value or an action.
//!
//! [`RegulatedBinding`] stores every value it is given immediately and lets
//! the regulator decide which of them get committed downstream.
//! [`RegulatedTrigger`] turns bursts of triggers into paced action calls.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::regulator::{Regulator, output};

/// A value whose writes are committed through a regulator.
///
/// `set` updates the stored value at once, so `get` always reflects the
/// latest write. The regulator output forwards the regulated values to the
/// `commit` callback. Concurrent writers are ordered: the value `get`
/// returns is always the last one pushed to the regulator.
pub struct RegulatedBinding<V, R> {
    value: Mutex<V>,
    regulator: R,
}

impl<V, R> RegulatedBinding<V, R>
where
    V: Clone + Send + 'static,
    R: Regulator<V>,
{
    /// Wraps `initial` and registers `commit` as the regulator output.
    ///
    /// Any output already registered on `regulator` is replaced.
    pub fn new<F, Fut>(initial: V, regulator: R, commit: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        regulator.set_output(Some(output(commit)));
        Self {
            value: Mutex::new(initial),
            regulator,
        }
    }

    /// Returns the most recently set value.
    pub fn get(&self) -> V {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores `value` and pushes it to the regulator.
    pub fn set(&self, value: V) {
        // Push under the value lock so store order matches push order.
        let mut stored = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *stored = value.clone();
        self.regulator.push(value);
    }

    /// Returns the regulator pacing commits.
    #[must_use]
    pub const fn regulator(&self) -> &R {
        &self.regulator
    }
}

/// An action paced by a regulator of unit pushes.
pub struct RegulatedTrigger<R> {
    regulator: R,
}

impl<R: Regulator<()>> RegulatedTrigger<R> {
    /// Registers `action` as the regulator output.
    pub fn new<F, Fut>(regulator: R, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        regulator.set_output(Some(output(move |()| action())));
        Self { regulator }
    }

    /// Requests one run of the action.
    pub fn trigger(&self) {
        self.regulator.push(());
    }

    /// Drops any run the regulator has not dispatched yet.
    pub fn cancel(&self) {
        self.regulator.cancel();
    }

    /// Returns the regulator pacing the action.
    #[must_use]
    pub const fn regulator(&self) -> &R {
        &self.regulator
    }
}
