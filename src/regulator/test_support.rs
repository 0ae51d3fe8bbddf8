//! Shared fixtures for regulator tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::{Output, output};

/// Records every value handed to its output, with the instant it arrived.
#[derive(Clone)]
pub(super) struct Spy<V> {
    emissions: Arc<Mutex<Vec<(V, Instant)>>>,
}

impl<V: Clone + Send + 'static> Spy<V> {
    pub(super) fn new() -> Self {
        Self {
            emissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An output callback feeding this spy.
    pub(super) fn output(&self) -> Output<V> {
        let emissions = Arc::clone(&self.emissions);
        output(move |value| {
            let emissions = Arc::clone(&emissions);
            async move {
                emissions.lock().unwrap().push((value, Instant::now()));
            }
        })
    }

    pub(super) fn values(&self) -> Vec<V> {
        self.emissions
            .lock()
            .unwrap()
            .iter()
            .map(|(value, _)| value.clone())
            .collect()
    }

    /// Offsets of each emission from `origin`.
    pub(super) fn offsets(&self, origin: Instant) -> Vec<Duration> {
        self.emissions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| *at - origin)
            .collect()
    }
}

/// Pushes `values` one `spacing` apart, the first one immediately.
pub(super) async fn push_spaced<V, R>(
    regulator: &R,
    values: impl IntoIterator<Item = V>,
    spacing: Duration,
) where
    R: super::Regulator<V>,
{
    let mut first = true;
    for value in values {
        if !first {
            tokio::time::sleep(spacing).await;
        }
        first = false;
        regulator.push(value);
    }
}

/// Asserts `actual` is `expected` give or take the timer's 1ms resolution.
pub(super) fn assert_offsets(actual: &[Duration], expected_millis: &[u64]) {
    assert_eq!(
        actual.len(),
        expected_millis.len(),
        "emission offsets {actual:?}, expected {expected_millis:?}ms"
    );
    for (offset, millis) in actual.iter().zip(expected_millis) {
        let expected = Duration::from_millis(*millis);
        assert!(
            *offset >= expected && *offset <= expected + Duration::from_millis(2),
            "emission offsets {actual:?}, expected {expected_millis:?}ms"
        );
    }
}
