//! Application execution logic.
//!
//! This module contains the main async loop that feeds stdin lines through
//! a regulated binding and a regulated trigger.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};

use regulate::adapter::{RegulatedBinding, RegulatedTrigger};
use regulate::config::{Mode, ValidatedConfig};
use regulate::regulator::{Debouncer, Regulator, Throttler};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to read a line from the input.
    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),
}

/// Counters reported once the input is exhausted or shutdown is requested.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines set on the binding
    pub lines: usize,
    /// Values committed by the binding's regulator
    pub emitted: usize,
    /// Trigger lines read
    pub triggers: usize,
    /// Trigger actions run
    pub fired: usize,
}

/// Executes the main application loop on stdin.
///
/// Runs until stdin is closed (plus a grace period for pending emissions)
/// or a shutdown signal is received.
///
/// # Errors
///
/// Returns an error if reading stdin fails.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires a real
/// stdin and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let summary = run_lines(&config, lines, shutdown_signal()).await?;

    tracing::info!(
        "Done: {} line(s), {} emitted, {} trigger(s), {} fired",
        summary.lines,
        summary.emitted,
        summary.triggers,
        summary.fired,
    );
    Ok(())
}

/// Creates the regulator selected by `config`.
pub fn build_regulator<V>(config: &ValidatedConfig) -> Box<dyn Regulator<V>>
where
    V: Clone + Send + 'static,
{
    match config.mode {
        Mode::Debounce => Box::new(Debouncer::new(config.due_time)),
        Mode::Throttle => Box::new(Throttler::new(config.due_time, config.latest)),
    }
}

/// Feeds `lines` through a regulated binding and trigger until the stream
/// ends or `shutdown` completes.
///
/// After the stream ends, waits two due times so pending emissions land.
/// Shutdown returns at once and drops anything still pending.
async fn run_lines<S, F>(
    config: &ValidatedConfig,
    lines: S,
    shutdown: F,
) -> Result<RunSummary, RunError>
where
    S: Stream<Item = io::Result<String>>,
    F: Future<Output = ()>,
{
    let emitted = Arc::new(AtomicUsize::new(0));
    let fired = Arc::new(AtomicUsize::new(0));

    let binding = RegulatedBinding::new(String::new(), build_regulator::<String>(config), {
        let emitted = Arc::clone(&emitted);
        move |value: String| {
            emitted.fetch_add(1, Ordering::Relaxed);
            tracing::info!("{value}");
            std::future::ready(())
        }
    });
    let trigger = RegulatedTrigger::new(build_regulator::<()>(config), {
        let fired = Arc::clone(&fired);
        move || {
            let hits = fired.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::info!("Trigger fired ({hits} total)");
            std::future::ready(())
        }
    });

    let mut summary = RunSummary::default();
    tokio::pin!(lines);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                return Ok(snapshot(summary, &emitted, &fired));
            }

            line = lines.next() => {
                match line {
                    Some(Ok(line)) if line.trim() == config.trigger => {
                        summary.triggers += 1;
                        trigger.trigger();
                    }
                    Some(Ok(line)) => {
                        summary.lines += 1;
                        binding.set(line);
                    }
                    Some(Err(e)) => return Err(RunError::Input(e)),
                    None => break,
                }
            }
        }
    }

    tracing::debug!("Input closed, waiting for pending emissions");
    tokio::select! {
        biased;

        () = &mut shutdown => {
            tracing::info!("Shutdown signal received, stopping...");
        }

        () = tokio::time::sleep(config.due_time.saturating_mul(2)) => {}
    }

    Ok(snapshot(summary, &emitted, &fired))
}

fn snapshot(summary: RunSummary, emitted: &AtomicUsize, fired: &AtomicUsize) -> RunSummary {
    RunSummary {
        emitted: emitted.load(Ordering::Relaxed),
        fired: fired.load(Ordering::Relaxed),
        ..summary
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// A handler that cannot be installed is logged and never completes.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
