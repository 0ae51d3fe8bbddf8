//! Output callbacks invoked by the timer loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by an [`Output`] invocation.
pub type OutputFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Shared async callback receiving regulated values.
///
/// Cloning is cheap; the timer loop clones the registered callback out of the
/// container at dispatch time.
pub type Output<V> = Arc<dyn Fn(V) -> OutputFuture + Send + Sync>;

/// Wraps an async closure into an [`Output`].
///
/// # Example
///
/// ```
/// use regulate::regulator::output;
///
/// let print = output(|value: u32| async move {
///     println!("regulated {value}");
/// });
/// # let _ = print;
/// ```
pub fn output<V, F, Fut>(f: F) -> Output<V>
where
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |value| Box::pin(f(value)) as OutputFuture)
}
