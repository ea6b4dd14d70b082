use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A boxed future pinned to the UI thread.
pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// Scheduling seam between the controller and its event loop.
///
/// The browser spawns onto the microtask queue and sleeps on `setTimeout`;
/// tests drive tasks by hand on a paused tokio clock.
pub trait Runtime {
    fn spawn(&self, task: LocalTask);
    fn sleep(&self, duration: Duration) -> LocalTask;
}
