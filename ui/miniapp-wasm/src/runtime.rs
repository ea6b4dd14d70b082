use std::time::Duration;
use wr_controller::{LocalTask, Runtime};

/// Microtask spawning and `setTimeout`-backed sleeps.
#[derive(Clone, Copy, Default)]
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn spawn(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalTask {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}
