//! Routes `tracing` output to the browser console.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_web::MakeWebConsoleWriter;

/// Installs the console subscriber. Safe to call more than once.
pub fn init() {
    // No timestamps: there is no system clock on wasm32.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(MakeWebConsoleWriter::new());

    let _ = tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(fmt_layer)
        .try_init();
}
