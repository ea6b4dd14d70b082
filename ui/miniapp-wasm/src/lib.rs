//! Wallet Relay mini app, browser side.
//!
//! Connects a wallet, signs the ownership attestation and relays the result
//! to the Telegram chat through `WebApp.sendData`. The confirm sequence lives
//! in `wr-controller`; this crate supplies the DOM, the Telegram adapter and
//! the EIP-1193 wallet.

pub mod config;
pub mod dom;
pub mod events;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod state;
pub mod telegram;
pub mod theme;
pub mod wallet;

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wr_controller::Controller;
use wr_host_bridge::HostBridge;

pub type AppController = Controller<telegram::TelegramBridge, wallet::BrowserWallet, runtime::BrowserRuntime>;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();
    logging::init();

    init()
}

fn init() -> Result<(), JsValue> {
    let config = config::AppConfig::from_build_env();
    let els = dom::Elements::bind()?;

    let bridge = telegram::TelegramBridge::from_window();
    if !bridge.is_available() {
        warn!("Telegram WebApp not found; running without host integration");
    }
    let context = bridge.context();
    theme::apply(&els, &context);
    render::render_greeting(&els, &context);

    let wallet = wallet::BrowserWallet::discover(config.wc_project_id.clone());
    let controller = Controller::new(bridge, wallet, runtime::BrowserRuntime, config.controller);
    info!(
        platform = %context.platform,
        schema = ?controller.config().schema,
        "mini app starting"
    );
    controller.init();

    events::refresh(&els, &controller);
    events::bind_events(&els, &controller)?;

    // Listeners hold weak references; keep the controller alive for the page.
    std::mem::forget(controller);
    Ok(())
}
