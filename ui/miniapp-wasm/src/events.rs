//! Event binding.
//!
//! The content area is re-rendered on every state change, so clicks are
//! handled by one delegated listener on `#content` bound at startup. Wallet
//! provider events come in through the wallet listener.

use std::rc::{Rc, Weak};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wr_api_types::ConnectorKind;
use wr_wallet_client::{WalletClient, WalletError};

use crate::AppController;
use crate::dom::{self, Elements};
use crate::render;
use crate::state;

/// Re-render the view from the controller's current snapshot.
pub fn refresh(els: &Elements, controller: &AppController) {
    render::render(els, &controller.snapshot(), &controller.wallet().connectors());
}

/// Bind all listeners. Call once after init.
pub fn bind_events(els: &Elements, controller: &Rc<AppController>) -> Result<(), JsValue> {
    bind_content_clicks(els, Rc::downgrade(controller))?;
    bind_wallet_listener(els, Rc::downgrade(controller));
    bind_pagehide(Rc::downgrade(controller))?;
    Ok(())
}

fn bind_content_clicks(els: &Elements, controller: Weak<AppController>) -> Result<(), JsValue> {
    let els2 = els.clone();
    let cb = Closure::wrap(Box::new(move |event: web_sys::MouseEvent| {
        let Some(controller) = controller.upgrade() else {
            return;
        };
        let Some(target) = event.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };

        if let Ok(Some(button)) = target.closest("[data-connector]") {
            if button.has_attribute("disabled") {
                return;
            }
            let uid = button.get_attribute("data-connector").unwrap_or_default();
            if let Some(kind) = ConnectorKind::from_uid(&uid) {
                let els3 = els2.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    on_connect(&els3, &controller, kind).await;
                });
            }
        } else if let Ok(Some(_)) = target.closest(".disconnect-button") {
            let els3 = els2.clone();
            wasm_bindgen_futures::spawn_local(async move {
                controller.disconnect().await;
                state::set_status(None);
                refresh(&els3, &controller);
            });
        }
    }) as Box<dyn FnMut(_)>);
    els.content
        .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

async fn on_connect(els: &Elements, controller: &AppController, kind: ConnectorKind) {
    state::set_connecting(Some(kind));
    state::set_status(None);
    refresh(els, controller);

    if let Err(err) = controller.connect(kind).await {
        let message = match err.downcast_ref::<WalletError>() {
            Some(WalletError::Rejected) => "Connection request was rejected.".to_owned(),
            Some(WalletError::Unavailable(name)) => format!("{name} is not available here."),
            _ => format!("Could not connect: {err}"),
        };
        state::set_status(Some(message));
    }

    state::set_connecting(None);
    refresh(els, controller);
}

fn bind_wallet_listener(els: &Elements, controller: Weak<AppController>) {
    let Some(strong) = controller.upgrade() else {
        return;
    };
    let els2 = els.clone();
    strong.wallet().set_listener(move |next| {
        if let Some(controller) = controller.upgrade() {
            controller.sync(next);
            refresh(&els2, &controller);
        }
    });
}

fn bind_pagehide(controller: Weak<AppController>) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Some(controller) = controller.upgrade() {
            debug!("page hidden; releasing main button");
            controller.teardown();
        }
    }) as Box<dyn FnMut(_)>);
    dom::window()?.add_event_listener_with_callback("pagehide", cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}
