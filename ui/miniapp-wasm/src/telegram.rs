//! Telegram `WebApp` host bridge.
//!
//! Typed facade over `window.Telegram.WebApp`. Each call is looked up with
//! `Reflect` and invoked directly, so a missing host (the page opened in a
//! plain browser) surfaces as `BridgeError::Unavailable` instead of a panic.

use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wr_api_types::{HostContext, InitDataUnsafe, ThemeParams};
use wr_host_bridge::{BridgeError, BridgeResult, ClickHandler, HandlerId, HostBridge, MainButton};

/// Reads `target[key]`, treating `undefined` and `null` as absent.
pub(crate) fn get_prop(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn invoke(target: Option<&JsValue>, op: &'static str, args: &[&JsValue]) -> BridgeResult {
    let target = target.ok_or(BridgeError::Unavailable)?;
    let func = get_prop(target, op)
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .ok_or_else(|| BridgeError::call(op, "not a function"))?;

    let result = match args {
        [] => func.call0(target),
        [a] => func.call1(target, a),
        [a, b] => func.call2(target, a, b),
        _ => return Err(BridgeError::call(op, "too many arguments")),
    };
    result
        .map(|_| ())
        .map_err(|e| BridgeError::call(op, describe(&e)))
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Some(msg) = get_prop(err, "message").and_then(|m| m.as_string()) {
        return msg;
    }
    format!("{err:?}")
}

pub struct TelegramButton {
    button: Option<JsValue>,
    // JS functions handed to `onClick`, kept so `offClick` gets the same one.
    closures: RefCell<HashMap<HandlerId, Closure<dyn FnMut()>>>,
}

impl MainButton for TelegramButton {
    fn set_text(&self, text: &str) -> BridgeResult {
        invoke(self.button.as_ref(), "setText", &[&JsValue::from_str(text)])
    }

    fn show(&self) -> BridgeResult {
        invoke(self.button.as_ref(), "show", &[])
    }

    fn hide(&self) -> BridgeResult {
        invoke(self.button.as_ref(), "hide", &[])
    }

    fn enable(&self) -> BridgeResult {
        invoke(self.button.as_ref(), "enable", &[])
    }

    fn disable(&self) -> BridgeResult {
        invoke(self.button.as_ref(), "disable", &[])
    }

    fn on_click(&self, handler: &ClickHandler) -> BridgeResult {
        let callback = handler.clone();
        let closure = Closure::wrap(Box::new(move || callback.invoke()) as Box<dyn FnMut()>);
        invoke(self.button.as_ref(), "onClick", &[closure.as_ref()])?;
        self.closures.borrow_mut().insert(handler.id(), closure);
        Ok(())
    }

    fn off_click(&self, handler: &ClickHandler) -> BridgeResult {
        let Some(closure) = self.closures.borrow_mut().remove(&handler.id()) else {
            debug!(handler = %handler.id(), "offClick for a handler that was never bound");
            return Ok(());
        };
        invoke(self.button.as_ref(), "offClick", &[closure.as_ref()])
    }
}

pub struct TelegramBridge {
    webapp: Option<JsValue>,
    button: TelegramButton,
}

impl TelegramBridge {
    /// Resolves `window.Telegram.WebApp`. Absent pieces are kept as `None`.
    pub fn from_window() -> Self {
        let webapp = web_sys::window()
            .and_then(|w| get_prop(&w.into(), "Telegram"))
            .and_then(|t| get_prop(&t, "WebApp"));
        let button = webapp.as_ref().and_then(|w| get_prop(w, "MainButton"));

        Self {
            webapp,
            button: TelegramButton {
                button,
                closures: RefCell::new(HashMap::new()),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.webapp.is_some()
    }
}

impl HostBridge for TelegramBridge {
    type Button = TelegramButton;

    fn ready(&self) -> BridgeResult {
        invoke(self.webapp.as_ref(), "ready", &[])
    }

    fn expand(&self) -> BridgeResult {
        invoke(self.webapp.as_ref(), "expand", &[])
    }

    fn close(&self) -> BridgeResult {
        invoke(self.webapp.as_ref(), "close", &[])
    }

    fn send_data(&self, payload: &str) -> BridgeResult {
        invoke(self.webapp.as_ref(), "sendData", &[&JsValue::from_str(payload)])
    }

    fn main_button(&self) -> &TelegramButton {
        &self.button
    }

    fn context(&self) -> HostContext {
        let Some(webapp) = self.webapp.as_ref() else {
            return HostContext::default();
        };

        let string = |key: &str| {
            get_prop(webapp, key)
                .and_then(|v| v.as_string())
                .unwrap_or_default()
        };
        let init_data_unsafe = get_prop(webapp, "initDataUnsafe")
            .and_then(|v| serde_wasm_bindgen::from_value::<InitDataUnsafe>(v).ok())
            .unwrap_or_default();
        let theme_params = get_prop(webapp, "themeParams")
            .and_then(|v| serde_wasm_bindgen::from_value::<ThemeParams>(v).ok());

        HostContext {
            platform: string("platform"),
            init_data: string("initData"),
            init_data_unsafe,
            is_expanded: get_prop(webapp, "isExpanded")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            theme_params,
        }
    }
}
