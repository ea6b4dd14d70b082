//! Host bridge contract.
//!
//! The embedding chat client injects a global object that owns the native
//! main button, the one-shot data channel and the close command. Nothing in
//! the controller touches that global directly: it talks to a [`HostBridge`].
//! Every host call is fire-and-forget on the host side, so each operation is
//! wrapped in a `Result` here and the caller decides what a failure means.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use wr_api_types::HostContext;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("host bridge is not available")]
    Unavailable,
    #[error("host call `{op}` failed: {message}")]
    Call { op: &'static str, message: String },
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

impl BridgeError {
    pub fn call(op: &'static str, message: impl Into<String>) -> Self {
        BridgeError::Call {
            op,
            message: message.into(),
        }
    }
}

pub type BridgeResult = Result<(), BridgeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

static NEXT_HANDLER: AtomicU64 = AtomicU64::new(1);

/// A main-button click callback with a stable identity.
///
/// Unbinding must use the same handler that was bound; a fresh closure
/// never matches. Clones share the identity.
#[derive(Clone)]
pub struct ClickHandler {
    id: HandlerId,
    callback: Rc<dyn Fn()>,
}

impl ClickHandler {
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self {
            id: HandlerId(NEXT_HANDLER.fetch_add(1, Ordering::Relaxed)),
            callback: Rc::new(callback),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn invoke(&self) {
        (self.callback)()
    }
}

impl PartialEq for ClickHandler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClickHandler {}

impl fmt::Debug for ClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHandler").field("id", &self.id).finish()
    }
}

/// The host-rendered primary action button.
pub trait MainButton {
    fn set_text(&self, text: &str) -> BridgeResult;
    fn show(&self) -> BridgeResult;
    fn hide(&self) -> BridgeResult;
    fn enable(&self) -> BridgeResult;
    fn disable(&self) -> BridgeResult;
    fn on_click(&self, handler: &ClickHandler) -> BridgeResult;
    fn off_click(&self, handler: &ClickHandler) -> BridgeResult;
}

pub trait HostBridge {
    type Button: MainButton;

    fn ready(&self) -> BridgeResult;
    fn expand(&self) -> BridgeResult;
    fn close(&self) -> BridgeResult;
    fn send_data(&self, payload: &str) -> BridgeResult;
    fn main_button(&self) -> &Self::Button;
    fn context(&self) -> HostContext;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn clones_share_identity_but_new_handlers_do_not() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let first = ClickHandler::new(move || counter.set(counter.get() + 1));
        let cloned = first.clone();
        let other = ClickHandler::new(|| {});

        assert_eq!(first, cloned);
        assert_ne!(first, other);

        cloned.invoke();
        first.invoke();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn call_errors_name_the_operation() {
        let err = BridgeError::call("sendData", "WebAppDataInvalid");
        assert_eq!(err.to_string(), "host call `sendData` failed: WebAppDataInvalid");
    }
}
