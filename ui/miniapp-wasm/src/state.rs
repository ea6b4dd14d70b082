//! View state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).
//! Connection state itself belongs to the wallet; this only tracks what the
//! view adds on top of it.

use std::cell::RefCell;
use wr_api_types::ConnectorKind;

#[derive(Clone, Debug, Default)]
pub struct ViewState {
    /// Connector whose handshake is in progress, if any.
    pub connecting: Option<ConnectorKind>,
    /// Last user-facing status line (connect errors and the like).
    pub status: Option<String>,
}

thread_local! {
    static STATE: RefCell<ViewState> = RefCell::new(ViewState::default());
}

pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&ViewState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut ViewState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

pub fn connecting() -> Option<ConnectorKind> {
    with(|s| s.connecting)
}

pub fn set_connecting(kind: Option<ConnectorKind>) {
    with_mut(|s| s.connecting = kind);
}

pub fn status() -> Option<String> {
    with(|s| s.status.clone())
}

pub fn set_status(message: Option<String>) {
    with_mut(|s| s.status = message);
}
