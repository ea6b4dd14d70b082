//! In-memory host bridge that records every call.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::{BridgeError, BridgeResult, ClickHandler, HandlerId, HostBridge, MainButton};
use wr_api_types::HostContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Ready,
    Expand,
    Close,
    SendData(String),
    SetText(String),
    Show,
    Hide,
    Enable,
    Disable,
    OnClick(HandlerId),
    OffClick(HandlerId),
}

#[derive(Default)]
pub struct RecordingButton {
    events: RefCell<Vec<BridgeEvent>>,
    handlers: RefCell<Vec<ClickHandler>>,
    text: RefCell<String>,
    visible: Cell<bool>,
    active: Cell<bool>,
}

impl RecordingButton {
    fn record(&self, event: BridgeEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn bound_handlers(&self) -> Vec<HandlerId> {
        self.handlers.borrow().iter().map(ClickHandler::id).collect()
    }

    /// Simulates a tap. The host delivers taps to every bound handler,
    /// whether or not the button is currently enabled.
    pub fn click(&self) {
        let handlers = self.handlers.borrow().clone();
        for handler in handlers {
            handler.invoke();
        }
    }

    /// Every caption the button has shown, in order.
    pub fn captions(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::SetText(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl MainButton for RecordingButton {
    fn set_text(&self, text: &str) -> BridgeResult {
        *self.text.borrow_mut() = text.to_owned();
        self.record(BridgeEvent::SetText(text.to_owned()));
        Ok(())
    }

    fn show(&self) -> BridgeResult {
        self.visible.set(true);
        self.record(BridgeEvent::Show);
        Ok(())
    }

    fn hide(&self) -> BridgeResult {
        self.visible.set(false);
        self.record(BridgeEvent::Hide);
        Ok(())
    }

    fn enable(&self) -> BridgeResult {
        self.active.set(true);
        self.record(BridgeEvent::Enable);
        Ok(())
    }

    fn disable(&self) -> BridgeResult {
        self.active.set(false);
        self.record(BridgeEvent::Disable);
        Ok(())
    }

    fn on_click(&self, handler: &ClickHandler) -> BridgeResult {
        self.handlers.borrow_mut().push(handler.clone());
        self.record(BridgeEvent::OnClick(handler.id()));
        Ok(())
    }

    fn off_click(&self, handler: &ClickHandler) -> BridgeResult {
        self.handlers.borrow_mut().retain(|h| h != handler);
        self.record(BridgeEvent::OffClick(handler.id()));
        Ok(())
    }
}

/// Fake host. Operations listed via [`RecordingBridge::fail`] return a
/// `BridgeError::Call` instead of being recorded.
#[derive(Default)]
pub struct RecordingBridge {
    events: RefCell<Vec<BridgeEvent>>,
    button: RecordingButton,
    failing: RefCell<HashSet<&'static str>>,
    unavailable: Cell<bool>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge whose host object is missing: every top-level call fails.
    pub fn unavailable() -> Self {
        let bridge = Self::default();
        bridge.unavailable.set(true);
        bridge
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.borrow_mut().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.borrow_mut().remove(op);
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.borrow().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::SendData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| **e == BridgeEvent::Close)
            .count()
    }

    pub fn button_events(&self) -> Vec<BridgeEvent> {
        self.button.events.borrow().clone()
    }

    fn call(&self, op: &'static str, event: BridgeEvent) -> BridgeResult {
        if self.unavailable.get() {
            return Err(BridgeError::Unavailable);
        }
        if self.failing.borrow().contains(op) {
            return Err(BridgeError::call(op, "injected failure"));
        }
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

impl HostBridge for RecordingBridge {
    type Button = RecordingButton;

    fn ready(&self) -> BridgeResult {
        self.call("ready", BridgeEvent::Ready)
    }

    fn expand(&self) -> BridgeResult {
        self.call("expand", BridgeEvent::Expand)
    }

    fn close(&self) -> BridgeResult {
        self.call("close", BridgeEvent::Close)
    }

    fn send_data(&self, payload: &str) -> BridgeResult {
        self.call("sendData", BridgeEvent::SendData(payload.to_owned()))
    }

    fn main_button(&self) -> &RecordingButton {
        &self.button
    }

    fn context(&self) -> HostContext {
        HostContext::default()
    }
}
