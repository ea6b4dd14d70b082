//! DOM element bindings.
//!
//! The page only ships an empty `#app` container; the fixed skeleton is
//! written once by `Elements::bind()` and the content area is re-rendered
//! on every connection change.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

// ── Helpers ──

pub fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn doc() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().ok()?.get_element_by_id(id)
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_inner_html(el: &Element, html: &str) {
    el.set_inner_html(html);
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

/// Minimal escaping for text interpolated into rendered markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Elements struct ──

const SKELETON: &str = r#"
<div class="telegram-container">
  <div class="header">
    <h1>Wallet Relay</h1>
    <p id="greeting" class="greeting"></p>
  </div>
  <div id="content" class="content"></div>
  <p id="status" class="status"></p>
</div>
"#;

/// DOM references used by the view. Clone-friendly (JS handles).
#[derive(Clone)]
pub struct Elements {
    pub app: Element,
    pub greeting: Element,
    pub content: Element,
    pub status: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

impl Elements {
    /// Writes the skeleton into `#app` and resolves its parts. Call once.
    pub fn bind() -> Result<Elements, JsValue> {
        let app = get_el!("app");
        set_inner_html(&app, SKELETON);

        Ok(Elements {
            greeting: get_el!("greeting"),
            content: get_el!("content"),
            status: get_el!("status"),
            app,
        })
    }
}
