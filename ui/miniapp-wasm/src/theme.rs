//! Host theming.
//!
//! Copies the host's `themeParams` colors onto CSS custom properties on the
//! `#app` container and tags it with the host platform. Purely cosmetic.

use crate::dom::{self, Elements};
use wasm_bindgen::JsCast;
use wr_api_types::HostContext;

/// CSS class for the host platform (`platform-ios`, `platform-tdesktop`, ...).
pub fn platform_class(platform: &str) -> Option<String> {
    let slug: String = platform
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    (!slug.is_empty()).then(|| format!("platform-{slug}"))
}

pub fn apply(els: &Elements, context: &HostContext) {
    if let Some(class) = platform_class(&context.platform) {
        dom::add_class(&els.app, &class);
    }
    dom::toggle_class(&els.app, "expanded", context.is_expanded);

    let Some(theme) = context.theme_params.as_ref() else {
        return;
    };
    let root: &web_sys::HtmlElement = els.app.unchecked_ref();
    let style = root.style();
    for (name, value) in theme.css_vars() {
        let _ = style.set_property(name, value);
    }
}
