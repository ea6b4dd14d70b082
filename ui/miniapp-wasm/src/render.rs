//! View rendering.
//!
//! Connector list while disconnected, wallet summary while connected.
//! Markup is rebuilt on each change; listeners are re-attached by `events`.

use crate::dom::{self, Elements};
use crate::state;
use wr_api_types::{ConnectionState, ConnectorInfo, ConnectorKind, HostContext};

pub fn connector_list_html(connectors: &[ConnectorInfo], connecting: Option<ConnectorKind>) -> String {
    let mut buttons = String::new();
    for info in connectors {
        let kind = info.kind;
        let busy = connecting == Some(kind);
        let disabled = if !info.available || connecting.is_some() {
            " disabled"
        } else {
            ""
        };
        let label = if busy {
            format!("Connecting to {}...", kind.name())
        } else {
            format!("{} {}", kind.icon(), kind.name())
        };
        let hint = if info.available {
            ""
        } else {
            r#" title="Not available in this browser""#
        };
        buttons.push_str(&format!(
            r#"<button class="connect-button" data-connector="{}"{}{}>{}</button>"#,
            kind.uid(),
            hint,
            disabled,
            dom::escape(&label)
        ));
    }

    if connectors.iter().all(|c| !c.available) {
        buttons.push_str(
            r#"<p class="connect-hint">No wallet found. Open this page in a wallet browser or install an extension.</p>"#,
        );
    }

    format!(
        r#"<div class="connect-section"><h2>Connect Wallet</h2><div class="button-group">{}</div></div>"#,
        buttons
    )
}

pub fn wallet_info_html(state: &ConnectionState) -> String {
    let (full, short) = match &state.address {
        Some(address) => (address.to_string(), address.short()),
        None => (String::new(), String::new()),
    };
    let via = state
        .connector
        .map(|k| format!(r#"<p class="connector">via {}</p>"#, k.name()))
        .unwrap_or_default();

    format!(
        r#"<div class="wallet-info"><h2>Connected Wallet</h2><p class="address" title="{}">{}</p><p class="chain">{}</p>{}<button class="disconnect-button">Disconnect</button></div>"#,
        dom::escape(&full),
        dom::escape(&short),
        dom::escape(&state.chain_id.label()),
        via
    )
}

pub fn greeting(context: &HostContext) -> Option<String> {
    let user = context.init_data_unsafe.user.as_ref()?;
    let name = user
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| user.first_name.clone());
    (!name.trim().is_empty()).then(|| format!("Hi, {name}"))
}

pub fn render(els: &Elements, state: &ConnectionState, connectors: &[ConnectorInfo]) {
    let html = if state.is_connected {
        wallet_info_html(state)
    } else {
        connector_list_html(connectors, state::connecting())
    };
    dom::set_inner_html(&els.content, &html);
    dom::set_text(&els.status, &state::status().unwrap_or_default());
}

pub fn render_greeting(els: &Elements, context: &HostContext) {
    // Set as text: the name comes from the host and is untrusted.
    dom::set_text(&els.greeting, &greeting(context).unwrap_or_default());
}
