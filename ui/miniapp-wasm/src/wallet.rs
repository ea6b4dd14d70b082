//! EIP-1193 wallet client.
//!
//! Every connector resolves to an EIP-1193 provider object:
//! - MetaMask / Coinbase Wallet: the matching entry in `window.ethereum`
//!   (or its `providers` list when several extensions are installed),
//! - Injected: whatever `window.ethereum` is,
//! - WalletConnect: a provider built by the page-supplied
//!   `WalletConnectEthereumProvider.init()` with the configured project id.
//!
//! Provider events (`accountsChanged`, `chainChanged`, `disconnect`) update
//! the connection state and are forwarded to the registered listener.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wr_api_types::{
    ChainId, ConnectionState, ConnectorInfo, ConnectorKind, KNOWN_CHAINS, MAINNET, WalletAddress,
};
use wr_wallet_client::{ConnectorRegistry, WalletClient, WalletError, personal_sign_params};

use crate::telegram::{describe, get_prop};

const PROVIDER_EVENTS: [&str; 3] = ["accountsChanged", "chainChanged", "disconnect"];

type StateListener = Rc<dyn Fn(ConnectionState)>;

struct Session {
    kind: ConnectorKind,
    provider: JsValue,
    subscriptions: Vec<(&'static str, Closure<dyn FnMut(JsValue)>)>,
}

#[derive(Clone)]
pub struct BrowserWallet {
    inner: Rc<Inner>,
}

struct Inner {
    registry: ConnectorRegistry,
    project_id: Option<String>,
    session: RefCell<Option<Session>>,
    state: RefCell<ConnectionState>,
    listener: RefCell<Option<StateListener>>,
}

impl BrowserWallet {
    /// Probes the page for every supported connector.
    pub fn discover(project_id: Option<String>) -> Self {
        let mut registry = ConnectorRegistry::default();
        registry.register(ConnectorKind::MetaMask, find_injected(ConnectorKind::MetaMask).is_some());
        registry.register(ConnectorKind::Injected, find_injected(ConnectorKind::Injected).is_some());
        registry.register(
            ConnectorKind::CoinbaseWallet,
            find_injected(ConnectorKind::CoinbaseWallet).is_some(),
        );
        registry.register(
            ConnectorKind::WalletConnect,
            project_id.is_some() && walletconnect_factory().is_some(),
        );

        debug!(connectors = ?registry.list(), "wallet connectors discovered");
        Self {
            inner: Rc::new(Inner {
                registry,
                project_id,
                session: RefCell::new(None),
                state: RefCell::new(ConnectionState::disconnected()),
                listener: RefCell::new(None),
            }),
        }
    }

    /// Registers the callback run after every provider-driven state change.
    pub fn set_listener(&self, listener: impl Fn(ConnectionState) + 'static) {
        *self.inner.listener.borrow_mut() = Some(Rc::new(listener));
    }

    async fn resolve_provider(&self, kind: ConnectorKind) -> Result<JsValue> {
        if kind != ConnectorKind::WalletConnect {
            return find_injected(kind).ok_or_else(|| anyhow!(WalletError::Unavailable(kind.name())));
        }

        let project_id = self
            .inner
            .project_id
            .as_deref()
            .ok_or_else(|| anyhow!(WalletError::Unavailable(kind.name())))?;
        let factory =
            walletconnect_factory().ok_or_else(|| anyhow!(WalletError::Unavailable(kind.name())))?;

        let optional: Vec<u64> = KNOWN_CHAINS.iter().map(|(id, _)| id.0).collect();
        let options = serde_json::json!({
            "projectId": project_id,
            "chains": [MAINNET.0],
            "optionalChains": optional,
            "showQrModal": true,
        });
        let options = serde_wasm_bindgen::to_value(&options)
            .map_err(|e| anyhow!("failed to encode WalletConnect options: {e}"))?;
        let provider = call_method(&factory, "init", &[&options])
            .await
            .context("WalletConnect provider init failed")?;
        Ok(provider)
    }

    fn subscribe(&self, provider: &JsValue) -> Vec<(&'static str, Closure<dyn FnMut(JsValue)>)> {
        let mut subscriptions = Vec::new();
        for event in PROVIDER_EVENTS {
            let weak = Rc::downgrade(&self.inner);
            let closure = Closure::wrap(Box::new(move |arg: JsValue| {
                if let Some(inner) = weak.upgrade() {
                    BrowserWallet { inner }.on_provider_event(event, arg);
                }
            }) as Box<dyn FnMut(JsValue)>);

            let on = get_prop(provider, "on").and_then(|f| f.dyn_into::<js_sys::Function>().ok());
            match on {
                Some(on) => {
                    if let Err(e) = on.call2(provider, &JsValue::from_str(event), closure.as_ref()) {
                        warn!(event, "provider subscription failed: {}", describe(&e));
                        continue;
                    }
                    subscriptions.push((event, closure));
                }
                None => {
                    warn!("provider has no event emitter; state changes will not be tracked");
                    break;
                }
            }
        }
        subscriptions
    }

    fn on_provider_event(&self, event: &str, arg: JsValue) {
        let next = {
            let mut state = self.inner.state.borrow_mut();
            match event {
                "accountsChanged" => {
                    let accounts: Vec<String> =
                        serde_wasm_bindgen::from_value(arg).unwrap_or_default();
                    match accounts.into_iter().next() {
                        Some(address) => {
                            state.address = Some(WalletAddress(address));
                            state.is_connected = true;
                        }
                        None => *state = ConnectionState::disconnected(),
                    }
                }
                "chainChanged" => match arg.as_string().and_then(|raw| ChainId::parse(&raw)) {
                    Some(chain_id) => state.chain_id = chain_id,
                    None => warn!("unparseable chainChanged payload"),
                },
                "disconnect" => *state = ConnectionState::disconnected(),
                _ => return,
            }
            state.clone()
        };

        info!(event, connected = next.is_connected, "wallet state changed");
        if !next.is_connected {
            self.end_session();
        }
        let listener = self.inner.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(next);
        }
    }

    fn end_session(&self) {
        let Some(session) = self.inner.session.borrow_mut().take() else {
            return;
        };
        let remove = get_prop(&session.provider, "removeListener")
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
        if let Some(remove) = remove {
            for (event, closure) in &session.subscriptions {
                if let Err(e) = remove.call2(&session.provider, &JsValue::from_str(event), closure.as_ref()) {
                    warn!(event, "provider unsubscribe failed: {}", describe(&e));
                }
            }
        }
        // May run inside one of these closures; free them on the next tick.
        wasm_bindgen_futures::spawn_local(async move { drop(session) });
    }

    fn provider(&self) -> Result<(ConnectorKind, JsValue)> {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map(|s| (s.kind, s.provider.clone()))
            .ok_or_else(|| anyhow!(WalletError::NotConnected))
    }
}

#[async_trait(?Send)]
impl WalletClient for BrowserWallet {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        self.inner.registry.list()
    }

    fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    async fn connect(&self, connector: ConnectorKind) -> Result<ConnectionState> {
        if !self.inner.registry.is_available(connector) {
            return Err(anyhow!(WalletError::Unavailable(connector.name())));
        }
        self.end_session();

        let provider = self.resolve_provider(connector).await?;
        let (address, chain_id) = match request_account(&provider).await {
            Ok(found) => found,
            Err(err) => {
                if connector == ConnectorKind::WalletConnect {
                    close_relay_session(&provider).await;
                }
                return Err(err);
            }
        };

        let subscriptions = self.subscribe(&provider);
        *self.inner.session.borrow_mut() = Some(Session {
            kind: connector,
            provider,
            subscriptions,
        });

        let state = ConnectionState {
            address: Some(WalletAddress(address)),
            is_connected: true,
            chain_id,
            connector: Some(connector),
        };
        *self.inner.state.borrow_mut() = state.clone();
        Ok(state)
    }

    async fn disconnect(&self) -> Result<()> {
        let result = match self.provider() {
            Ok((ConnectorKind::WalletConnect, provider)) => call_method(&provider, "disconnect", &[])
                .await
                .map(|_| ())
                .context("WalletConnect disconnect failed"),
            Ok((_, provider)) => {
                // Extensions keep their own permission; revoking is optional.
                let params = serde_json::json!([{ "eth_accounts": {} }]);
                if let Err(err) = rpc(&provider, "wallet_revokePermissions", params).await {
                    debug!("wallet_revokePermissions unsupported: {err:#}");
                }
                Ok(())
            }
            Err(_) => Ok(()),
        };

        self.end_session();
        *self.inner.state.borrow_mut() = ConnectionState::disconnected();
        result
    }

    async fn sign_message(&self, address: &WalletAddress, message: &str) -> Result<String> {
        let (_, provider) = self.provider()?;
        let signature = rpc(&provider, "personal_sign", personal_sign_params(address, message)).await?;
        signature
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("personal_sign returned a non-string signature"))
    }
}

/// `eth_requestAccounts` then `eth_chainId`; the first account is used.
async fn request_account(provider: &JsValue) -> Result<(String, ChainId)> {
    let accounts: Vec<String> = rpc(provider, "eth_requestAccounts", Value::Array(Vec::new()))
        .await
        .and_then(|v| serde_json::from_value(v).context("eth_requestAccounts returned no array"))?;
    let address = accounts
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!(WalletError::NotConnected))?;
    let chain_id = rpc(provider, "eth_chainId", Value::Array(Vec::new()))
        .await?
        .as_str()
        .and_then(ChainId::parse)
        .unwrap_or(MAINNET);
    Ok((address, chain_id))
}

/// Drops a WalletConnect relay session that never became a connection.
async fn close_relay_session(provider: &JsValue) {
    match call_method(provider, "disconnect", &[]).await {
        Ok(_) => debug!("abandoned WalletConnect session closed"),
        Err(err) => warn!("failed to close abandoned WalletConnect session: {err:#}"),
    }
}

fn flag(target: &JsValue, key: &str) -> bool {
    get_prop(target, key).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn window_prop(key: &str) -> Option<JsValue> {
    let window: JsValue = web_sys::window()?.into();
    get_prop(&window, key)
}

fn find_injected(kind: ConnectorKind) -> Option<JsValue> {
    if kind == ConnectorKind::CoinbaseWallet {
        if let Some(extension) = window_prop("coinbaseWalletExtension") {
            return Some(extension);
        }
    }

    let ethereum = window_prop("ethereum")?;
    let matches = |p: &JsValue| match kind {
        ConnectorKind::MetaMask => flag(p, "isMetaMask"),
        ConnectorKind::CoinbaseWallet => flag(p, "isCoinbaseWallet"),
        ConnectorKind::Injected => true,
        ConnectorKind::WalletConnect => false,
    };

    if kind != ConnectorKind::Injected {
        if let Some(providers) = get_prop(&ethereum, "providers").filter(js_sys::Array::is_array) {
            let providers: js_sys::Array = providers.unchecked_into();
            if let Some(found) = providers.iter().find(|p| matches(p)) {
                return Some(found);
            }
        }
    }
    matches(&ethereum).then_some(ethereum)
}

fn walletconnect_factory() -> Option<JsValue> {
    let factory = window_prop("WalletConnectEthereumProvider")?;
    // UMD bundles expose the class either directly or under `EthereumProvider`.
    get_prop(&factory, "EthereumProvider").or(Some(factory))
}

/// Calls `target[method](...args)` and awaits the returned promise.
async fn call_method(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue> {
    let func = get_prop(target, method)
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .ok_or_else(|| anyhow!("provider has no {method}()"))?;
    let returned = match args {
        [] => func.call0(target),
        [a] => func.call1(target, a),
        _ => return Err(anyhow!("{method}: unsupported argument count")),
    }
    .map_err(|e| anyhow!("{method} threw: {}", describe(&e)))?;

    match returned.dyn_into::<js_sys::Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(rpc_error),
        Err(value) => Ok(value),
    }
}

/// EIP-1193 `request({ method, params })`.
async fn rpc(provider: &JsValue, method: &str, params: Value) -> Result<Value> {
    let request = serde_json::json!({ "method": method, "params": params });
    let request = serde_wasm_bindgen::to_value(&request)
        .map_err(|e| anyhow!("failed to encode {method} request: {e}"))?;
    let result = call_method(provider, "request", &[&request])
        .await
        .with_context(|| format!("{method} failed"))?;
    if result.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(result).map_err(|e| anyhow!("failed to decode {method} response: {e}"))
}

fn rpc_error(err: JsValue) -> anyhow::Error {
    let code = get_prop(&err, "code").and_then(|c| c.as_f64());
    match code {
        Some(code) => anyhow!(WalletError::from_rpc(code as i64, &describe(&err))),
        None => anyhow!("{}", describe(&err)),
    }
}
