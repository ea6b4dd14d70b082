use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};
use wr_api_types::{
    ChainId, ConfirmationPayload, ConnectionState, ConnectorKind, LegacyPayload, PayloadSchema,
    WalletAddress,
};
use wr_host_bridge::{BridgeError, BridgeResult, ClickHandler, HostBridge, MainButton};
use wr_wallet_client::{WalletClient, attestation_message};

use crate::config::ControllerConfig;
use crate::runtime::Runtime;

/// How a single confirm attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Another confirmation was already in flight.
    Skipped,
    /// No connected address to confirm.
    NotConnected,
    SignatureFailed,
    SendFailed,
    /// Payload delivered and the view asked to close.
    Completed,
}

pub struct Controller<B, W, R> {
    bridge: B,
    wallet: W,
    runtime: R,
    config: ControllerConfig,
    ready: Cell<bool>,
    processing: Cell<bool>,
    // Bumped on every confirm start; stale restore timers compare against it.
    attempt: Cell<u64>,
    bound: RefCell<Option<ClickHandler>>,
    snapshot: RefCell<ConnectionState>,
    this: Weak<Self>,
}

impl<B, W, R> Controller<B, W, R>
where
    B: HostBridge + 'static,
    W: WalletClient + 'static,
    R: Runtime + 'static,
{
    pub fn new(bridge: B, wallet: W, runtime: R, config: ControllerConfig) -> Rc<Self> {
        let snapshot = wallet.state();
        Rc::new_cyclic(|this| Self {
            bridge,
            wallet,
            runtime,
            config,
            ready: Cell::new(false),
            processing: Cell::new(false),
            attempt: Cell::new(0),
            bound: RefCell::new(None),
            snapshot: RefCell::new(snapshot),
            this: this.clone(),
        })
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.get()
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.snapshot.borrow().clone()
    }

    /// Signals the host that the app is ready and asks for full height.
    ///
    /// Without a host the controller stays inert; the view still works.
    pub fn init(&self) -> bool {
        let result = self.bridge.ready().and_then(|()| self.bridge.expand());
        match result {
            Ok(()) => {
                self.ready.set(true);
                info!("host bridge ready");
                self.apply();
            }
            Err(err) => {
                error!(%err, "host bridge init failed; main button disabled");
            }
        }
        self.ready.get()
    }

    /// Records a new connection snapshot and rebinds the main button to it.
    pub fn sync(&self, state: ConnectionState) {
        *self.snapshot.borrow_mut() = state;
        self.apply();
    }

    pub async fn connect(&self, connector: ConnectorKind) -> Result<ConnectionState> {
        let result = self.wallet.connect(connector).await;
        match &result {
            Ok(state) => info!(connector = connector.name(), address = ?state.address, "wallet connected"),
            Err(err) => warn!(connector = connector.name(), "wallet connect failed: {err:#}"),
        }
        self.sync(self.wallet.state());
        result
    }

    pub async fn disconnect(&self) -> ConnectionState {
        if let Err(err) = self.wallet.disconnect().await {
            warn!("wallet disconnect failed: {err:#}");
        } else {
            info!("wallet disconnected");
        }
        let state = self.wallet.state();
        self.sync(state.clone());
        state
    }

    /// Unbinds the current handler and hides the button.
    pub fn teardown(&self) {
        self.unbind();
        if self.ready.get() {
            self.guard("hide", self.bridge.main_button().hide());
        }
    }

    /// Runs the confirm sequence once. Re-entrant calls while one is in
    /// flight return [`ConfirmOutcome::Skipped`] without side effects.
    pub async fn confirm(&self) -> ConfirmOutcome {
        if self.processing.get() {
            debug!("confirmation already in flight");
            return ConfirmOutcome::Skipped;
        }

        let state = self.snapshot();
        let address = match state.address.clone() {
            Some(address) if state.can_confirm() => address,
            _ => return ConfirmOutcome::NotConnected,
        };

        let captions = &self.config.captions;
        let button = self.bridge.main_button();
        self.processing.set(true);
        let attempt = self.attempt.get().wrapping_add(1);
        self.attempt.set(attempt);
        self.guard("setText", button.set_text(&captions.processing));
        self.guard("disable", button.disable());

        let signature = if self.config.schema.requires_signature() {
            let message = attestation_message(&address, state.chain_id);
            match self.wallet.sign_message(&address, &message).await {
                Ok(signature) => Some(signature),
                Err(err) => {
                    warn!("signature request failed: {err:#}");
                    self.guard("setText", button.set_text(&captions.signature_failed));
                    self.finish_failed(&captions.signature_failed);
                    self.runtime.sleep(self.config.restore_delay).await;
                    let current = self.attempt.get() == attempt;
                    if current && !self.processing.get() && self.bound.borrow().is_some() {
                        self.guard("setText", button.set_text(&captions.confirm));
                    }
                    return ConfirmOutcome::SignatureFailed;
                }
            }
        } else {
            None
        };

        self.guard("setText", button.set_text(&captions.sending));
        let sent = self
            .encode(&address, state.chain_id, signature)
            .and_then(|data| self.bridge.send_data(&data));

        if let Err(err) = sent {
            error!(%err, "failed to send confirmation to host");
            self.guard("setText", button.set_text(&captions.send_failed));
            self.finish_failed(&captions.send_failed);
            return ConfirmOutcome::SendFailed;
        }

        info!(address = %address, chain_id = %state.chain_id, "confirmation sent");
        self.guard("setText", button.set_text(&captions.completed));
        self.runtime.sleep(self.config.close_delay).await;
        if let Err(err) = self.bridge.close() {
            error!(%err, "host close failed");
        }
        ConfirmOutcome::Completed
    }

    fn apply(&self) {
        if !self.ready.get() {
            return;
        }

        let can_confirm = self.snapshot.borrow().can_confirm();
        if self.processing.get() {
            // The in-flight routine owns the button unless the wallet went away.
            if !can_confirm {
                self.teardown();
            }
            return;
        }

        self.unbind();
        let button = self.bridge.main_button();
        if can_confirm {
            self.guard("setText", button.set_text(&self.config.captions.confirm));
            self.guard("enable", button.enable());
            self.guard("show", button.show());
            self.bind();
        } else {
            self.guard("hide", button.hide());
        }
    }

    fn bind(&self) {
        let handler = self.click_handler();
        if self.guard("onClick", self.bridge.main_button().on_click(&handler)) {
            debug!(handler = %handler.id(), "main button handler bound");
            *self.bound.borrow_mut() = Some(handler);
        }
    }

    fn unbind(&self) {
        let Some(handler) = self.bound.borrow_mut().take() else {
            return;
        };
        self.guard("offClick", self.bridge.main_button().off_click(&handler));
        debug!(handler = %handler.id(), "main button handler unbound");
    }

    fn click_handler(&self) -> ClickHandler {
        let this = self.this.clone();
        ClickHandler::new(move || {
            let Some(controller) = this.upgrade() else {
                return;
            };
            let task = {
                let controller = controller.clone();
                Box::pin(async move {
                    controller.confirm().await;
                })
            };
            controller.runtime.spawn(task);
        })
    }

    /// Releases the processing lock after a failed attempt.
    ///
    /// A handler still bound means the button was never torn down, so it only
    /// needs re-enabling. Otherwise the wallet changed mid-flight and the
    /// button is rebuilt from the current snapshot, keeping `caption` on it.
    fn finish_failed(&self, caption: &str) {
        self.processing.set(false);
        let button = self.bridge.main_button();
        if self.bound.borrow().is_some() && self.snapshot.borrow().can_confirm() {
            self.guard("enable", button.enable());
            return;
        }

        self.apply();
        if self.bound.borrow().is_some() {
            self.guard("setText", button.set_text(caption));
        }
    }

    fn encode(
        &self,
        address: &WalletAddress,
        chain_id: ChainId,
        signature: Option<String>,
    ) -> Result<String, BridgeError> {
        let encoded = match self.config.schema {
            PayloadSchema::Signed | PayloadSchema::Unsigned => {
                serde_json::to_string(&ConfirmationPayload::new(address, chain_id, signature))
            }
            PayloadSchema::Legacy => serde_json::to_string(&LegacyPayload::wallet_connected(address)),
        };
        encoded.map_err(|err| BridgeError::Encode(err.to_string()))
    }

    fn guard(&self, op: &str, result: BridgeResult) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "main button {op} failed");
                false
            }
        }
    }
}
