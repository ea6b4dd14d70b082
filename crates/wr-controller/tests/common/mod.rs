#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use wr_api_types::{ConnectionState, ConnectorInfo, ConnectorKind, WalletAddress};
use wr_controller::{Controller, ControllerConfig, LocalTask, Runtime};
use wr_host_bridge::testing::RecordingBridge;
use wr_wallet_client::{WalletClient, WalletError};

pub const SCENARIO_ADDRESS: &str = "0xABCDEF1234567890abcdef1234567890ABCDEF12";

/// Wallet double with scripted signature results.
#[derive(Clone, Default)]
pub struct ScriptedWallet {
    inner: Rc<WalletInner>,
}

#[derive(Default)]
struct WalletInner {
    state: RefCell<ConnectionState>,
    signatures: RefCell<VecDeque<Result<String, WalletError>>>,
    signed_messages: RefCell<Vec<String>>,
    sign_latency: RefCell<Option<Duration>>,
}

impl ScriptedWallet {
    pub fn connected(address: &str, chain_id: u64) -> Self {
        let wallet = Self::default();
        wallet.set_state(ConnectionState::connected(address, chain_id));
        wallet
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.inner.state.borrow_mut() = state;
    }

    pub fn push_signature(&self, result: Result<&str, WalletError>) {
        self.inner
            .signatures
            .borrow_mut()
            .push_back(result.map(str::to_owned));
    }

    /// Keeps the signature request pending for `latency` of tokio time.
    pub fn set_sign_latency(&self, latency: Duration) {
        *self.inner.sign_latency.borrow_mut() = Some(latency);
    }

    pub fn signed_messages(&self) -> Vec<String> {
        self.inner.signed_messages.borrow().clone()
    }
}

#[async_trait(?Send)]
impl WalletClient for ScriptedWallet {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        ConnectorKind::ALL
            .into_iter()
            .map(|kind| ConnectorInfo {
                kind,
                available: true,
            })
            .collect()
    }

    fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    async fn connect(&self, connector: ConnectorKind) -> Result<ConnectionState> {
        let mut state = ConnectionState::connected(SCENARIO_ADDRESS, 1);
        state.connector = Some(connector);
        self.set_state(state.clone());
        Ok(state)
    }

    async fn disconnect(&self) -> Result<()> {
        self.set_state(ConnectionState::disconnected());
        Ok(())
    }

    async fn sign_message(&self, _address: &WalletAddress, message: &str) -> Result<String> {
        self.inner.signed_messages.borrow_mut().push(message.to_owned());
        let latency = *self.inner.sign_latency.borrow();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.inner.signatures.borrow_mut().pop_front();
        match next {
            Some(Ok(signature)) => Ok(signature),
            Some(Err(err)) => Err(anyhow!(err)),
            None => Ok("0xsig...".to_owned()),
        }
    }
}

/// Collects spawned tasks so a test decides when they run.
#[derive(Clone, Default)]
pub struct QueueRuntime {
    tasks: Rc<RefCell<Vec<LocalTask>>>,
}

impl QueueRuntime {
    pub fn take(&self) -> Vec<LocalTask> {
        self.tasks.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub async fn run_all(&self) {
        for task in self.take() {
            task.await;
        }
    }
}

impl Runtime for QueueRuntime {
    fn spawn(&self, task: LocalTask) {
        self.tasks.borrow_mut().push(task);
    }

    fn sleep(&self, duration: Duration) -> LocalTask {
        Box::pin(tokio::time::sleep(duration))
    }
}

pub type TestController = Controller<RecordingBridge, ScriptedWallet, QueueRuntime>;

pub struct Harness {
    pub controller: Rc<TestController>,
    pub wallet: ScriptedWallet,
    pub runtime: QueueRuntime,
}

impl Harness {
    pub fn new(bridge: RecordingBridge, wallet: ScriptedWallet, config: ControllerConfig) -> Self {
        let runtime = QueueRuntime::default();
        let controller = Controller::new(bridge, wallet.clone(), runtime.clone(), config);
        Self {
            controller,
            wallet,
            runtime,
        }
    }

    /// Ready controller with a connected scenario wallet.
    pub fn connected() -> Self {
        let harness = Self::new(
            RecordingBridge::new(),
            ScriptedWallet::connected(SCENARIO_ADDRESS, 1),
            ControllerConfig::default(),
        );
        harness.controller.init();
        harness
    }

    pub fn bridge(&self) -> &RecordingBridge {
        self.controller.bridge()
    }
}
