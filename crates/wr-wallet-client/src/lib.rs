use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use wr_api_types::{ChainId, ConnectionState, ConnectorInfo, ConnectorKind, WalletAddress};

/// EIP-1193 `userRejectedRequest`.
pub const USER_REJECTED: i64 = 4001;
/// EIP-1193 `unauthorized`.
pub const UNAUTHORIZED: i64 = 4100;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet is connected")]
    NotConnected,
    #[error("connector {0} is not available in this browser")]
    Unavailable(&'static str),
    #[error("request rejected by the user")]
    Rejected,
    #[error("wallet provider error {code}: {message}")]
    Provider { code: i64, message: String },
}

impl WalletError {
    /// Classifies an EIP-1193 error object.
    pub fn from_rpc(code: i64, message: &str) -> Self {
        match code {
            USER_REJECTED => WalletError::Rejected,
            UNAUTHORIZED => WalletError::NotConnected,
            _ => WalletError::Provider {
                code,
                message: message.to_owned(),
            },
        }
    }
}

/// Wallet-connection contract consumed by the controller.
///
/// Single-threaded: implementations live in the browser and hold JS handles.
#[async_trait(?Send)]
pub trait WalletClient {
    fn connectors(&self) -> Vec<ConnectorInfo>;
    fn state(&self) -> ConnectionState;
    async fn connect(&self, connector: ConnectorKind) -> Result<ConnectionState>;
    async fn disconnect(&self) -> Result<()>;
    async fn sign_message(&self, address: &WalletAddress, message: &str) -> Result<String>;
}

#[derive(Debug, Default, Clone)]
pub struct ConnectorRegistry {
    connectors: BTreeMap<u8, ConnectorInfo>,
}

impl ConnectorRegistry {
    pub fn register(&mut self, kind: ConnectorKind, available: bool) {
        self.connectors
            .insert(order(kind), ConnectorInfo { kind, available });
    }

    pub fn connector(&self, kind: ConnectorKind) -> Option<&ConnectorInfo> {
        self.connectors.get(&order(kind))
    }

    pub fn is_available(&self, kind: ConnectorKind) -> bool {
        self.connector(kind).is_some_and(|c| c.available)
    }

    /// Connectors in display order.
    pub fn list(&self) -> Vec<ConnectorInfo> {
        self.connectors.values().cloned().collect()
    }
}

fn order(kind: ConnectorKind) -> u8 {
    match kind {
        ConnectorKind::MetaMask => 0,
        ConnectorKind::Injected => 1,
        ConnectorKind::CoinbaseWallet => 2,
        ConnectorKind::WalletConnect => 3,
    }
}

/// Human-readable text the wallet signs to prove control of `address`.
pub fn attestation_message(address: &WalletAddress, chain_id: ChainId) -> String {
    format!(
        "Confirm wallet ownership for the Telegram mini app.\n\nAddress: {}\nChain ID: {}",
        address, chain_id
    )
}

/// `personal_sign` params: hex-encoded UTF-8 message, then the signer.
pub fn personal_sign_params(address: &WalletAddress, message: &str) -> serde_json::Value {
    serde_json::json!([format!("0x{}", to_hex(message.as_bytes())), address.as_str()])
}

pub fn to_hex(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
