use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAINNET: ChainId = ChainId(1);
pub const SEPOLIA: ChainId = ChainId(11_155_111);

/// Chains the mini app is configured for, in display order.
pub const KNOWN_CHAINS: &[(ChainId, &str)] = &[(MAINNET, "Ethereum"), (SEPOLIA, "Sepolia")];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `0x1234...abcd` form used in the connected summary.
    pub fn short(&self) -> String {
        let addr = self.0.as_str();
        if addr.len() <= 10 || !addr.is_ascii() {
            return addr.to_owned();
        }
        format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn name(&self) -> Option<&'static str> {
        KNOWN_CHAINS
            .iter()
            .find(|(id, _)| id == self)
            .map(|(_, name)| *name)
    }

    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_owned(),
            None => format!("chain {}", self.0),
        }
    }

    /// Parses either a decimal id or an EIP-1193 `0x`-prefixed hex id.
    pub fn parse(raw: &str) -> Option<ChainId> {
        let raw = raw.trim();
        if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16).ok().map(ChainId)
        } else {
            raw.parse().ok().map(ChainId)
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    MetaMask,
    Injected,
    CoinbaseWallet,
    WalletConnect,
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 4] = [
        ConnectorKind::MetaMask,
        ConnectorKind::Injected,
        ConnectorKind::CoinbaseWallet,
        ConnectorKind::WalletConnect,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConnectorKind::MetaMask => "MetaMask",
            ConnectorKind::Injected => "Injected",
            ConnectorKind::CoinbaseWallet => "Coinbase Wallet",
            ConnectorKind::WalletConnect => "WalletConnect",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ConnectorKind::MetaMask | ConnectorKind::Injected => "🦊",
            ConnectorKind::CoinbaseWallet => "💰",
            ConnectorKind::WalletConnect => "🔗",
        }
    }

    pub fn uid(&self) -> &'static str {
        match self {
            ConnectorKind::MetaMask => "metamask",
            ConnectorKind::Injected => "injected",
            ConnectorKind::CoinbaseWallet => "coinbase",
            ConnectorKind::WalletConnect => "walletconnect",
        }
    }

    pub fn from_uid(uid: &str) -> Option<ConnectorKind> {
        Self::ALL.into_iter().find(|k| k.uid() == uid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub kind: ConnectorKind,
    pub available: bool,
}

/// Wallet connection snapshot. Owned by the wallet client, read by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub address: Option<WalletAddress>,
    pub is_connected: bool,
    pub chain_id: ChainId,
    pub connector: Option<ConnectorKind>,
}

impl ConnectionState {
    pub fn connected(address: &str, chain_id: u64) -> Self {
        Self {
            address: Some(WalletAddress(address.to_owned())),
            is_connected: true,
            chain_id: ChainId(chain_id),
            connector: None,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// The main button is offered only for a connected, non-empty address.
    pub fn can_confirm(&self) -> bool {
        self.is_connected && self.address.as_ref().is_some_and(|a| !a.is_empty())
    }
}

/// Outbound payload variants. Chosen at build time, see `ControllerConfig`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSchema {
    #[default]
    Signed,
    Unsigned,
    Legacy,
}

impl PayloadSchema {
    pub fn requires_signature(&self) -> bool {
        matches!(self, PayloadSchema::Signed)
    }
}

impl FromStr for PayloadSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" => Ok(PayloadSchema::Signed),
            "unsigned" => Ok(PayloadSchema::Unsigned),
            "legacy" => Ok(PayloadSchema::Legacy),
            other => Err(format!("unknown payload schema: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationPayload {
    pub address: String,
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ConfirmationPayload {
    pub fn new(address: &WalletAddress, chain_id: ChainId, signature: Option<String>) -> Self {
        Self {
            address: address.0.clone(),
            chain_id: chain_id.to_string(),
            signature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
}

impl LegacyPayload {
    pub fn wallet_connected(address: &WalletAddress) -> Self {
        Self {
            kind: "wallet_connected".to_owned(),
            address: address.0.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeParams {
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub hint_color: Option<String>,
    #[serde(default)]
    pub link_color: Option<String>,
    #[serde(default)]
    pub button_color: Option<String>,
    #[serde(default)]
    pub button_text_color: Option<String>,
    #[serde(default)]
    pub secondary_bg_color: Option<String>,
}

impl ThemeParams {
    /// CSS custom properties for every color the host supplied.
    pub fn css_vars(&self) -> Vec<(&'static str, &str)> {
        [
            ("--tg-bg-color", &self.bg_color),
            ("--tg-text-color", &self.text_color),
            ("--tg-hint-color", &self.hint_color),
            ("--tg-link-color", &self.link_color),
            ("--tg-button-color", &self.button_color),
            ("--tg-button-text-color", &self.button_text_color),
            ("--tg-secondary-bg-color", &self.secondary_bg_color),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitDataUnsafe {
    #[serde(default)]
    pub user: Option<WebAppUser>,
    #[serde(default)]
    pub auth_date: Option<i64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub query_id: Option<String>,
}

/// Read-only context supplied by the host. Cosmetic use only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    pub platform: String,
    pub init_data: String,
    pub init_data_unsafe: InitDataUnsafe,
    pub is_expanded: bool,
    pub theme_params: Option<ThemeParams>,
}
