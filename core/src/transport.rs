use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::chain::ChainDescriptor;
use crate::error::OrchestratorError;

/// Which flavor of wallet backend a session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Wallet injected by a sandboxed mini-app host (e.g. inside a social
    /// app). These hosts intentionally do not expose browser-extension
    /// wallets.
    EmbeddedMiniapp,
    /// Wallet injected into the page by a browser extension.
    BrowserExtension,
    /// Wallet selected through a connection-modal flow, reachable both via a
    /// higher-level wallet client and via its raw injected provider.
    ConnectorModal,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportKind::EmbeddedMiniapp => "embedded-miniapp",
            TransportKind::BrowserExtension => "browser-extension",
            TransportKind::ConnectorModal => "connector-modal",
        };
        f.write_str(s)
    }
}

/// EIP-1193 user rejection code.
const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193 unauthorized code. Some wallets use it for declined prompts.
const CODE_UNAUTHORIZED: i64 = 4100;
/// `wallet_switchEthereumChain` code for a chain the wallet does not know.
const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Error reported by a wallet transport or wallet client.
///
/// Wallets are inconsistent about error reporting: well-behaved ones return
/// EIP-1193 codes, others only a free-form message. Classification prefers
/// the structured code and falls back to substring matching as a last-resort
/// heuristic (a known precision gap, not something we can fix from this
/// side).
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("transport error{}: {message}", .code.map(|c| format!(" (code {c})")).unwrap_or_default())]
pub struct TransportError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    pub message: String,
}

impl TransportError {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(Some(CODE_USER_REJECTED), message)
    }

    pub fn is_user_rejection(&self) -> bool {
        if matches!(self.code, Some(CODE_USER_REJECTED) | Some(CODE_UNAUTHORIZED)) {
            return true;
        }
        let lowered = self.message.to_lowercase();
        ["rejected", "denied", "declined", "cancelled", "canceled"]
            .iter()
            .any(|needle| lowered.contains(needle))
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(CODE_UNRECOGNIZED_CHAIN)
            || self.message.to_lowercase().contains("unrecognized chain")
    }
}

/// The lowest-common-denominator transaction shape every transport accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    /// Always `0x`-prefixed hex when present. Use [`normalize_gas`] before
    /// constructing a request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
}

/// Callers may supply a gas limit as a decimal string or as already-prefixed
/// hex; transports only accept `0x`-prefixed hex.
pub fn normalize_gas(gas: &str) -> Result<String, OrchestratorError> {
    let trimmed = gas.trim();
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(format!("0x{}", hex.to_lowercase()));
        }
        return Err(OrchestratorError::validation(format!(
            "invalid hex gas limit: {gas}"
        )));
    }
    let parsed: u64 = trimmed.parse().map_err(|_| {
        OrchestratorError::validation(format!("invalid decimal gas limit: {gas}"))
    })?;
    Ok(format!("{parsed:#x}"))
}

/// Abstraction over however a specific wallet accepts commands and returns
/// results. Implemented by the embedding application for each environment it
/// runs in; the orchestrator never assumes more than this surface.
#[async_trait::async_trait]
pub trait WalletTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Request account authorization. Idempotent: if already authorized this
    /// is a no-op confirmation returning the same accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>, TransportError>;

    /// The currently-authorized accounts, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, TransportError>;

    /// The chain the wallet is currently bound to.
    async fn chain_id(&self) -> Result<u64, TransportError>;

    /// Submit a transaction through the wallet's rawest primitive.
    ///
    /// Returns `None` when the transport accepted the request but does not
    /// report a hash synchronously (some embedded hosts behave this way);
    /// the caller must then fall back to event-log recovery for
    /// confirmation.
    async fn send_transaction(&self, tx: RawTxRequest) -> Result<Option<B256>, TransportError>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), TransportError>;

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), TransportError>;
}

/// Structured call shape for the higher-level wallet-client abstraction that
/// connection-modal flows hand back. The account and chain binding is always
/// explicit: ambient defaults are unreliable across wallet implementations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub account: Address,
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
}

#[async_trait::async_trait]
pub trait WalletClient: Send + Sync {
    async fn send_transaction(&self, tx: ClientTxRequest) -> Result<B256, TransportError>;
}
