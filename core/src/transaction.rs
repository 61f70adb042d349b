use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::chain::TxReceipt;
use crate::transport::TransportKind;

/// One contract invocation as the caller describes it: target, opaque
/// calldata, and optional overrides. Calldata encoding happens upstream;
/// this layer never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCall {
    pub to: Address,

    #[serde(default)]
    pub data: Bytes,

    #[serde(default)]
    pub value: U256,

    /// Decimal string or `0x`-prefixed hex; normalized before it reaches a
    /// transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,

    /// Explicit sender override. Needed when a backend-issued signature is
    /// bound to a specific address: a mismatch with the active session must
    /// hard-fail rather than silently submit from a different account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
}

impl ContractCall {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            value: U256::ZERO,
            gas_limit: None,
            from: None,
        }
    }
}

/// Receipt for "a transaction was submitted", separate from confirmation.
/// Immutable once returned; consumed exactly once by the confirmation
/// waiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHandle {
    /// Logical id, carried through tracing so one user action can be
    /// followed across submission and confirmation.
    pub id: String,

    /// Absent (or all-zero) when the transport did not report a hash
    /// synchronously. Such handles are still waitable via log recovery.
    pub hash: Option<B256>,

    pub submitted_via: TransportKind,

    /// Unix timestamp (seconds) at the moment the transport accepted the
    /// request.
    pub submitted_at: i64,

    pub from: Address,
    pub to: Address,

    /// Block height observed immediately before submission; anchors the
    /// bounded log-recovery window. `None` when the height read failed, in
    /// which case recovery anchors its window at confirmation time instead.
    pub anchor_block: Option<u64>,
}

impl TransactionHandle {
    /// The hash, filtered for the all-zero placeholder some embedded hosts
    /// return instead of omitting the field.
    pub fn usable_hash(&self) -> Option<B256> {
        self.hash.filter(|h| !h.is_zero())
    }
}

/// Resolved outcome of a [`TransactionHandle`]. Exactly one is produced per
/// handle; terminal states are not re-enterable. Retrying the underlying
/// action requires a new handle from a new submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationResult {
    /// Mined with success status.
    Confirmed { receipt: TxReceipt },
    /// Mined, but the contract logic rejected it. Distinct from any
    /// network or connectivity failure.
    Reverted { receipt: TxReceipt },
    /// The polling budget was exhausted without a definitive answer. Never
    /// silent success, never silent failure: the user must be pointed at
    /// their wallet or an explorer.
    Unknown { reason: String },
}

impl ConfirmationResult {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationResult::Confirmed { .. })
    }
}
