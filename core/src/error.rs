use alloy::transports::{RpcError as AlloyRpcError, TransportErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::TransportKind;

#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorKind {
    /// Server returned an error response.
    #[error("server returned an error response: code {code}: {message}")]
    ErrorResp {
        code: i64,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },

    /// Server returned a null response when a non-null response was expected.
    #[error("server returned a null response when a non-null response was expected")]
    NullResp,

    /// JSON serialization error.
    #[error("serialization error: {message}")]
    SerError { message: String },

    /// JSON deserialization error.
    #[error("deserialization error: {message}")]
    DeserError { message: String },

    #[error("HTTP error {status}")]
    TransportHttpError { status: u16, body: String },

    #[error("Other transport error: {message}")]
    OtherTransportError { message: String },
}

impl RpcErrorKind {
    /// Transient errors worth another poll cycle. -32005 is the common
    /// rate-limit code, -32603 an internal node error.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcErrorKind::OtherTransportError { .. } | RpcErrorKind::TransportHttpError { .. } => {
                true
            }
            RpcErrorKind::ErrorResp { code, .. } => matches!(code, -32005 | -32603),
            _ => false,
        }
    }
}

#[derive(Error, Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum OrchestratorError {
    /// The human declined an authorization or signature prompt. Recoverable,
    /// never retried automatically.
    ///
    /// The resolver and submitter report rejection as an ordinary outcome,
    /// not as this error; the variant exists for embedders that need a
    /// rejection in error form, e.g. to feed the
    /// [`UserStatus`](crate::status::UserStatus) mapping.
    #[error("User rejected the request: {message}")]
    UserRejected { message: String },

    /// No usable wallet transport could be found in the current environment.
    #[error("No wallet transport available ({environment}): {message}")]
    TransportUnavailable {
        environment: String,
        message: String,
    },

    /// The signer is bound to an unexpected chain and auto-switch failed.
    /// Submission must be refused rather than attempted against the wrong
    /// chain.
    #[error("Wrong network: expected chain {expected}, wallet is on {actual:?}")]
    WrongNetwork { expected: u64, actual: Option<u64> },

    /// A transport accepted the call but errored before returning a handle.
    #[error("Submission failed via {transport}: {message}")]
    SubmissionFailed {
        transport: TransportKind,
        message: String,
    },

    /// Transaction was mined but the contract logic rejected it.
    #[error("Transaction reverted: {message}")]
    Reverted {
        #[serde(skip_serializing_if = "Option::is_none")]
        transaction_hash: Option<String>,
        message: String,
    },

    #[error("RPC error on chain {chain_id}: {message}")]
    RpcError {
        chain_id: u64,
        message: String,
        kind: RpcErrorKind,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl OrchestratorError {
    pub fn internal(message: impl Into<String>) -> Self {
        OrchestratorError::InternalError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        OrchestratorError::ValidationError {
            message: message.into(),
        }
    }
}

/// Transport error messages can be arbitrarily long (some wallets embed full
/// stack traces). Bound them before they reach a status line.
pub fn truncate_for_display(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let truncated: String = message.chars().take(max_chars).collect();
    format!("{truncated}…")
}

pub trait AlloyRpcErrorToOrchestratorError {
    fn to_orchestrator_error(&self, chain_id: u64) -> OrchestratorError;
}

impl AlloyRpcErrorToOrchestratorError for AlloyRpcError<TransportErrorKind> {
    fn to_orchestrator_error(&self, chain_id: u64) -> OrchestratorError {
        OrchestratorError::RpcError {
            chain_id,
            message: self.to_string(),
            kind: to_rpc_error_kind(self),
        }
    }
}

fn to_rpc_error_kind(err: &AlloyRpcError<TransportErrorKind>) -> RpcErrorKind {
    match err {
        AlloyRpcError::ErrorResp(err) => RpcErrorKind::ErrorResp {
            code: err.code,
            message: err.message.to_string(),
            data: err.data.as_ref().map(|data| data.to_string()),
        },
        AlloyRpcError::NullResp => RpcErrorKind::NullResp,
        AlloyRpcError::SerError(err) => RpcErrorKind::SerError {
            message: err.to_string(),
        },
        AlloyRpcError::DeserError { err, .. } => RpcErrorKind::DeserError {
            message: err.to_string(),
        },
        AlloyRpcError::Transport(err) => match err {
            TransportErrorKind::HttpError(err) => RpcErrorKind::TransportHttpError {
                status: err.status,
                body: err.body.to_string(),
            },
            other => RpcErrorKind::OtherTransportError {
                message: other.to_string(),
            },
        },
        other => RpcErrorKind::OtherTransportError {
            message: other.to_string(),
        },
    }
}
