use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::constants::MIN_STATUS_DISPLAY;
use crate::error::OrchestratorError;
use crate::transaction::ConfirmationResult;

/// Every terminal outcome a user action can reach, each with its own
/// human-readable message. The distinctions matter: a revert is not a
/// timeout, and a cancellation is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserStatus {
    Confirmed,
    Reverted,
    Unknown,
    Canceled,
    WalletUnavailable,
    WrongNetwork,
    SubmissionFailed,
}

impl UserStatus {
    pub fn message(&self) -> &'static str {
        match self {
            UserStatus::Confirmed => "Transaction confirmed",
            UserStatus::Reverted => "Transaction was mined but failed on-chain",
            UserStatus::Unknown => {
                "Could not confirm the transaction in time — check your wallet or a block explorer"
            }
            UserStatus::Canceled => "Transaction canceled",
            UserStatus::WalletUnavailable => "No wallet found — install or enable a wallet to continue",
            UserStatus::WrongNetwork => "Wallet is on the wrong network — switch and try again",
            UserStatus::SubmissionFailed => "Transaction could not be submitted",
        }
    }
}

impl From<&ConfirmationResult> for UserStatus {
    fn from(result: &ConfirmationResult) -> Self {
        match result {
            ConfirmationResult::Confirmed { .. } => UserStatus::Confirmed,
            ConfirmationResult::Reverted { .. } => UserStatus::Reverted,
            ConfirmationResult::Unknown { .. } => UserStatus::Unknown,
        }
    }
}

impl From<&OrchestratorError> for UserStatus {
    fn from(error: &OrchestratorError) -> Self {
        match error {
            OrchestratorError::UserRejected { .. } => UserStatus::Canceled,
            OrchestratorError::TransportUnavailable { .. } => UserStatus::WalletUnavailable,
            OrchestratorError::WrongNetwork { .. } => UserStatus::WrongNetwork,
            OrchestratorError::Reverted { .. } => UserStatus::Reverted,
            _ => UserStatus::SubmissionFailed,
        }
    }
}

/// A status the user has been shown. Statuses are never cleared silently:
/// [`StatusLine::clearable`] gates removal on a minimum display duration.
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub status: UserStatus,
    pub detail: Option<String>,
    shown_at: Instant,
}

impl StatusLine {
    pub fn new(status: UserStatus) -> Self {
        Self {
            status,
            detail: None,
            shown_at: Instant::now(),
        }
    }

    pub fn with_detail(status: UserStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
            shown_at: Instant::now(),
        }
    }

    pub fn clearable(&self) -> bool {
        self.shown_at.elapsed() >= MIN_STATUS_DISPLAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_terminal_status_is_distinct() {
        let all = [
            UserStatus::Confirmed,
            UserStatus::Reverted,
            UserStatus::Unknown,
            UserStatus::Canceled,
            UserStatus::WalletUnavailable,
            UserStatus::WrongNetwork,
            UserStatus::SubmissionFailed,
        ];
        let messages: HashSet<&str> = all.iter().map(|s| s.message()).collect();
        assert_eq!(messages.len(), all.len());
    }

    #[test]
    fn embedder_mapped_rejection_reads_as_canceled() {
        let rejection = OrchestratorError::UserRejected {
            message: "User rejected the request.".to_string(),
        };
        assert_eq!(UserStatus::from(&rejection), UserStatus::Canceled);
    }

    #[test]
    fn fresh_status_is_not_clearable() {
        let line = StatusLine::new(UserStatus::Confirmed);
        assert!(!line.clearable());
    }
}
