use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use walletflow_core::{
    chain::{ChainRead, LogEntry, LogQuery, TxReceipt},
    constants,
    transaction::{ConfirmationResult, TransactionHandle},
};

use crate::poll::{PollBudget, poll_until};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmationConfig {
    pub poll_interval_ms: u64,
    pub max_receipt_attempts: u32,
    pub max_log_scan_attempts: u32,
    /// Widest block window a recovery scan may cover past the handle's
    /// anchor block. Scans are never unbounded.
    pub log_scan_window: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_receipt_attempts: constants::DEFAULT_MAX_RECEIPT_ATTEMPTS,
            max_log_scan_attempts: constants::DEFAULT_MAX_LOG_SCAN_ATTEMPTS,
            log_scan_window: constants::DEFAULT_LOG_SCAN_WINDOW,
        }
    }
}

impl ConfirmationConfig {
    fn receipt_budget(&self) -> PollBudget {
        PollBudget::new(
            Duration::from_millis(self.poll_interval_ms),
            self.max_receipt_attempts,
        )
    }

    fn log_scan_budget(&self) -> PollBudget {
        PollBudget::new(
            Duration::from_millis(self.poll_interval_ms),
            self.max_log_scan_attempts,
        )
    }
}

/// Durably resolves submitted handles to exactly one terminal outcome:
/// `Submitted → Polling → {Confirmed | Reverted | Unknown}`. Ordinary
/// polling misses are not errors, and every wait is bounded by the
/// configured budget.
pub struct ConfirmationWaiter<C: ChainRead> {
    chain: Arc<C>,
    config: ConfirmationConfig,
    /// Transaction hashes already matched by a recovery scan. A retried
    /// scan must not double-count the same event.
    consumed: StdMutex<HashSet<B256>>,
}

impl<C: ChainRead> ConfirmationWaiter<C> {
    pub fn new(chain: Arc<C>, config: ConfirmationConfig) -> Self {
        Self {
            chain,
            config,
            consumed: StdMutex::new(HashSet::new()),
        }
    }

    /// Wait for the handle's outcome. Consumes the handle: a caller who
    /// wants to retry the underlying action needs a brand-new handle from a
    /// new submission.
    ///
    /// `recovery_event` is the event signature (topic0) the target contract
    /// is expected to emit; it is required for handles with no usable hash,
    /// where confirmation falls back to event-log scanning.
    pub async fn wait_for_tx(
        &self,
        handle: TransactionHandle,
        recovery_event: Option<B256>,
    ) -> ConfirmationResult {
        if let Some(hash) = handle.usable_hash() {
            return self.poll_receipt(&handle, hash).await;
        }

        match recovery_event {
            Some(event_signature) => self.recover_from_logs(&handle, event_signature).await,
            None => {
                tracing::warn!(
                    transaction_id = %handle.id,
                    "handle has no hash and no recovery event was provided"
                );
                ConfirmationResult::Unknown {
                    reason: "transport returned no transaction hash and no recovery event \
                             signature was provided"
                        .to_string(),
                }
            }
        }
    }

    async fn poll_receipt(&self, handle: &TransactionHandle, hash: B256) -> ConfirmationResult {
        let outcome = poll_until(self.config.receipt_budget(), |attempt| {
            let chain = self.chain.clone();
            async move {
                match chain.receipt(hash).await {
                    Ok(Some(receipt)) => Some(receipt),
                    Ok(None) => {
                        tracing::debug!(%hash, attempt, "receipt not yet available");
                        None
                    }
                    // Transient lookup failures are swallowed and retried;
                    // only budget exhaustion is terminal.
                    Err(error) => {
                        tracing::debug!(%hash, attempt, %error, "receipt lookup failed, retrying");
                        None
                    }
                }
            }
        })
        .await;

        match outcome {
            Some(receipt) => self.classify(handle, receipt),
            None => {
                tracing::warn!(
                    transaction_id = %handle.id,
                    %hash,
                    attempts = self.config.max_receipt_attempts,
                    "confirmation budget exhausted"
                );
                ConfirmationResult::Unknown {
                    reason: format!(
                        "no receipt for {hash} after {} attempts",
                        self.config.max_receipt_attempts
                    ),
                }
            }
        }
    }

    /// Recovery for hashless handles: scan for the expected event emitted
    /// by the target contract, filtered to the submitting account, over a
    /// bounded window anchored at the pre-submission block height. A revert
    /// emits no events, so a fresh matching log is a success signal.
    async fn recover_from_logs(
        &self,
        handle: &TransactionHandle,
        event_signature: B256,
    ) -> ConfirmationResult {
        let account_topic = LogQuery::topic_for_address(handle.from);

        let outcome = poll_until(self.config.log_scan_budget(), |attempt| {
            let chain = self.chain.clone();
            async move {
                let current_block = match chain.block_number().await {
                    Ok(block) => block,
                    Err(error) => {
                        tracing::debug!(attempt, %error, "block height lookup failed, retrying");
                        return None;
                    }
                };

                // Without a pre-submission anchor the window trails the
                // current height instead.
                let from_block = match handle.anchor_block {
                    Some(anchor) => anchor,
                    None => current_block.saturating_sub(self.config.log_scan_window),
                };
                let query = LogQuery {
                    address: handle.to,
                    event_signature,
                    account_topic: Some(account_topic),
                    from_block,
                    to_block: current_block.min(from_block + self.config.log_scan_window),
                };

                let logs = match chain.logs(&query).await {
                    Ok(logs) => logs,
                    Err(error) => {
                        tracing::debug!(attempt, %error, "log scan failed, retrying");
                        return None;
                    }
                };

                for log in logs {
                    if log.transaction_hash.is_zero() {
                        continue;
                    }
                    if !self.consume(log.transaction_hash) {
                        tracing::debug!(
                            tx_hash = %log.transaction_hash,
                            "skipping already-consumed event"
                        );
                        continue;
                    }

                    tracing::info!(
                        transaction_id = %handle.id,
                        tx_hash = %log.transaction_hash,
                        block = log.block_number,
                        "recovered transaction via event log"
                    );

                    let receipt = match chain.receipt(log.transaction_hash).await {
                        Ok(Some(receipt)) => receipt,
                        _ => synthesize_receipt(&log),
                    };
                    return Some(receipt);
                }

                None
            }
        })
        .await;

        match outcome {
            Some(receipt) => self.classify(handle, receipt),
            None => {
                tracing::warn!(
                    transaction_id = %handle.id,
                    attempts = self.config.max_log_scan_attempts,
                    "log recovery budget exhausted"
                );
                ConfirmationResult::Unknown {
                    reason: format!(
                        "no matching event in a {}-block window after {} scans",
                        self.config.log_scan_window, self.config.max_log_scan_attempts
                    ),
                }
            }
        }
    }

    fn classify(&self, handle: &TransactionHandle, receipt: TxReceipt) -> ConfirmationResult {
        if receipt.status {
            tracing::info!(
                transaction_id = %handle.id,
                tx_hash = %receipt.transaction_hash,
                block = receipt.block_number,
                "transaction confirmed"
            );
            ConfirmationResult::Confirmed { receipt }
        } else {
            tracing::warn!(
                transaction_id = %handle.id,
                tx_hash = %receipt.transaction_hash,
                "transaction reverted"
            );
            ConfirmationResult::Reverted { receipt }
        }
    }

    /// Returns false if the hash was already consumed by an earlier scan.
    fn consume(&self, hash: B256) -> bool {
        self.consumed
            .lock()
            .expect("consumed set lock poisoned")
            .insert(hash)
    }
}

/// A matching event proves the transaction mined successfully even when the
/// receipt itself is not indexed (seen on some embedded-host RPC proxies).
fn synthesize_receipt(log: &LogEntry) -> TxReceipt {
    TxReceipt {
        transaction_hash: log.transaction_hash,
        block_number: log.block_number,
        status: true,
        gas_used: 0,
        effective_gas_price: 0,
        logs: vec![log.clone()],
    }
}
