use std::sync::Arc;

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use walletflow_core::{
    chain::ChainRead,
    error::{OrchestratorError, truncate_for_display},
    transaction::{ContractCall, TransactionHandle},
    transport::{ClientTxRequest, RawTxRequest, TransportError, TransportKind, normalize_gas},
};

use crate::session::WalletSession;

const MAX_ERROR_DISPLAY_CHARS: usize = 220;

/// What a submission attempt came back with. Cancellation is an ordinary
/// outcome: a user declining a prompt is never surfaced as an error the
/// caller has to catch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitOutcome {
    Submitted { handle: TransactionHandle },
    Canceled,
}

impl SubmitOutcome {
    pub fn handle(self) -> Option<TransactionHandle> {
        match self {
            SubmitOutcome::Submitted { handle } => Some(handle),
            SubmitOutcome::Canceled => None,
        }
    }
}

/// The submission paths, in fallback order. At most one fallback is
/// attempted after the primary branch; a definitive rejection stops the
/// chain immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitStrategy {
    /// The embedded host's raw send primitive.
    EmbeddedHost,
    /// The higher-level wallet client with an explicit account/chain
    /// binding (ambient defaults are unreliable across wallets).
    WalletClient,
    /// The lowest-level request shape, submitted directly against the
    /// active injected provider. Some wallets reliably support only this.
    RawProvider,
}

impl std::fmt::Display for SubmitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubmitStrategy::EmbeddedHost => "embedded-host",
            SubmitStrategy::WalletClient => "wallet-client",
            SubmitStrategy::RawProvider => "raw-provider",
        };
        f.write_str(s)
    }
}

/// Submits contract transactions through whichever transport the session is
/// bound to, without the caller knowing which one is active.
pub struct Submitter<C: ChainRead> {
    chain: Arc<C>,
}

impl<C: ChainRead> Submitter<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub async fn send_contract_tx(
        &self,
        session: &WalletSession,
        call: &ContractCall,
    ) -> Result<SubmitOutcome, OrchestratorError> {
        if !session.network_ok {
            return Err(OrchestratorError::WrongNetwork {
                expected: session.chain_id,
                actual: None,
            });
        }

        // A backend-issued signature may be bound to a specific address. A
        // mismatch with the active session means the session went stale
        // between signing and submission: hard-fail, never submit from a
        // different account.
        let from = match call.from {
            Some(explicit) if explicit != session.address => {
                return Err(OrchestratorError::validation(format!(
                    "call is bound to {explicit} but the active session is {session_address}; \
                     reconnect and retry",
                    session_address = session.address
                )));
            }
            Some(explicit) => explicit,
            None => session.address,
        };

        let gas = call
            .gas_limit
            .as_deref()
            .map(normalize_gas)
            .transpose()?;

        // Anchor for the log-recovery window, observed before submission. A
        // failed read leaves the anchor unset; the waiter then anchors the
        // window at confirmation time rather than scanning from genesis.
        let anchor_block = match self.chain.block_number().await {
            Ok(block) => Some(block),
            Err(error) => {
                tracing::warn!(%error, "could not read block height before submission");
                None
            }
        };

        let raw = RawTxRequest {
            from,
            to: call.to,
            data: call.data.clone(),
            value: call.value,
            gas: gas.clone(),
        };

        let strategies: &[SubmitStrategy] = match session.transport_kind {
            TransportKind::EmbeddedMiniapp => &[SubmitStrategy::EmbeddedHost],
            TransportKind::ConnectorModal if session.client().is_some() => {
                &[SubmitStrategy::WalletClient, SubmitStrategy::RawProvider]
            }
            TransportKind::ConnectorModal | TransportKind::BrowserExtension => {
                &[SubmitStrategy::RawProvider]
            }
        };

        let mut last_error: Option<(SubmitStrategy, TransportError)> = None;

        for &strategy in strategies {
            match self.attempt(strategy, session, &raw).await {
                Ok(hash) => {
                    let handle = TransactionHandle {
                        id: uuid::Uuid::new_v4().to_string(),
                        hash,
                        submitted_via: session.transport_kind,
                        submitted_at: chrono::Utc::now().timestamp(),
                        from,
                        to: call.to,
                        anchor_block,
                    };
                    tracing::info!(
                        transaction_id = %handle.id,
                        hash = ?handle.hash,
                        %strategy,
                        "transaction accepted by transport"
                    );
                    return Ok(SubmitOutcome::Submitted { handle });
                }
                Err(error) if error.is_user_rejection() => {
                    // Definitive: do not fall through to another transport.
                    tracing::info!(%strategy, %error, "user canceled the transaction");
                    return Ok(SubmitOutcome::Canceled);
                }
                Err(error) => {
                    // Some wallets mis-report support for the richer call
                    // paths even though a raw submission would succeed.
                    tracing::warn!(%strategy, %error, "submission attempt failed");
                    last_error = Some((strategy, error));
                }
            }
        }

        let (strategy, error) = last_error.unwrap_or_else(|| {
            (
                SubmitStrategy::RawProvider,
                TransportError::new(None, "no submission strategy available"),
            )
        });

        tracing::error!(%strategy, %error, "all submission strategies exhausted");
        Err(OrchestratorError::SubmissionFailed {
            transport: session.transport_kind,
            message: truncate_for_display(&error.to_string(), MAX_ERROR_DISPLAY_CHARS),
        })
    }

    async fn attempt(
        &self,
        strategy: SubmitStrategy,
        session: &WalletSession,
        raw: &RawTxRequest,
    ) -> Result<Option<B256>, TransportError> {
        match strategy {
            SubmitStrategy::EmbeddedHost => {
                let hash = session.transport().send_transaction(raw.clone()).await?;

                // Some hosts report a stale authorized list transiently;
                // this is a cross-check, not a gate.
                match session.transport().accounts().await {
                    Ok(accounts) if !accounts.contains(&raw.from) => {
                        tracing::warn!(
                            from = %raw.from,
                            "embedded host account list no longer contains the sender"
                        );
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::warn!(%error, "could not cross-check embedded host accounts");
                    }
                }

                Ok(hash)
            }
            SubmitStrategy::WalletClient => {
                let client = session.client().ok_or_else(|| {
                    TransportError::new(None, "session has no wallet client binding")
                })?;
                let hash = client
                    .send_transaction(ClientTxRequest {
                        to: raw.to,
                        data: raw.data.clone(),
                        value: raw.value,
                        account: raw.from,
                        chain_id: session.chain_id,
                        gas: raw.gas.clone(),
                    })
                    .await?;
                Ok(Some(hash))
            }
            SubmitStrategy::RawProvider => session.transport().send_transaction(raw.clone()).await,
        }
    }
}
