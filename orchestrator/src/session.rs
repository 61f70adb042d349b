use std::sync::{Arc, Mutex as StdMutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use walletflow_core::{
    chain::ChainDescriptor,
    error::OrchestratorError,
    transport::{TransportKind, WalletClient, WalletTransport},
};

use crate::discovery::{HostEnvironment, TransportDiscovery};
use crate::selector::SelectionPolicy;

use alloy::primitives::Address;

/// One authenticated binding to an address. The address is immutable for
/// the session's lifetime; any change observed on the transport invalidates
/// the session and forces a new resolver cycle.
#[derive(Clone)]
pub struct WalletSession {
    pub address: Address,
    /// The chain this session is required to operate on.
    pub chain_id: u64,
    pub transport_kind: TransportKind,
    /// Whether the transport's active network matched (or was switched to)
    /// the required chain. Submission is refused while this is false.
    pub network_ok: bool,
    transport: Arc<dyn WalletTransport>,
    client: Option<Arc<dyn WalletClient>>,
}

impl WalletSession {
    /// The underlying transport. Lifecycle and invalidation stay with the
    /// [`SessionManager`]; callers submit through it but never replace it.
    pub fn transport(&self) -> &Arc<dyn WalletTransport> {
        &self.transport
    }

    /// The higher-level wallet client, present only for connector-modal
    /// sessions.
    pub fn client(&self) -> Option<&Arc<dyn WalletClient>> {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("transport_kind", &self.transport_kind)
            .field("network_ok", &self.network_ok)
            .finish()
    }
}

/// Why the last `ensure_wallet` call returned no session without erroring.
/// Rejections and modal delegation are ordinary outcomes, not failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionDenial {
    UserRejected { message: String },
    /// The connection modal was opened; its completion callback is expected
    /// to attach a transport and re-enter the resolver.
    ModalPending,
}

/// Wallet transport handed back by a completed connection-modal flow.
#[derive(Clone)]
pub struct ModalAttachment {
    pub transport: Arc<dyn WalletTransport>,
    pub client: Option<Arc<dyn WalletClient>>,
}

/// Owns the one cached [`WalletSession`] and the full resolver lifecycle:
/// init on first connect, teardown on disconnect or account change. No
/// other component mutates session state.
pub struct SessionManager {
    discovery: Arc<dyn TransportDiscovery>,
    required_chain: ChainDescriptor,
    policy: SelectionPolicy,
    current: Mutex<Option<WalletSession>>,
    modal_attachment: StdMutex<Option<ModalAttachment>>,
    last_denial: StdMutex<Option<SessionDenial>>,
}

impl SessionManager {
    pub fn new(
        discovery: Arc<dyn TransportDiscovery>,
        required_chain: ChainDescriptor,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            discovery,
            required_chain,
            policy,
            current: Mutex::new(None),
            modal_attachment: StdMutex::new(None),
            last_denial: StdMutex::new(None),
        }
    }

    /// Establish (or reuse) a session bound to one address.
    ///
    /// Returns `Ok(None)` when no session exists yet but nothing went
    /// wrong from the orchestrator's perspective: the user declined, or
    /// resolution was delegated to the connection modal. The reason is
    /// available from [`last_denial`](Self::last_denial). User rejection is
    /// never an `Err`.
    pub async fn ensure_wallet(
        &self,
        force_new_selection: bool,
    ) -> Result<Option<WalletSession>, OrchestratorError> {
        let mut current = self.current.lock().await;

        if force_new_selection {
            *current = None;
            self.modal_attachment
                .lock()
                .expect("modal attachment lock poisoned")
                .take();
        } else if let Some(session) = current.as_ref() {
            // Fast path, but only after re-verifying the transport still
            // reports the cached address as active.
            match session.transport.accounts().await {
                Ok(accounts) if accounts.first() == Some(&session.address) => {
                    return Ok(Some(session.clone()));
                }
                Ok(accounts) => {
                    tracing::info!(
                        cached_address = %session.address,
                        active_address = ?accounts.first(),
                        "active account changed, invalidating cached session"
                    );
                    *current = None;
                }
                Err(error) => {
                    tracing::warn!(%error, "transport unreachable, invalidating cached session");
                    *current = None;
                }
            }
        }

        self.set_denial(None);

        let environment = self.discovery.host_environment();
        let (transport, client) = match self.obtain_transport(environment).await? {
            Some(pair) => pair,
            None => return Ok(None),
        };

        let accounts = match transport.request_accounts().await {
            Ok(accounts) => accounts,
            Err(error) if error.is_user_rejection() => {
                tracing::info!(%error, "user declined wallet authorization");
                self.set_denial(Some(SessionDenial::UserRejected {
                    message: error.message,
                }));
                return Ok(None);
            }
            Err(error) => {
                return Err(OrchestratorError::TransportUnavailable {
                    environment: environment.to_string(),
                    message: error.to_string(),
                });
            }
        };

        // The address comes straight from the transport's account list;
        // signer-level address derivation is inconsistent across wallets.
        let address = *accounts.first().ok_or_else(|| {
            OrchestratorError::TransportUnavailable {
                environment: environment.to_string(),
                message: "transport authorized but reported no accounts".to_string(),
            }
        })?;

        let network_ok = self.ensure_network(transport.as_ref()).await;
        if !network_ok {
            tracing::warn!(
                expected_chain = self.required_chain.chain_id,
                "could not bind wallet to the required network, submission will be refused"
            );
        }

        let session = WalletSession {
            address,
            chain_id: self.required_chain.chain_id,
            transport_kind: transport.kind(),
            network_ok,
            transport,
            client,
        };

        tracing::info!(
            address = %session.address,
            transport = %session.transport_kind,
            network_ok = session.network_ok,
            "wallet session established"
        );

        *current = Some(session.clone());
        Ok(Some(session))
    }

    /// "Switch wallet" user action: bypass the cache and re-select.
    pub async fn switch_wallet(&self) -> Result<Option<WalletSession>, OrchestratorError> {
        self.ensure_wallet(true).await
    }

    /// Explicit user disconnect. Discards the session and any modal-granted
    /// transport.
    pub async fn disconnect(&self) {
        self.current.lock().await.take();
        self.modal_attachment
            .lock()
            .expect("modal attachment lock poisoned")
            .take();
        self.set_denial(None);
        tracing::info!("wallet session discarded");
    }

    /// Drop the cached session without re-resolving, e.g. after the
    /// transport became unreachable during a submission attempt.
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }

    /// Called by the application's modal-completion observer to hand the
    /// selected wallet back to the resolver. The next `ensure_wallet` call
    /// will bind to it.
    pub fn attach_modal_transport(&self, attachment: ModalAttachment) {
        *self
            .modal_attachment
            .lock()
            .expect("modal attachment lock poisoned") = Some(attachment);
        self.set_denial(None);
    }

    pub fn last_denial(&self) -> Option<SessionDenial> {
        self.last_denial
            .lock()
            .expect("denial lock poisoned")
            .clone()
    }

    pub async fn current_session(&self) -> Option<WalletSession> {
        self.current.lock().await.clone()
    }

    async fn obtain_transport(
        &self,
        environment: HostEnvironment,
    ) -> Result<Option<(Arc<dyn WalletTransport>, Option<Arc<dyn WalletClient>>)>, OrchestratorError>
    {
        if environment == HostEnvironment::EmbeddedMiniapp {
            // Embedded hosts sandbox wallet access: no extension fallback.
            return match self.discovery.embedded_transport().await {
                Some(transport) => Ok(Some((transport, None))),
                None => Err(OrchestratorError::TransportUnavailable {
                    environment: environment.to_string(),
                    message: "embedded host did not expose a wallet".to_string(),
                }),
            };
        }

        let attachment = self
            .modal_attachment
            .lock()
            .expect("modal attachment lock poisoned")
            .clone();
        if let Some(attachment) = attachment {
            return Ok(Some((attachment.transport, attachment.client)));
        }

        let candidates = self.discovery.injected_candidates();
        match self.policy.select(&candidates) {
            Some(candidate) => Ok(Some((candidate.transport.clone(), None))),
            None => {
                tracing::info!("no injected transport found, delegating to connection modal");
                self.discovery.open_connection_modal();
                self.set_denial(Some(SessionDenial::ModalPending));
                Ok(None)
            }
        }
    }

    /// Best-effort network alignment: switch, and if the wallet does not
    /// know the chain, add it and switch again. Failure never aborts
    /// session creation; it is surfaced via `network_ok`.
    async fn ensure_network(&self, transport: &dyn WalletTransport) -> bool {
        let required = self.required_chain.chain_id;

        match transport.chain_id().await {
            Ok(active) if active == required => return true,
            Ok(active) => {
                tracing::debug!(active, required, "wallet on wrong chain, requesting switch");
            }
            Err(error) => {
                tracing::warn!(%error, "could not read wallet chain, requesting switch anyway");
            }
        }

        match transport.switch_chain(required).await {
            Ok(()) => true,
            Err(error) if error.is_unrecognized_chain() => {
                tracing::debug!(required, "chain unknown to wallet, adding network descriptor");
                if let Err(error) = transport.add_chain(&self.required_chain).await {
                    tracing::warn!(%error, "network-add request failed");
                    return false;
                }
                match transport.switch_chain(required).await {
                    Ok(()) => true,
                    Err(error) => {
                        tracing::warn!(%error, "network switch failed after add");
                        false
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "network switch failed");
                false
            }
        }
    }

    fn set_denial(&self, denial: Option<SessionDenial>) {
        *self.last_denial.lock().expect("denial lock poisoned") = denial;
    }
}
