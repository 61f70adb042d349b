use fixtures::*;

use std::sync::atomic::Ordering;

use walletflow_core::error::OrchestratorError;
use walletflow_core::transport::TransportKind;
use walletflow_orchestrator::discovery::HostEnvironment;
use walletflow_orchestrator::selector::SelectionPolicy;
use walletflow_orchestrator::session::{SessionDenial, SessionManager};

#[tokio::test]
async fn session_reuse_is_idempotent() {
    init_tracing();

    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(transport.clone(), &["mock"]);
    let manager = manager_for(discovery);

    let first = manager.ensure_wallet(false).await.unwrap().unwrap();
    let second = manager.ensure_wallet(false).await.unwrap().unwrap();

    assert_eq!(first.address, second.address);
    // One authorization round-trip; the second call only re-verifies the
    // active account.
    assert_eq!(transport.request_accounts_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn account_switch_invalidates_cached_session() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(transport.clone(), &["mock"]);
    let manager = manager_for(discovery);

    let first = manager.ensure_wallet(false).await.unwrap().unwrap();
    assert_eq!(first.address, USER);

    transport.set_active_account(OTHER_USER);

    let second = manager.ensure_wallet(false).await.unwrap().unwrap();
    assert_eq!(second.address, OTHER_USER);
    assert_eq!(transport.request_accounts_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn embedded_host_without_wallet_is_unavailable() {
    let discovery = MockDiscovery::new(HostEnvironment::EmbeddedMiniapp);
    let manager = manager_for(discovery);

    let err = manager.ensure_wallet(false).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::TransportUnavailable { .. }
    ));
}

#[tokio::test]
async fn embedded_host_resolves_via_host_wallet() {
    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    let session = embedded_session(transport).await;

    assert_eq!(session.address, USER);
    assert_eq!(session.transport_kind, TransportKind::EmbeddedMiniapp);
    assert!(session.network_ok);
}

#[tokio::test]
async fn no_injected_transport_delegates_to_modal() {
    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    let manager = manager_for(discovery.clone());

    let outcome = manager.ensure_wallet(false).await.unwrap();
    assert!(outcome.is_none());
    assert_eq!(discovery.modal_opens.load(Ordering::SeqCst), 1);
    assert!(matches!(
        manager.last_denial(),
        Some(SessionDenial::ModalPending)
    ));
}

#[tokio::test]
async fn modal_attachment_binds_connector_session() {
    let transport = MockTransport::new(TransportKind::ConnectorModal, USER);
    let client = MockClient::new(ClientBehavior::Hash(Default::default()));
    let session = modal_session(transport, client).await;

    assert_eq!(session.transport_kind, TransportKind::ConnectorModal);
    assert!(session.client().is_some());
}

#[tokio::test]
async fn authorization_rejection_is_not_an_error() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    transport.set_reject_authorization(true);
    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(transport, &["mock"]);
    let manager = manager_for(discovery);

    let outcome = manager.ensure_wallet(false).await.unwrap();
    assert!(outcome.is_none());
    assert!(matches!(
        manager.last_denial(),
        Some(SessionDenial::UserRejected { .. })
    ));
}

#[tokio::test]
async fn policy_disambiguates_multiple_injected_wallets() {
    let first = MockTransport::new(TransportKind::BrowserExtension, OTHER_USER);
    let preferred = MockTransport::new(TransportKind::BrowserExtension, USER);

    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(first.clone(), &["other-wallet"]);
    discovery.add_injected(preferred.clone(), &["metamask"]);

    let manager = SessionManager::new(
        discovery,
        required_chain(),
        SelectionPolicy::preferring(&["metamask"]),
    );

    let session = manager.ensure_wallet(false).await.unwrap().unwrap();
    assert_eq!(session.address, USER);
    assert_eq!(preferred.request_accounts_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.request_accounts_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn without_preference_first_candidate_wins() {
    let first = MockTransport::new(TransportKind::BrowserExtension, USER);
    let second = MockTransport::new(TransportKind::BrowserExtension, OTHER_USER);

    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(first.clone(), &["wallet-a"]);
    discovery.add_injected(second, &["wallet-b"]);
    let manager = manager_for(discovery);

    let session = manager.ensure_wallet(false).await.unwrap().unwrap();
    assert_eq!(session.address, USER);
}

#[tokio::test]
async fn wrong_network_is_switched() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    transport.set_active_chain(1);

    let session = extension_session(transport.clone()).await;
    assert!(session.network_ok);
    assert_eq!(transport.switch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*transport.active_chain.lock().unwrap(), REQUIRED_CHAIN_ID);
}

#[tokio::test]
async fn unknown_network_is_added_then_switched() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    transport.set_active_chain(1);
    transport.forget_all_chains();

    let session = extension_session(transport.clone()).await;
    assert!(session.network_ok);
    assert_eq!(transport.add_chain_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.switch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_switch_still_creates_session_but_flags_network() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    transport.set_active_chain(1);
    transport.set_refuse_switch(true);

    let session = extension_session(transport).await;
    assert!(!session.network_ok);
}

#[tokio::test]
async fn disconnect_discards_session() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(transport.clone(), &["mock"]);
    let manager = manager_for(discovery);

    manager.ensure_wallet(false).await.unwrap().unwrap();
    manager.disconnect().await;
    assert!(manager.current_session().await.is_none());

    // A fresh resolution performs a new authorization round-trip.
    manager.ensure_wallet(false).await.unwrap().unwrap();
    assert_eq!(transport.request_accounts_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn switch_wallet_bypasses_cache() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    let discovery = MockDiscovery::new(HostEnvironment::DesktopBrowser);
    discovery.add_injected(transport.clone(), &["mock"]);
    let manager = manager_for(discovery);

    manager.ensure_wallet(false).await.unwrap().unwrap();
    manager.switch_wallet().await.unwrap().unwrap();
    assert_eq!(transport.request_accounts_calls.load(Ordering::SeqCst), 2);
}
