use fixtures::*;

use std::sync::atomic::Ordering;

use alloy::primitives::{B256, Bytes};

use walletflow_core::error::OrchestratorError;
use walletflow_core::transaction::ContractCall;
use walletflow_core::transport::TransportKind;
use walletflow_orchestrator::submit::{SubmitOutcome, Submitter};

fn game_call() -> ContractCall {
    ContractCall::new(GAME_CONTRACT, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]))
}

#[tokio::test]
async fn embedded_submission_yields_handle() {
    init_tracing();

    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    let session = embedded_session(transport.clone()).await;
    let submitter = Submitter::new(MockChain::new());

    let outcome = submitter.send_contract_tx(&session, &game_call()).await.unwrap();
    let handle = outcome.handle().expect("submitted");

    assert_eq!(handle.hash, Some(B256::repeat_byte(0xaa)));
    assert_eq!(handle.submitted_via, TransportKind::EmbeddedMiniapp);
    assert_eq!(handle.from, USER);
    assert_eq!(handle.to, GAME_CONTRACT);
    assert_eq!(handle.anchor_block, Some(100));
    assert_eq!(transport.send_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hashless_acceptance_still_yields_handle() {
    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    transport.set_send_behavior(SendBehavior::NoHash);
    let session = embedded_session(transport).await;
    let submitter = Submitter::new(MockChain::new());

    let outcome = submitter.send_contract_tx(&session, &game_call()).await.unwrap();
    let handle = outcome.handle().expect("submitted");

    assert_eq!(handle.hash, None);
    assert_eq!(handle.anchor_block, Some(100));
}

#[tokio::test]
async fn failed_height_read_leaves_anchor_unset() {
    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    let session = embedded_session(transport).await;

    let chain = MockChain::new();
    chain.block_read_failures.store(1, std::sync::atomic::Ordering::SeqCst);
    let submitter = Submitter::new(chain);

    let outcome = submitter.send_contract_tx(&session, &game_call()).await.unwrap();
    let handle = outcome.handle().expect("submitted");

    // Never pretend the anchor is block zero; recovery must know it is
    // missing and anchor its window at confirmation time instead.
    assert_eq!(handle.anchor_block, None);
}

#[tokio::test]
async fn rejection_is_cancellation_not_error() {
    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    transport.set_send_behavior(SendBehavior::Reject);
    let session = embedded_session(transport).await;
    let submitter = Submitter::new(MockChain::new());

    let outcome = submitter.send_contract_tx(&session, &game_call()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Canceled));
}

#[tokio::test]
async fn client_rejection_stops_the_fallback_chain() {
    let transport = MockTransport::new(TransportKind::ConnectorModal, USER);
    let client = MockClient::new(ClientBehavior::Reject);
    let session = modal_session(transport.clone(), client.clone()).await;
    let submitter = Submitter::new(MockChain::new());

    let outcome = submitter.send_contract_tx(&session, &game_call()).await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::Canceled));
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    // A definitive rejection must not be retried on the raw provider.
    assert_eq!(transport.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn client_failure_falls_back_to_raw_provider() {
    let transport = MockTransport::new(TransportKind::ConnectorModal, USER);
    let client = MockClient::new(ClientBehavior::Error("provider disconnected".into()));
    let session = modal_session(transport.clone(), client.clone()).await;
    let submitter = Submitter::new(MockChain::new());

    let outcome = submitter.send_contract_tx(&session, &game_call()).await.unwrap();
    let handle = outcome.handle().expect("submitted via fallback");

    assert_eq!(handle.hash, Some(B256::repeat_byte(0xaa)));
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.send_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_strategies_surface_the_last_error() {
    let transport = MockTransport::new(TransportKind::ConnectorModal, USER);
    transport.set_send_behavior(SendBehavior::Error("execution aborted".into()));
    let client = MockClient::new(ClientBehavior::Error("provider disconnected".into()));
    let session = modal_session(transport, client).await;
    let submitter = Submitter::new(MockChain::new());

    let err = submitter.send_contract_tx(&session, &game_call()).await.unwrap_err();
    match err {
        OrchestratorError::SubmissionFailed { transport, message } => {
            assert_eq!(transport, TransportKind::ConnectorModal);
            assert!(message.contains("execution aborted"));
        }
        other => panic!("expected SubmissionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn sender_override_mismatch_hard_fails() {
    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    let session = embedded_session(transport.clone()).await;
    let submitter = Submitter::new(MockChain::new());

    let mut call = game_call();
    call.from = Some(OTHER_USER);

    let err = submitter.send_contract_tx(&session, &call).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ValidationError { .. }));
    // Nothing reached the transport.
    assert_eq!(transport.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn decimal_gas_is_normalized_to_hex() {
    let transport = MockTransport::new(TransportKind::EmbeddedMiniapp, USER);
    let session = embedded_session(transport.clone()).await;
    let submitter = Submitter::new(MockChain::new());

    let mut call = game_call();
    call.gas_limit = Some("300000".to_string());

    submitter.send_contract_tx(&session, &call).await.unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].gas.as_deref(), Some("0x493e0"));
}

#[tokio::test]
async fn wrong_network_session_is_refused() {
    let transport = MockTransport::new(TransportKind::BrowserExtension, USER);
    transport.set_active_chain(1);
    transport.set_refuse_switch(true);
    let session = extension_session(transport.clone()).await;
    assert!(!session.network_ok);

    let submitter = Submitter::new(MockChain::new());
    let err = submitter.send_contract_tx(&session, &game_call()).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::WrongNetwork { .. }));
    assert_eq!(transport.send_calls.load(Ordering::SeqCst), 0);
}
