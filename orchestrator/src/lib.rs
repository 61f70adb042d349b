//! Wallet transaction orchestration: session resolution across wallet
//! transports, transaction submission with transport fallback, and durable
//! on-chain confirmation.
//!
//! The three components compose in one direction: a
//! [`session::SessionManager`] resolves a [`session::WalletSession`], a
//! [`submit::Submitter`] turns contract calls into
//! [`walletflow_core::transaction::TransactionHandle`]s through that
//! session, and a [`confirm::ConfirmationWaiter`] resolves each handle to
//! exactly one terminal outcome.

pub mod allowance;
pub mod confirm;
pub mod discovery;
pub mod inflight;
pub mod poll;
pub mod selector;
pub mod session;
pub mod submit;
