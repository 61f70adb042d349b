use alloy::{
    consensus::TxReceipt as _,
    primitives::{Address, B256, Bytes},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{Filter, Log as RpcLog, TransactionReceipt as RpcReceipt, TransactionRequest},
    transports::http::reqwest::Url,
};
use serde::{Deserialize, Serialize};

use crate::error::{AlloyRpcErrorToOrchestratorError, OrchestratorError};

/// Full network descriptor: everything a wallet needs for a network-add
/// request, and everything we need to build a read-only connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub native_currency: NativeCurrency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The outcome record of a mined transaction, reduced to the fields the
/// orchestration layer and its callers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `true` for success, `false` for a revert.
    pub status: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub transaction_hash: B256,
    pub block_number: u64,
}

/// Bounded event-log query. `from_block..=to_block` is always a finite
/// window; there is no way to express an unbounded historical scan.
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub address: Address,
    /// Event signature (topic0).
    pub event_signature: B256,
    /// First indexed parameter, used to filter to the submitting account.
    pub account_topic: Option<B256>,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogQuery {
    /// An address left-padded to 32 bytes, the way indexed address
    /// parameters appear in log topics.
    pub fn topic_for_address(address: Address) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_slice());
        B256::from(bytes)
    }
}

/// Read-only chain access. Stateless and safe to share across concurrent
/// callers; it performs no mutation.
#[async_trait::async_trait]
pub trait ChainRead: Send + Sync {
    fn chain_id(&self) -> u64;

    async fn receipt(&self, hash: B256) -> Result<Option<TxReceipt>, OrchestratorError>;

    async fn block_number(&self) -> Result<u64, OrchestratorError>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, OrchestratorError>;

    /// `eth_call` against a contract with opaque calldata.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, OrchestratorError>;
}

/// [`ChainRead`] over a plain HTTP JSON-RPC endpoint.
pub struct HttpChain {
    chain_id: u64,
    provider: RootProvider,
}

impl HttpChain {
    pub fn new(descriptor: &ChainDescriptor) -> Result<Self, OrchestratorError> {
        let rpc_url = Url::parse(&descriptor.rpc_url).map_err(|e| {
            OrchestratorError::validation(format!(
                "failed to parse RPC URL {url}: {e}",
                url = descriptor.rpc_url
            ))
        })?;

        Ok(Self {
            chain_id: descriptor.chain_id,
            provider: ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_http(rpc_url),
        })
    }

    pub fn provider(&self) -> &RootProvider {
        &self.provider
    }
}

fn from_rpc_log(log: &RpcLog) -> LogEntry {
    LogEntry {
        address: log.inner.address,
        topics: log.inner.data.topics().to_vec(),
        data: log.inner.data.data.clone(),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
        block_number: log.block_number.unwrap_or_default(),
    }
}

fn from_rpc_receipt(receipt: &RpcReceipt) -> TxReceipt {
    TxReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number.unwrap_or_default(),
        status: receipt.status(),
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
        logs: receipt.inner.logs().iter().map(from_rpc_log).collect(),
    }
}

#[async_trait::async_trait]
impl ChainRead for HttpChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn receipt(&self, hash: B256) -> Result<Option<TxReceipt>, OrchestratorError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| e.to_orchestrator_error(self.chain_id))?;

        Ok(receipt.as_ref().map(from_rpc_receipt))
    }

    async fn block_number(&self) -> Result<u64, OrchestratorError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| e.to_orchestrator_error(self.chain_id))
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, OrchestratorError> {
        let mut filter = Filter::new()
            .address(query.address)
            .event_signature(query.event_signature)
            .from_block(query.from_block)
            .to_block(query.to_block);

        if let Some(account_topic) = query.account_topic {
            filter = filter.topic1(account_topic);
        }

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| e.to_orchestrator_error(self.chain_id))?;

        Ok(logs.iter().map(from_rpc_log).collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, OrchestratorError> {
        let tx = TransactionRequest::default().to(to).input(data.into());

        self.provider
            .call(tx)
            .await
            .map_err(|e| e.to_orchestrator_error(self.chain_id))
    }
}
