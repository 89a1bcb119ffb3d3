pub mod models;
pub mod subscriber;

use crate::rpc_error;
use jsonrpsee::{
    core::{client::ClientT as _, params::BatchRequestBuilder},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use models::{pool_snapshot, EthTransaction, TransactionReceipt, TxPoolContent};
use std::time::Duration;
use tracing::{debug, instrument};
use xray_core::{AdapterError, ChainAdapter, PendingSnapshot, TxKey, TxLookup};

/// Polls an Ethereum node's `txpool` namespace over HTTP JSON-RPC
#[derive(Debug, Clone)]
pub struct EthAdapter {
    name: String,
    client: HttpClient,
}

impl EthAdapter {
    pub fn new(
        name: impl Into<String>,
        endpoint: &str,
        request_timeout: Duration,
    ) -> Result<Self, AdapterError> {
        let client = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(endpoint)
            .map_err(|e| AdapterError::Transport(format!("failed to create client: {e}")))?;

        Ok(Self {
            name: name.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl ChainAdapter for EthAdapter {
    type Payload = EthTransaction;

    fn name(&self) -> &str {
        &self.name
    }

    /// `txpool_content` has no paging, so `limit` is not applied
    #[instrument(skip(self), fields(adapter = %self.name))]
    async fn fetch_pending(
        &self,
        _limit: usize,
    ) -> Result<PendingSnapshot<EthTransaction>, AdapterError> {
        let content: TxPoolContent = self
            .client
            .request("txpool_content", rpc_params![])
            .await
            .map_err(rpc_error)?;

        let snapshot = pool_snapshot(content);
        debug!(pending = snapshot.len(), "Fetched txpool content");
        Ok(snapshot)
    }

    /// One JSON-RPC batch of `eth_getTransactionReceipt`. A `null` receipt or
    /// a per-element error means the node does not know the transaction.
    #[instrument(skip_all, fields(adapter = %self.name, batch = keys.len()))]
    async fn resolve_batch(&self, keys: &[TxKey]) -> Result<Vec<TxLookup>, AdapterError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = BatchRequestBuilder::new();
        for key in keys {
            batch
                .insert("eth_getTransactionReceipt", rpc_params![key.as_str()])
                .map_err(|e| AdapterError::Decode(e.to_string()))?;
        }

        let response = self
            .client
            .batch_request::<Option<TransactionReceipt>>(batch)
            .await
            .map_err(rpc_error)?;

        let lookups = response
            .into_iter()
            .map(|entry| match entry {
                Ok(Some(receipt)) => receipt.lookup(),
                Ok(None) => TxLookup::NotFound,
                Err(e) => {
                    debug!("Receipt lookup failed: {}", e);
                    TxLookup::NotFound
                }
            })
            .collect();
        Ok(lookups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn empty_batch_skips_the_request() {
        let adapter = EthAdapter::new("eth", "http://127.0.0.1:1", Duration::from_secs(1))
            .expect("adapter");
        assert!(adapter.resolve_batch(&[]).await.expect("lookups").is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn unreachable_node_is_a_transport_error() {
        let adapter = EthAdapter::new("eth", "http://127.0.0.1:1", Duration::from_secs(1))
            .expect("adapter");

        let fetch = adapter.fetch_pending(10).await;
        assert!(matches!(fetch, Err(AdapterError::Transport(_))));

        let lookups = adapter.resolve_batch(&[TxKey::new("0xab")]).await;
        assert!(matches!(lookups, Err(AdapterError::Transport(_))));
    }
}
