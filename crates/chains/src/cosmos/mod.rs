pub mod client;
pub mod models;

use client::CometClient;
use futures::future::try_join_all;
use models::{mempool_snapshot, tx_lookup, CosmosTransaction};
use std::time::Duration;
use tracing::{debug, instrument};
use xray_core::{AdapterError, ChainAdapter, PendingSnapshot, TxKey, TxLookup};

/// Polls a CometBFT node's mempool and resolves departed transactions with
/// `tx` queries
#[derive(Debug, Clone)]
pub struct CosmosAdapter {
    name: String,
    client: CometClient,
}

impl CosmosAdapter {
    pub fn new(
        name: impl Into<String>,
        endpoint: &str,
        request_timeout: Duration,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            name: name.into(),
            client: CometClient::new(endpoint, request_timeout)?,
        })
    }
}

#[async_trait::async_trait]
impl ChainAdapter for CosmosAdapter {
    type Payload = CosmosTransaction;

    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(adapter = %self.name))]
    async fn fetch_pending(
        &self,
        limit: usize,
    ) -> Result<PendingSnapshot<CosmosTransaction>, AdapterError> {
        let unconfirmed = self.client.unconfirmed_txs(limit).await?;
        let snapshot = mempool_snapshot(unconfirmed);
        debug!(pending = snapshot.len(), "Fetched unconfirmed txs");
        Ok(snapshot)
    }

    /// CometBFT has no batch lookup, so every key is queried concurrently.
    /// Any query that fails outright fails the whole batch.
    #[instrument(skip_all, fields(adapter = %self.name, batch = keys.len()))]
    async fn resolve_batch(&self, keys: &[TxKey]) -> Result<Vec<TxLookup>, AdapterError> {
        try_join_all(keys.iter().map(|key| async move {
            let response = self.client.tx(key).await?;
            tx_lookup(response)
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://rpc.cosmos.directory/cosmoshub", true)]
    #[case("http://localhost:26657/", true)]
    #[case("ws://localhost:26657/websocket", false)]
    #[case("not a url", false)]
    fn validates_endpoint(#[case] endpoint: &str, #[case] ok: bool) {
        let adapter = CosmosAdapter::new("cosmos", endpoint, Duration::from_secs(1));
        assert_eq!(adapter.is_ok(), ok);
    }

    #[test_log::test(tokio::test)]
    async fn empty_batch_needs_no_queries() {
        let adapter = CosmosAdapter::new("cosmos", "http://127.0.0.1:1", Duration::from_secs(1))
            .expect("adapter");
        assert!(adapter.resolve_batch(&[]).await.expect("lookups").is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn unreachable_node_fails_the_whole_batch() {
        let adapter = CosmosAdapter::new("cosmos", "http://127.0.0.1:1", Duration::from_secs(1))
            .expect("adapter");

        let fetch = adapter.fetch_pending(10).await;
        assert!(matches!(fetch, Err(AdapterError::Transport(_))));

        let keys = [TxKey::new("AB"), TxKey::new("CD")];
        let lookups = adapter.resolve_batch(&keys).await;
        assert!(matches!(lookups, Err(AdapterError::Transport(_))));
    }
}
