use super::models::EthTransaction;
use crate::rpc_error;
use jsonrpsee::{
    core::client::{Subscription, SubscriptionClientT as _},
    rpc_params,
    ws_client::{WsClient, WsClientBuilder},
};
use std::{num::NonZeroUsize, sync::Arc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use xray_core::{AdapterError, RecentBuffer, ServiceHandle};

/// Streams full pending transactions from a node's websocket endpoint into a
/// [`RecentBuffer`]. Nothing is reconciled; the buffer only evicts by
/// capacity.
#[derive(Debug, Clone)]
pub struct EthSubscriber {
    name: String,
    endpoint: String,
    buffer: RecentBuffer<EthTransaction>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl EthSubscriber {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, capacity: NonZeroUsize) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            buffer: RecentBuffer::new(capacity),
            last_error: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the received transactions, newest first
    pub fn buffer(&self) -> RecentBuffer<EthTransaction> {
        self.buffer.clone()
    }

    /// Why the subscription ended, if it failed
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub fn spawn(self, shutdown: CancellationToken) -> ServiceHandle {
        let name = format!("subscriber:{}", self.name);
        let handle = tokio::spawn(self.start(shutdown.clone()));

        ServiceHandle {
            name,
            handle,
            shutdown,
        }
    }

    async fn start(self, shutdown: CancellationToken) {
        info!(subscriber = %self.name, "starting pending transaction subscription");

        let subscription = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            subscription = self.subscribe() => subscription,
        };
        // the client owns the connection and must outlive the subscription
        let (_client, mut subscription) = match subscription {
            Ok(connected) => connected,
            Err(e) => {
                error!(subscriber = %self.name, "Failed to subscribe: {}", e);
                *self.last_error.write().await = Some(e.to_string());
                return;
            }
        };

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(subscriber = %self.name, "Shutdown signal received");
                    break;
                }

                notification = subscription.next() => match notification {
                    Some(Ok(tx)) => match EthTransaction::from_json(tx) {
                        Ok(tx) => self.buffer.push(tx).await,
                        Err(e) => debug!("Skipping undecodable pending transaction: {}", e),
                    },
                    Some(Err(e)) => debug!("Skipping malformed notification: {}", e),
                    None => {
                        warn!(subscriber = %self.name, "Subscription closed by the node");
                        *self.last_error.write().await = Some("subscription closed".to_owned());
                        break;
                    }
                },
            }
        }
    }

    async fn subscribe(
        &self,
    ) -> Result<(WsClient, Subscription<serde_json::Value>), AdapterError> {
        let client = WsClientBuilder::default()
            .build(&self.endpoint)
            .await
            .map_err(rpc_error)?;

        let subscription = client
            .subscribe(
                "eth_subscribe",
                rpc_params!["newPendingTransactions", true],
                "eth_unsubscribe",
            )
            .await
            .map_err(rpc_error)?;
        Ok((client, subscription))
    }
}
