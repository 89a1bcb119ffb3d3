use super::models::{RpcResponse, TxResponse, UnconfirmedTxs};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;
use xray_core::{AdapterError, TxKey};

/// CometBFT JSON-RPC over HTTP GET (`/unconfirmed_txs`, `/tx`)
#[derive(Debug, Clone)]
pub struct CometClient {
    client: Client,
    base: String,
}

impl CometClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| AdapterError::Transport(format!("invalid endpoint {endpoint}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AdapterError::Transport(
                "invalid URL scheme: only http/https allowed".to_owned(),
            ));
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AdapterError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: endpoint.trim_end_matches('/').to_owned(),
        })
    }

    pub async fn unconfirmed_txs(&self, limit: usize) -> Result<UnconfirmedTxs, AdapterError> {
        let response: RpcResponse<UnconfirmedTxs> = self
            .get("/unconfirmed_txs", &[("limit", limit.to_string())])
            .await?;
        match (response.result, response.error) {
            (Some(result), _) => Ok(result),
            (None, Some(err)) => Err(err.into()),
            (None, None) => Err(AdapterError::Decode(
                "unconfirmed_txs response carried neither result nor error".to_owned(),
            )),
        }
    }

    pub async fn tx(&self, hash: &TxKey) -> Result<RpcResponse<TxResponse>, AdapterError> {
        self.get("/tx", &[("hash", format!("0x{hash}"))]).await
    }

    #[instrument(skip(self, query), fields(base = %self.base))]
    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<RpcResponse<T>, AdapterError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base, path);
        debug!("Making request to: {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(format!("request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Transport(format!("failed to read response body: {e}")))?;

        // CometBFT answers RPC errors with a 500 and a JSON body, so the body
        // is parsed before the status is considered
        serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                AdapterError::Decode(format!("failed to parse JSON response: {e}"))
            } else {
                AdapterError::Transport(format!("request failed with status: {status}"))
            }
        })
    }
}
