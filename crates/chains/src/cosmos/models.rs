use base64::{engine::general_purpose::STANDARD, Engine as _};
use cosmos_sdk_proto::cosmos::tx::v1beta1::{AuthInfo, TxBody, TxRaw};
use prost::Message as _;
use serde::Deserialize;
use sha2::{Digest as _, Sha256};
use tracing::debug;
use xray_core::{AdapterError, PendingItem, PendingSnapshot, TxKey, TxLookup};

/// CometBFT JSON-RPC envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl RpcErrorBody {
    /// CometBFT reports unknown hashes as an internal error whose data reads
    /// `tx (<HASH>) not found`
    pub fn is_not_found(&self) -> bool {
        self.message.contains("not found")
            || self
                .data
                .as_deref()
                .is_some_and(|data| data.contains("not found"))
    }
}

impl From<RpcErrorBody> for AdapterError {
    fn from(err: RpcErrorBody) -> Self {
        let message = match err.data {
            Some(data) if !data.is_empty() => format!("{}: {}", err.message, data),
            _ => err.message,
        };
        Self::Rpc {
            code: err.code,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UnconfirmedTxs {
    /// Base64 encoded raw transactions; null when the mempool is empty
    #[serde(default)]
    pub txs: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmosTransaction {
    /// Encoded size in bytes
    pub size: usize,
    /// `Any` type URLs of the body messages, in order
    pub messages: Vec<String>,
    /// Sequence of the first signer; `None` for unsigned transactions
    pub sequence: Option<u64>,
}

impl CosmosTransaction {
    /// Decodes a protobuf `TxRaw` as broadcast to CometBFT
    pub fn decode(raw: &[u8]) -> Result<Self, AdapterError> {
        let decode_err = |e: prost::DecodeError| AdapterError::Decode(e.to_string());
        let tx_raw = TxRaw::decode(raw).map_err(decode_err)?;
        let body = TxBody::decode(tx_raw.body_bytes.as_slice()).map_err(decode_err)?;
        let auth_info = AuthInfo::decode(tx_raw.auth_info_bytes.as_slice()).map_err(decode_err)?;

        Ok(Self {
            size: raw.len(),
            messages: body.messages.into_iter().map(|msg| msg.type_url).collect(),
            sequence: auth_info.signer_infos.first().map(|signer| signer.sequence),
        })
    }

    /// `MsgSend`, or `MsgSend +2 more` when the body carries several messages
    pub fn message_summary(&self) -> String {
        let Some(first) = self.messages.first() else {
            return "unknown".to_owned();
        };
        let name = first.rsplit('.').next().unwrap_or(first);
        match self.messages.len() {
            1 => name.to_owned(),
            n => format!("{} +{} more", name, n - 1),
        }
    }
}

/// Uppercase hex SHA-256 of the raw transaction bytes, as CometBFT indexes it
pub fn tx_hash(raw: &[u8]) -> TxKey {
    TxKey::from(hex::encode_upper(Sha256::digest(raw)))
}

pub fn mempool_snapshot(unconfirmed: UnconfirmedTxs) -> PendingSnapshot<CosmosTransaction> {
    unconfirmed
        .txs
        .unwrap_or_default()
        .iter()
        .filter_map(|encoded| {
            let decoded = STANDARD
                .decode(encoded)
                .map_err(|e| AdapterError::Decode(e.to_string()))
                .and_then(|raw| CosmosTransaction::decode(&raw).map(|tx| (tx_hash(&raw), tx)));
            match decoded {
                Ok((key, tx)) => Some((key.clone(), PendingItem::new(key, tx))),
                Err(e) => {
                    debug!("Skipping undecodable mempool transaction: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct TxResponse {
    /// Decimal string
    pub height: String,
    #[serde(default)]
    pub tx_result: Option<ExecTxResult>,
}

#[derive(Debug, Deserialize)]
pub struct ExecTxResult {
    /// Zero means the transaction executed successfully
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
}

impl TxResponse {
    pub fn lookup(&self) -> TxLookup {
        match (&self.tx_result, self.height.parse::<u64>()) {
            (Some(result), Ok(height)) => TxLookup::Included {
                succeeded: result.code == 0,
                height,
            },
            _ => TxLookup::Indeterminate,
        }
    }
}

/// Maps a `tx` query answer onto a lookup; RPC errors other than "not found"
/// fail the query so the batch is retried
pub fn tx_lookup(response: RpcResponse<TxResponse>) -> Result<TxLookup, AdapterError> {
    match (response.result, response.error) {
        (Some(tx), _) => Ok(tx.lookup()),
        (None, Some(err)) if err.is_not_found() => Ok(TxLookup::NotFound),
        (None, Some(err)) => Err(err.into()),
        (None, None) => Err(AdapterError::Decode(
            "tx response carried neither result nor error".to_owned(),
        )),
    }
}
