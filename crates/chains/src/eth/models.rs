use alloy_primitives::{Address, B256, U64};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use xray_core::{PendingItem, PendingSnapshot, PoolLabel, TxKey, TxLookup};

/// `txpool_content` result: pool name -> account -> nonce -> transaction.
///
/// Transactions are kept as raw JSON so one malformed entry can be skipped
/// without losing the rest of the pool.
pub type TxPoolContent = HashMap<String, HashMap<String, HashMap<String, serde_json::Value>>>;

/// The subset of an RPC transaction object the monitor displays
#[derive(Debug, Clone, Deserialize)]
pub struct RpcTransaction {
    pub hash: B256,
    pub from: Address,
    pub nonce: U64,
    pub gas: U64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthTransaction {
    pub hash: B256,
    pub from: Address,
    pub nonce: u64,
    pub gas: u64,
}

impl EthTransaction {
    /// `0x`-prefixed lowercase hash
    pub fn key(&self) -> TxKey {
        TxKey::from(format!("{:#x}", self.hash))
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<RpcTransaction>(value).map(Self::from)
    }
}

impl From<RpcTransaction> for EthTransaction {
    fn from(tx: RpcTransaction) -> Self {
        Self {
            hash: tx.hash,
            from: tx.from,
            nonce: tx.nonce.to::<u64>(),
            gas: tx.gas.to::<u64>(),
        }
    }
}

/// Flattens the pool content into a keyed snapshot, labelling every item
/// with the pool it was reported in
pub fn pool_snapshot(content: TxPoolContent) -> PendingSnapshot<EthTransaction> {
    let mut snapshot = PendingSnapshot::default();
    for (pool, accounts) in content {
        let label = PoolLabel::new(&pool);
        for tx in accounts.into_values().flat_map(HashMap::into_values) {
            match EthTransaction::from_json(tx) {
                Ok(tx) => {
                    let key = tx.key();
                    snapshot.insert(
                        key.clone(),
                        PendingItem::new(key, tx).in_pool(label.clone()),
                    );
                }
                Err(e) => debug!(%pool, "Skipping undecodable pool transaction: {}", e),
            }
        }
    }
    snapshot
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub block_number: Option<U64>,
    /// Absent on pre-Byzantium receipts
    pub status: Option<U64>,
}

impl TransactionReceipt {
    pub fn lookup(&self) -> TxLookup {
        match (self.block_number, self.status) {
            (Some(height), Some(status)) => TxLookup::Included {
                succeeded: status.to::<u64>() == 1,
                height: height.to::<u64>(),
            },
            _ => TxLookup::Indeterminate,
        }
    }
}
