//! Mempool snapshot reconciliation.
//!
//! A [`ReconciliationEngine`] polls a [`ChainAdapter`] for the pending set,
//! diffs it against the previous snapshot, resolves departed transactions in
//! batches and keeps a bounded history of the outcomes.

pub mod adapter;
pub mod differ;
pub mod engine;
pub mod error;
pub mod history;
pub mod recent;
pub mod resolver;
pub mod service;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use adapter::ChainAdapter;
pub use differ::SnapshotDiffer;
pub use engine::{
    EngineConfig, EngineReadGuard, EngineSnapshot, EngineStatus, ReconciliationEngine, TickReport,
};
pub use error::{AdapterError, EngineError};
pub use history::HistoryStore;
pub use recent::RecentBuffer;
pub use resolver::{ResolverConfig, StatusResolver};
pub use service::{EngineService, ServiceHandle};
pub use types::{PendingItem, PendingSnapshot, PoolLabel, ResolvedItem, TxKey, TxLookup, TxStatus};
