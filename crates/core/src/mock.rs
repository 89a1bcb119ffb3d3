//! Scripted [`ChainAdapter`] for tests.

use crate::{
    adapter::ChainAdapter,
    error::AdapterError,
    types::{PendingItem, PendingSnapshot, TxKey, TxLookup},
};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Mutex;

/// A pending item whose payload is its own key
pub fn pending(key: &str) -> PendingItem<String> {
    PendingItem::new(key, key.to_owned())
}

pub fn snapshot(keys: &[&str]) -> PendingSnapshot<String> {
    keys.iter()
        .map(|key| (TxKey::new(key), pending(key)))
        .collect()
}

#[derive(Debug, Default)]
struct Script {
    snapshots: VecDeque<Result<PendingSnapshot<String>, AdapterError>>,
    last_snapshot: PendingSnapshot<String>,
    lookups: VecDeque<Result<Vec<TxLookup>, AdapterError>>,
    batches: Vec<Vec<TxKey>>,
}

/// Replays queued snapshots and lookup responses.
///
/// Once the snapshot queue is drained the last served snapshot repeats; once
/// the lookup queue is drained every key is reported as not found. Clones
/// share the same script so a test can keep a handle after moving the
/// adapter into an engine.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    name: String,
    script: Arc<Mutex<Script>>,
    fetch_calls: Arc<AtomicUsize>,
    resolve_calls: Arc<AtomicUsize>,
    fetch_delay: Duration,
    resolve_delay: Duration,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Arc::default(),
            fetch_calls: Arc::default(),
            resolve_calls: Arc::default(),
            fetch_delay: Duration::ZERO,
            resolve_delay: Duration::ZERO,
        }
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = delay;
        self
    }

    pub async fn push_snapshot(&self, keys: &[&str]) {
        self.script.lock().await.snapshots.push_back(Ok(snapshot(keys)));
    }

    pub async fn push_fetch_error(&self, err: AdapterError) {
        self.script.lock().await.snapshots.push_back(Err(err));
    }

    pub async fn push_lookups(&self, lookups: Result<Vec<TxLookup>, AdapterError>) {
        self.script.lock().await.lookups.push_back(lookups);
    }

    /// Every key batch passed to `resolve_batch`, in call order
    pub async fn requested_batches(&self) -> Vec<Vec<TxKey>> {
        self.script.lock().await.batches.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChainAdapter for MockAdapter {
    type Payload = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_pending(
        &self,
        _limit: usize,
    ) -> Result<PendingSnapshot<String>, AdapterError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        let mut script = self.script.lock().await;
        match script.snapshots.pop_front() {
            Some(Ok(snapshot)) => {
                script.last_snapshot = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(err)) => Err(err),
            None => Ok(script.last_snapshot.clone()),
        }
    }

    async fn resolve_batch(&self, keys: &[TxKey]) -> Result<Vec<TxLookup>, AdapterError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if !self.resolve_delay.is_zero() {
            tokio::time::sleep(self.resolve_delay).await;
        }

        let mut script = self.script.lock().await;
        script.batches.push(keys.to_vec());
        script
            .lookups
            .pop_front()
            .unwrap_or_else(|| Ok(vec![TxLookup::NotFound; keys.len()]))
    }
}
