use crate::{
    adapter::{with_deadline, ChainAdapter},
    differ::SnapshotDiffer,
    error::EngineError,
    history::{HistoryStore, DEFAULT_HISTORY_LIMIT},
    resolver::{ResolverConfig, StatusResolver},
    types::{PendingItem, PendingSnapshot, ResolvedItem, TxStatus},
};
use chrono::{DateTime, Utc};
use std::{num::NonZeroUsize, sync::Arc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Passed to every `fetch_pending` call
    pub pending_limit: usize,
    pub history_limit: NonZeroUsize,
    /// Also bounds the pending fetch
    pub resolver: ResolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pending_limit: 1000,
            history_limit: DEFAULT_HISTORY_LIMIT,
            resolver: ResolverConfig::default(),
        }
    }
}

/// Tick bookkeeping shown next to the engine's views
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub last_success: Option<DateTime<Utc>>,
    /// Cleared by the next successful tick
    pub last_error: Option<String>,
    pub ticks: u64,
}

/// Counts from one committed tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub pending: usize,
    pub departed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub evicted: usize,
    pub unknown: usize,
}

impl TickReport {
    fn record(&mut self, status: TxStatus) {
        match status {
            TxStatus::Success => self.succeeded += 1,
            TxStatus::Failed => self.failed += 1,
            TxStatus::Evicted => self.evicted += 1,
            TxStatus::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug)]
pub(crate) struct EngineState<P> {
    pending: PendingSnapshot<P>,
    history: HistoryStore<P>,
    status: EngineStatus,
}

impl<P> EngineState<P> {
    fn new(history_limit: NonZeroUsize) -> Self {
        Self {
            pending: PendingSnapshot::default(),
            history: HistoryStore::new(history_limit),
            status: EngineStatus::default(),
        }
    }
}

pub(crate) type AtomicEngineState<P> = Arc<RwLock<EngineState<P>>>;

/// Copy of an engine's views taken under a single read lock
#[derive(Debug, Clone)]
pub struct EngineSnapshot<P> {
    /// Sorted by key
    pub pending: Vec<PendingItem<P>>,
    /// Most recently resolved first
    pub history: Vec<ResolvedItem<P>>,
    pub status: EngineStatus,
}

/// Wraps the engine's `Arc<RwLock<_>>` to provide readonly access to its state.
///
/// Every accessor copies out under a short read lock, so readers never hold
/// the lock across an adapter call.
#[derive(Debug)]
pub struct EngineReadGuard<P> {
    state: AtomicEngineState<P>,
}

impl<P> Clone for EngineReadGuard<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<P: Clone> EngineReadGuard<P> {
    pub(crate) const fn new(state: AtomicEngineState<P>) -> Self {
        Self { state }
    }

    pub async fn current_pending(&self) -> Vec<PendingItem<P>> {
        sorted_pending(&self.state.read().await.pending)
    }

    pub async fn history(&self) -> Vec<ResolvedItem<P>> {
        self.state.read().await.history.items().to_vec()
    }

    pub async fn status(&self) -> EngineStatus {
        self.state.read().await.status.clone()
    }

    pub async fn snapshot(&self) -> EngineSnapshot<P> {
        let state = self.state.read().await;
        EngineSnapshot {
            pending: sorted_pending(&state.pending),
            history: state.history.items().to_vec(),
            status: state.status.clone(),
        }
    }
}

fn sorted_pending<P: Clone>(pending: &PendingSnapshot<P>) -> Vec<PendingItem<P>> {
    let mut items: Vec<_> = pending.values().cloned().collect();
    items.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    items
}

/// Reconciles one chain's pending pool against its previous snapshot.
///
/// Each tick fetches a new snapshot, resolves whatever departed since the
/// last one and then commits history and pending together under one write
/// lock. Ticks are expected to be serialized by the caller.
pub struct ReconciliationEngine<A: ChainAdapter> {
    adapter: A,
    resolver: StatusResolver,
    config: EngineConfig,
    state: AtomicEngineState<A::Payload>,
}

impl<A: ChainAdapter> ReconciliationEngine<A> {
    pub fn new(adapter: A, config: EngineConfig) -> Self {
        Self {
            adapter,
            resolver: StatusResolver::new(config.resolver),
            state: Arc::new(RwLock::new(EngineState::new(config.history_limit))),
            config,
        }
    }

    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn read_guard(&self) -> EngineReadGuard<A::Payload> {
        EngineReadGuard::new(Arc::clone(&self.state))
    }

    /// Drives one full reconciliation cycle
    pub async fn tick(&self) -> Result<TickReport, EngineError> {
        let never = CancellationToken::new();
        self.tick_with_cancellation(&never)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Like [`Self::tick`], but discards the results instead of committing
    /// them if `cancel` fired while adapter calls were in flight. Returns
    /// `Ok(None)` when the tick was discarded.
    #[instrument(skip_all, fields(adapter = self.adapter.name()))]
    pub async fn tick_with_cancellation(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<TickReport>, EngineError> {
        let fetched = with_deadline(
            self.config.resolver.call_timeout,
            self.adapter.fetch_pending(self.config.pending_limit),
        )
        .await;
        let mut next = match fetched {
            Ok(snapshot) => snapshot,
            Err(source) => {
                warn!("Failed to fetch pending snapshot: {}", source);
                self.state.write().await.status.last_error = Some(source.to_string());
                return Err(EngineError::Fetch {
                    adapter: self.adapter.name().to_owned(),
                    source,
                });
            }
        };
        let observed_at = Utc::now();

        let departed: Vec<PendingItem<A::Payload>> = {
            let state = self.state.read().await;
            SnapshotDiffer::departed(&state.pending, &next, &state.history)
                .iter()
                .filter_map(|key| state.pending.get(key).cloned())
                .collect()
        };

        let resolved = if departed.is_empty() {
            Vec::new()
        } else {
            self.resolver
                .resolve(&self.adapter, departed, observed_at)
                .await
        };

        if cancel.is_cancelled() {
            debug!("Shutdown observed mid-tick, discarding results");
            return Ok(None);
        }

        let mut report = TickReport {
            departed: resolved.len(),
            ..TickReport::default()
        };
        for item in &resolved {
            report.record(item.status());
        }

        let mut state = self.state.write().await;
        state.history.add(resolved);
        next.retain(|key, _| {
            let resolved_before = state.history.contains(key);
            if resolved_before {
                debug!(%key, "Ignoring reappearance of an already resolved transaction");
            }
            !resolved_before
        });
        state.pending = next;
        state.status.last_success = Some(observed_at);
        state.status.last_error = None;
        state.status.ticks += 1;
        report.pending = state.pending.len();
        drop(state);

        debug!(
            pending = report.pending,
            departed = report.departed,
            "Tick committed"
        );
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AdapterError,
        mock::{snapshot, MockAdapter},
        types::{TxKey, TxLookup},
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn engine(adapter: &MockAdapter) -> ReconciliationEngine<MockAdapter> {
        ReconciliationEngine::new(adapter.clone(), EngineConfig::default())
    }

    async fn pending_keys(guard: &EngineReadGuard<String>) -> Vec<String> {
        guard
            .current_pending()
            .await
            .into_iter()
            .map(|item| item.key.to_string())
            .collect()
    }

    #[test_log::test(tokio::test)]
    async fn first_tick_only_fills_pending() {
        let adapter = MockAdapter::new("mock");
        adapter.push_snapshot(&["B", "A"]).await;
        let engine = engine(&adapter);

        let report = engine.tick().await.expect("tick");

        assert_eq!(report.pending, 2);
        assert_eq!(report.departed, 0);
        assert_eq!(adapter.resolve_calls(), 0);
        assert_eq!(pending_keys(&engine.read_guard()).await, vec!["A", "B"]);
    }

    #[test_log::test(tokio::test)]
    async fn fetch_failure_leaves_views_untouched_and_records_error() {
        let adapter = MockAdapter::new("mock");
        adapter.push_snapshot(&["A", "B"]).await;
        adapter
            .push_fetch_error(AdapterError::Transport("down".into()))
            .await;
        let engine = engine(&adapter);
        let guard = engine.read_guard();
        engine.tick().await.expect("tick");
        let before = guard.snapshot().await;

        let err = engine.tick().await.expect_err("fetch should fail");

        assert!(matches!(err, EngineError::Fetch { .. }));
        let after = guard.snapshot().await;
        assert_eq!(after.pending, before.pending);
        assert_eq!(after.history, before.history);
        assert_eq!(after.status.ticks, 1);
        assert!(after
            .status
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("down")));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn hung_fetch_times_out_without_touching_views() {
        let adapter = MockAdapter::new("mock").with_fetch_delay(Duration::from_secs(60));
        adapter.push_snapshot(&["A"]).await;
        let engine = engine(&adapter);
        let guard = engine.read_guard();
        let before = guard.snapshot().await;

        let err = engine.tick().await.expect_err("fetch should time out");

        assert!(matches!(
            err,
            EngineError::Fetch {
                source: AdapterError::Timeout(timeout),
                ..
            } if timeout == EngineConfig::default().resolver.call_timeout
        ));
        let after = guard.snapshot().await;
        assert_eq!(after.pending, before.pending);
        assert_eq!(after.history, before.history);
        assert_eq!(after.status.ticks, 0);
        assert!(after.status.last_error.is_some());
        assert_eq!(adapter.resolve_calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn successful_tick_clears_last_error() {
        let adapter = MockAdapter::new("mock");
        adapter
            .push_fetch_error(AdapterError::Transport("down".into()))
            .await;
        adapter.push_snapshot(&["A"]).await;
        let engine = engine(&adapter);

        engine.tick().await.expect_err("first tick fails");
        engine.tick().await.expect("second tick");

        let status = engine.read_guard().status().await;
        assert_eq!(status.last_error, None);
        assert!(status.last_success.is_some());
    }

    #[test_log::test(tokio::test)]
    async fn resolved_key_is_never_readmitted() {
        let adapter = MockAdapter::new("mock");
        adapter.push_snapshot(&["A", "B"]).await;
        adapter.push_snapshot(&["B"]).await;
        adapter.push_snapshot(&["A", "B"]).await;
        let engine = engine(&adapter);

        for _ in 0..3 {
            engine.tick().await.expect("tick");
        }

        let guard = engine.read_guard();
        assert_eq!(pending_keys(&guard).await, vec!["B"]);
        let history = guard.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].key(), &TxKey::new("A"));
    }

    #[test_log::test(tokio::test)]
    async fn report_counts_statuses() {
        let adapter = MockAdapter::new("mock");
        adapter.push_snapshot(&["A", "B", "C", "D"]).await;
        adapter.push_snapshot(&[]).await;
        adapter
            .push_lookups(Ok(vec![
                TxLookup::Included {
                    succeeded: true,
                    height: 9,
                },
                TxLookup::Included {
                    succeeded: false,
                    height: 9,
                },
                TxLookup::NotFound,
                TxLookup::Indeterminate,
            ]))
            .await;
        let engine = engine(&adapter);

        engine.tick().await.expect("tick");
        let report = engine.tick().await.expect("tick");

        assert_eq!(
            report,
            TickReport {
                pending: 0,
                departed: 4,
                succeeded: 1,
                failed: 1,
                evicted: 1,
                unknown: 1,
            }
        );
    }

    #[test_log::test(tokio::test)]
    async fn cancelled_tick_discards_results() {
        let adapter = MockAdapter::new("mock");
        adapter.push_snapshot(&["A"]).await;
        adapter.push_snapshot(&[]).await;
        let engine = engine(&adapter);
        engine.tick().await.expect("tick");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = engine
            .tick_with_cancellation(&cancel)
            .await
            .expect("tick");

        assert_eq!(outcome, None);
        assert_eq!(adapter.resolve_calls(), 1);
        let guard = engine.read_guard();
        assert_eq!(pending_keys(&guard).await, vec!["A"]);
        assert!(guard.history().await.is_empty());
    }

    #[test]
    fn snapshot_helper_builds_keyed_map() {
        let snap = snapshot(&["A", "B"]);
        assert!(snap.contains_key(&TxKey::new("A")));
        assert_eq!(snap.len(), 2);
    }
}
