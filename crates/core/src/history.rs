use crate::types::{ResolvedItem, TxKey};
use std::{collections::HashSet, num::NonZeroUsize};

/// Default number of resolved transactions kept for display
pub const DEFAULT_HISTORY_LIMIT: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Bounded, deduplicated record of resolved transactions.
///
/// Entries are kept most recently resolved first. Adding a key that is
/// already present replaces the earlier record; once the bound is exceeded
/// the entries with the oldest `resolved_at` are dropped.
#[derive(Debug, Clone)]
pub struct HistoryStore<P> {
    limit: NonZeroUsize,
    entries: Vec<ResolvedItem<P>>,
    keys: HashSet<TxKey>,
}

impl<P> HistoryStore<P> {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            limit,
            entries: Vec::with_capacity(limit.get()),
            keys: HashSet::with_capacity(limit.get()),
        }
    }

    /// Adds a batch of resolved items. Later items in `batch` count as newer
    /// than earlier ones, both for deduplication and for ordering ties.
    pub fn add(&mut self, batch: impl IntoIterator<Item = ResolvedItem<P>>) {
        let mut seen = HashSet::new();
        let mut merged: Vec<ResolvedItem<P>> = batch
            .into_iter()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .filter(|item| seen.insert(item.key().clone()))
            .collect();
        if merged.is_empty() {
            return;
        }

        merged.extend(
            std::mem::take(&mut self.entries)
                .into_iter()
                .filter(|item| !seen.contains(item.key())),
        );
        // stable: equal timestamps keep the newer insertion first
        merged.sort_by(|a, b| b.resolved_at().cmp(&a.resolved_at()));
        merged.truncate(self.limit.get());

        self.keys = merged.iter().map(|item| item.key().clone()).collect();
        self.entries = merged;
    }

    /// Most recently resolved first
    pub fn items(&self) -> &[ResolvedItem<P>] {
        &self.entries
    }

    pub fn contains(&self, key: &TxKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn limit(&self) -> NonZeroUsize {
        self.limit
    }
}

impl<P> Default for HistoryStore<P> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
