use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Name rendered for items that carry no explicit sub-pool.
pub const IMPLICIT_POOL: &str = "mempool";

/// A transaction identifier, unique within one pending snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxKey(Arc<str>);

impl TxKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TxKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TxKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for TxKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

/// Sub-pool name reported by the chain, e.g. `pending` or `queued`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolLabel(Arc<str>);

impl PoolLabel {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PoolLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One transaction currently observed in a node's pending pool.
///
/// The payload is chain specific and never inspected by the reconciliation
/// logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem<P> {
    pub key: TxKey,
    pub payload: P,
    pub pool: Option<PoolLabel>,
}

impl<P> PendingItem<P> {
    pub fn new(key: impl Into<TxKey>, payload: P) -> Self {
        Self {
            key: key.into(),
            payload,
            pool: None,
        }
    }

    pub fn in_pool(mut self, pool: PoolLabel) -> Self {
        self.pool = Some(pool);
        self
    }

    /// The sub-pool this item belongs to, falling back to [`IMPLICIT_POOL`]
    pub fn pool_name(&self) -> &str {
        self.pool.as_ref().map_or(IMPLICIT_POOL, PoolLabel::as_str)
    }
}

/// Canonical form of a fetched pending set
pub type PendingSnapshot<P> = HashMap<TxKey, PendingItem<P>>;

/// Terminal classification of a transaction that left the pending pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TxStatus {
    /// Included in a block and executed successfully
    Success,
    /// Included in a block but execution failed
    Failed,
    /// Left the pool without being included
    Evicted,
    /// Could not be classified because the lookups kept failing
    Unknown,
}

impl TxStatus {
    /// Whether the status reflects on-chain fact rather than lookup failure
    pub const fn is_definitive(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Per-key answer from a chain adapter's batch lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxLookup {
    NotFound,
    Included { succeeded: bool, height: u64 },
    /// The transaction was found but its execution result could not be read
    Indeterminate,
}

impl TxLookup {
    pub const fn status(self) -> TxStatus {
        match self {
            Self::NotFound => TxStatus::Evicted,
            Self::Included {
                succeeded: true, ..
            } => TxStatus::Success,
            Self::Included {
                succeeded: false, ..
            } => TxStatus::Failed,
            Self::Indeterminate => TxStatus::Unknown,
        }
    }
}

/// A [`PendingItem`] that has left the pending pool.
///
/// `resolved_height` is only ever present for [`TxStatus::Success`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem<P> {
    item: PendingItem<P>,
    status: TxStatus,
    resolved_at: DateTime<Utc>,
    resolved_height: Option<u64>,
}

impl<P> ResolvedItem<P> {
    pub fn new(item: PendingItem<P>, lookup: TxLookup, resolved_at: DateTime<Utc>) -> Self {
        let resolved_height = match lookup {
            TxLookup::Included {
                succeeded: true,
                height,
            } => Some(height),
            _ => None,
        };
        Self {
            item,
            status: lookup.status(),
            resolved_at,
            resolved_height,
        }
    }

    pub const fn unknown(item: PendingItem<P>, resolved_at: DateTime<Utc>) -> Self {
        Self {
            item,
            status: TxStatus::Unknown,
            resolved_at,
            resolved_height: None,
        }
    }

    pub const fn key(&self) -> &TxKey {
        &self.item.key
    }

    pub const fn item(&self) -> &PendingItem<P> {
        &self.item
    }

    pub const fn status(&self) -> TxStatus {
        self.status
    }

    pub const fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    pub const fn resolved_height(&self) -> Option<u64> {
        self.resolved_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator as _;

    #[rstest]
    #[case(TxLookup::NotFound, TxStatus::Evicted, None)]
    #[case(TxLookup::Included { succeeded: true, height: 100 }, TxStatus::Success, Some(100))]
    #[case(TxLookup::Included { succeeded: false, height: 7 }, TxStatus::Failed, None)]
    #[case(TxLookup::Indeterminate, TxStatus::Unknown, None)]
    fn lookup_classification(
        #[case] lookup: TxLookup,
        #[case] status: TxStatus,
        #[case] height: Option<u64>,
    ) {
        let resolved = ResolvedItem::new(PendingItem::new("A", ()), lookup, Utc::now());
        assert_eq!(resolved.status(), status);
        assert_eq!(resolved.resolved_height(), height);
    }

    #[test]
    fn only_unknown_is_indefinite() {
        let indefinite: Vec<_> = TxStatus::iter().filter(|s| !s.is_definitive()).collect();
        assert_eq!(indefinite, vec![TxStatus::Unknown]);
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(TxStatus::Evicted.to_string(), "evicted");
        assert_eq!(TxStatus::Success.to_string(), "success");
    }

    #[test]
    fn missing_pool_renders_as_mempool() {
        let item = PendingItem::new("A", ());
        assert_eq!(item.pool_name(), IMPLICIT_POOL);
        let queued = item.in_pool(PoolLabel::new("queued"));
        assert_eq!(queued.pool_name(), "queued");
    }
}
