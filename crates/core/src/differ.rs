use crate::{
    history::HistoryStore,
    types::{PendingSnapshot, TxKey},
};

pub struct SnapshotDiffer;

impl SnapshotDiffer {
    /// Keys present in `previous` but absent from `next`, sorted.
    ///
    /// Keys already recorded in `history` are skipped so a departure is
    /// never resolved twice.
    pub fn departed<P, H>(
        previous: &PendingSnapshot<P>,
        next: &PendingSnapshot<P>,
        history: &HistoryStore<H>,
    ) -> Vec<TxKey> {
        let mut departed: Vec<TxKey> = previous
            .keys()
            .filter(|key| !next.contains_key(*key) && !history.contains(key))
            .cloned()
            .collect();
        departed.sort_unstable();
        departed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PendingItem, ResolvedItem, TxLookup};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn snapshot(keys: &[&str]) -> PendingSnapshot<()> {
        keys.iter()
            .map(|key| (TxKey::new(key), PendingItem::new(*key, ())))
            .collect()
    }

    #[rstest]
    #[case::first_tick(&[], &["A", "B"], &[])]
    #[case::unchanged(&["A", "B"], &["B", "A"], &[])]
    #[case::one_left(&["A", "B", "C"], &["B", "C"], &["A"])]
    #[case::drained(&["C", "A", "B"], &[], &["A", "B", "C"])]
    #[case::churn(&["A", "B"], &["C", "D"], &["A", "B"])]
    fn departed_keys(#[case] previous: &[&str], #[case] next: &[&str], #[case] expected: &[&str]) {
        let history = HistoryStore::<()>::default();
        let departed = SnapshotDiffer::departed(&snapshot(previous), &snapshot(next), &history);
        let expected: Vec<TxKey> = expected.iter().map(TxKey::new).collect();
        assert_eq!(departed, expected);
    }

    #[test]
    fn keys_already_in_history_are_skipped() {
        let mut history = HistoryStore::default();
        history.add([ResolvedItem::new(
            PendingItem::new("A", ()),
            TxLookup::NotFound,
            Utc::now(),
        )]);

        let departed =
            SnapshotDiffer::departed(&snapshot(&["A", "B"]), &snapshot(&[]), &history);
        assert_eq!(departed, vec![TxKey::new("B")]);
    }
}
