//! Display-ready panels built from engine snapshots and stream buffers.

use std::collections::BTreeMap;
use xray_chains::{cosmos::models::CosmosTransaction, eth::models::EthTransaction};
use xray_core::{types::IMPLICIT_POOL, EngineSnapshot, TxKey, TxStatus};

/// Rows shown per panel
pub const MAX_ROWS: usize = 8;

/// One-line description of a chain payload
pub trait TxSummary {
    fn summary(&self, key: &TxKey) -> String;
}

impl TxSummary for EthTransaction {
    fn summary(&self, key: &TxKey) -> String {
        format!(
            "{} | N:{} | G:{}",
            shorten_hash(key.as_str()),
            self.nonce,
            format_gas(self.gas)
        )
    }
}

impl TxSummary for CosmosTransaction {
    fn summary(&self, key: &TxKey) -> String {
        let sequence = self
            .sequence
            .map_or_else(|| "?".to_owned(), |seq| seq.to_string());
        format!(
            "{} | {} | {}",
            shorten_hash(key.as_str()),
            self.message_summary(),
            sequence
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Pending,
    Resolved(TxStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub title: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorView {
    pub name: String,
    pub panels: Vec<Panel>,
    pub error: Option<String>,
}

impl MonitorView {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panels: Vec::new(),
            error: None,
        }
    }
}

/// `0x1234...abcd`; hashes of ten characters or fewer are left intact
pub fn shorten_hash(hash: &str) -> String {
    if hash.len() <= 10 || !hash.is_ascii() {
        return hash.to_owned();
    }
    format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}

pub fn format_gas(gas: u64) -> String {
    if gas >= 1_000_000 {
        format!("{:.1}M", gas as f64 / 1_000_000.0)
    } else if gas >= 1_000 {
        format!("{:.1}K", gas as f64 / 1_000.0)
    } else {
        gas.to_string()
    }
}

pub const fn status_glyph(status: TxStatus) -> &'static str {
    match status {
        TxStatus::Success => "✓",
        TxStatus::Failed => "✗",
        TxStatus::Evicted => "⚠",
        TxStatus::Unknown => "?",
    }
}

/// Builds one panel per pool plus a `Completed` panel. Pools named in
/// `always_shown` get a panel even when empty.
pub fn polling_view<P: TxSummary>(
    name: &str,
    snapshot: &EngineSnapshot<P>,
    always_shown: &[&str],
) -> MonitorView {
    let mut pools: BTreeMap<&str, Vec<Row>> = always_shown
        .iter()
        .map(|pool| (*pool, Vec::new()))
        .collect();
    for item in &snapshot.pending {
        pools.entry(item.pool_name()).or_default().push(Row {
            text: item.payload.summary(&item.key),
            tone: Tone::Pending,
        });
    }

    let mut panels: Vec<Panel> = pools
        .into_iter()
        .map(|(pool, mut rows)| {
            let title = if pool == IMPLICIT_POOL {
                format!("Mempool ({} txs)", rows.len())
            } else {
                format!("Pool: {} ({} txs)", pool, rows.len())
            };
            rows.truncate(MAX_ROWS);
            Panel { title, rows }
        })
        .collect();

    let completed = snapshot
        .history
        .iter()
        .take(MAX_ROWS)
        .map(|resolved| {
            let mut text = format!(
                "{} {}",
                status_glyph(resolved.status()),
                resolved.item().payload.summary(resolved.key())
            );
            if let Some(height) = resolved.resolved_height() {
                text.push_str(&format!(" | Height {height}"));
            }
            Row {
                text,
                tone: Tone::Resolved(resolved.status()),
            }
        })
        .collect();
    panels.push(Panel {
        title: format!("Completed ({})", snapshot.history.len()),
        rows: completed,
    });

    MonitorView {
        name: name.to_owned(),
        panels,
        error: snapshot.status.last_error.clone(),
    }
}

pub fn stream_view(name: &str, recent: &[EthTransaction], error: Option<String>) -> MonitorView {
    let rows = recent
        .iter()
        .take(MAX_ROWS)
        .map(|tx| Row {
            text: tx.summary(&tx.key()),
            tone: Tone::Pending,
        })
        .collect();

    MonitorView {
        name: name.to_owned(),
        panels: vec![Panel {
            title: "Pending Transactions".to_owned(),
            rows,
        }],
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use xray_core::{EngineStatus, PendingItem, PoolLabel, ResolvedItem, TxLookup};

    impl TxSummary for String {
        fn summary(&self, key: &TxKey) -> String {
            format!("{key} {self}")
        }
    }

    #[rstest]
    #[case("0x1234567890abcdef", "0x1234...cdef")]
    #[case("0x12345678", "0x12345678")]
    #[case("", "")]
    fn test_shorten_hash(#[case] hash: &str, #[case] expected: &str) {
        assert_eq!(shorten_hash(hash), expected);
    }

    #[rstest]
    #[case(21_000, "21.0K")]
    #[case(1_500_000, "1.5M")]
    #[case(999, "999")]
    fn test_format_gas(#[case] gas: u64, #[case] expected: &str) {
        assert_eq!(format_gas(gas), expected);
    }

    fn snapshot() -> EngineSnapshot<String> {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        EngineSnapshot {
            pending: vec![
                PendingItem::new("A", "a".to_owned()).in_pool(PoolLabel::new("pending")),
                PendingItem::new("B", "b".to_owned()).in_pool(PoolLabel::new("basefee")),
            ],
            history: vec![
                ResolvedItem::new(
                    PendingItem::new("C", "c".to_owned()),
                    TxLookup::Included {
                        succeeded: true,
                        height: 100,
                    },
                    at,
                ),
                ResolvedItem::unknown(PendingItem::new("D", "d".to_owned()), at),
            ],
            status: EngineStatus {
                last_error: Some("connection refused".to_owned()),
                ..EngineStatus::default()
            },
        }
    }

    #[test]
    fn test_cosmos_summary() {
        let key = TxKey::new("FD4279DE85971FAD30BBF8A416118D596B1D18DD021724E110C64CFAA252B70D");
        let mut tx = CosmosTransaction {
            size: 135,
            messages: vec![
                "/cosmos.bank.v1beta1.MsgSend".to_owned(),
                "/cosmos.staking.v1beta1.MsgDelegate".to_owned(),
            ],
            sequence: Some(42),
        };
        assert_eq!(tx.summary(&key), "FD4279...B70D | MsgSend +1 more | 42");

        tx.sequence = None;
        tx.messages.truncate(1);
        assert_eq!(tx.summary(&key), "FD4279...B70D | MsgSend | ?");
    }

    #[test]
    fn test_polling_view_panels() {
        let view = polling_view("Ethereum", &snapshot(), &["pending", "queued"]);

        let titles: Vec<&str> = view.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Pool: basefee (1 txs)",
                "Pool: pending (1 txs)",
                "Pool: queued (0 txs)",
                "Completed (2)",
            ]
        );
        let completed = &view.panels[3].rows;
        assert_eq!(completed[0].text, "✓ C c | Height 100");
        assert_eq!(completed[0].tone, Tone::Resolved(TxStatus::Success));
        assert_eq!(completed[1].text, "? D d");
        assert_eq!(view.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_implicit_pool_is_titled_mempool() {
        let snapshot = EngineSnapshot::<String> {
            pending: vec![PendingItem::new("A", "a".to_owned())],
            history: Vec::new(),
            status: EngineStatus::default(),
        };
        let view = polling_view("Cosmos", &snapshot, &[IMPLICIT_POOL]);
        assert_eq!(view.panels[0].title, "Mempool (1 txs)");
        assert_eq!(view.panels.len(), 2);
    }

    #[test]
    fn test_rows_are_capped() {
        let snapshot = EngineSnapshot::<String> {
            pending: (0..20)
                .map(|n| PendingItem::new(format!("K{n:02}"), String::new()))
                .collect(),
            history: Vec::new(),
            status: EngineStatus::default(),
        };
        let view = polling_view("Cosmos", &snapshot, &[]);
        assert_eq!(view.panels[0].title, "Mempool (20 txs)");
        assert_eq!(view.panels[0].rows.len(), MAX_ROWS);
    }
}
