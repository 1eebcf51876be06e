//! Context Window Selector: picks the past records a turn may draw on.
//!
//! Pure and infallible: no matching history is a valid, empty window.

use chrono::{DateTime, Utc};
use meetwise_core::memory::MemoryRecord;
use crate::limits::WindowSpec;
use crate::text::truncate_chars;

/// One selected record, possibly truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowItem {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    /// Whether `value` was cut to fit the window's per-item cap
    pub truncated: bool,
}

/// A bounded, ordered selection of past records, most recent first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PastContextWindow {
    items: Vec<WindowItem>,
    item_cap: usize,
}

impl PastContextWindow {
    /// A window with nothing in it.
    pub fn empty(item_cap: usize) -> Self {
        Self {
            items: Vec::new(),
            item_cap,
        }
    }

    pub fn items(&self) -> &[WindowItem] {
        &self.items
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_cap(&self) -> usize {
        self.item_cap
    }

    /// How many items were cut to fit.
    pub fn truncated_count(&self) -> usize {
        self.items.iter().filter(|item| item.truncated).count()
    }

    /// The newest item.
    pub fn most_recent(&self) -> Option<&WindowItem> {
        self.items.first()
    }

    /// Everything but the newest item, still most recent first.
    pub fn older(&self) -> &[WindowItem] {
        self.items.get(1..).unwrap_or(&[])
    }
}

/// Select the records tagged `spec.tag`, newest first, at most `spec.max_count`,
/// each value cut to `spec.item_cap` characters.
///
/// Records are ordered by `created_at`; records sharing a timestamp keep
/// store order, so the later-written one counts as more recent.
pub fn select_window(records: &[MemoryRecord], spec: &WindowSpec) -> PastContextWindow {
    let mut matching: Vec<&MemoryRecord> = records
        .iter()
        .filter(|record| record.tool_used() == Some(spec.tag.as_str()))
        .collect();

    // Stable, so equal timestamps keep write order.
    matching.sort_by_key(|record| record.created_at);

    let items = matching
        .into_iter()
        .rev()
        .take(spec.max_count)
        .map(|record| {
            let (value, truncated) = truncate_chars(&record.value, spec.item_cap);
            WindowItem {
                key: record.key.clone(),
                value,
                created_at: record.created_at,
                truncated,
            }
        })
        .collect();

    PastContextWindow {
        items,
        item_cap: spec.item_cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::char_len;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn spec(max_count: usize, item_cap: usize) -> WindowSpec {
        WindowSpec {
            tag: "summarization".into(),
            max_count,
            item_cap,
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn summary(value: &str, minutes: i64) -> MemoryRecord {
        MemoryRecord::new("interaction:summarization", value)
            .with_extra("tool_used", "summarization")
            .at(at(minutes))
    }

    #[test]
    fn empty_history_gives_empty_window() {
        let window = select_window(&[], &spec(3, 1200));
        assert!(window.is_empty());
        assert!(window.most_recent().is_none());
        assert!(window.older().is_empty());
    }

    #[test]
    fn filters_by_tag_and_ignores_untagged() {
        let records = vec![
            summary("kept", 1),
            MemoryRecord::new("interaction:followup", "email").with_extra("tool_used", "followup"),
            MemoryRecord::new("user_preferences", "bullets please"),
            MemoryRecord::new("odd", "numeric tag").with_extra("tool_used", 1),
        ];
        let window = select_window(&records, &spec(3, 1200));
        assert_eq!(window.values().collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn newest_first_and_capped_count() {
        let records = vec![
            summary("jan", 1),
            summary("apr", 4),
            summary("feb", 2),
            summary("mar", 3),
        ];
        let window = select_window(&records, &spec(3, 1200));
        assert_eq!(window.values().collect::<Vec<_>>(), vec!["apr", "mar", "feb"]);
        assert_eq!(window.most_recent().unwrap().value, "apr");
        assert_eq!(window.older().len(), 2);
    }

    #[test]
    fn later_write_wins_timestamp_tie() {
        let records = vec![summary("first write", 5), summary("second write", 5)];
        let window = select_window(&records, &spec(1, 1200));
        assert_eq!(window.values().collect::<Vec<_>>(), vec!["second write"]);
    }

    #[test]
    fn long_prior_summary_cut_to_comparison_cap() {
        let records = vec![summary(&"x".repeat(3000), 1)];
        let window = select_window(&records, &spec(3, 2000));
        let item = &window.items()[0];
        assert_eq!(char_len(&item.value), 2000);
        assert!(item.truncated);
        assert_eq!(window.truncated_count(), 1);
    }

    proptest! {
        #[test]
        fn window_respects_count_and_item_caps(
            values in proptest::collection::vec(".{0,300}", 0..12),
            offsets in proptest::collection::vec(0i64..20, 12),
            max_count in 1usize..6,
            item_cap in 4usize..200,
        ) {
            let records: Vec<MemoryRecord> = values
                .iter()
                .zip(offsets.iter())
                .map(|(v, m)| summary(v, *m))
                .collect();
            let window = select_window(&records, &spec(max_count, item_cap));
            prop_assert!(window.len() <= max_count);
            prop_assert!(window.len() <= records.len());
            for item in window.items() {
                prop_assert!(char_len(&item.value) <= item_cap);
            }
            for pair in window.items().windows(2) {
                prop_assert!(pair[0].created_at >= pair[1].created_at);
            }
        }
    }
}
