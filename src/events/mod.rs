//! Event reconstruction: raw tracker records in, per-item approval
//! summaries out.

pub mod aggregate;
pub mod metrics;
pub mod normalize;

use std::collections::HashMap;

use chrono::NaiveDate;

pub use aggregate::{Approval, ApprovalHistory, Rework};
pub use normalize::Normalizer;

/// A single approval-workflow event attached to a tracked item.
///
/// Approved notices always carry the review-cycle week they were signed off
/// in; rejection notices never do in the sources we read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    Approved { occurred_at: NaiveDate, week: u32 },
    Rejected { occurred_at: NaiveDate },
}

impl WorkflowEvent {
    pub fn occurred_at(&self) -> NaiveDate {
        match self {
            Self::Approved { occurred_at, .. } | Self::Rejected { occurred_at } => *occurred_at,
        }
    }
}

/// Item-level fields snapshotted from the first record seen for that item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub item_key: String,
    pub spec_type: String,
    pub status: String,
    pub business_unit: String,
    pub product: String,
    pub created_at: NaiveDate,
}

/// One marker hit as handed over by a source adapter, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub item_key: String,
    /// The text fragment the approval/rejection marker was found in.
    pub free_text: String,
    pub event_date_text: String,
    /// Cycle-week token with the `W` prefix already stripped, when the
    /// adapter extracts it separately from the free text.
    pub cycle_week_text: Option<String>,
    pub spec_type: String,
    pub status: String,
    pub business_unit: String,
    pub product: String,
    pub created_text: String,
}

/// Fully derived per-item report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub meta: ItemMetadata,
    pub first_approved_on: NaiveDate,
    pub first_week: u32,
    pub approval_year: i32,
    pub quarter: u32,
    pub latency_days: i64,
    pub rejections_before_first_approval: u32,
    /// Cycle weeks of every approval after the first, in date order.
    pub subsequent_weeks: Vec<u32>,
    pub rework: Option<ReworkSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReworkSummary {
    pub occurred_at: NaiveDate,
    pub week: u32,
    pub quarter: u32,
    pub year: i32,
    /// Approvals recorded after the rework event.
    pub later_approvals: u32,
}

/// Run the whole reconstruction over a batch of raw records.
///
/// Grouping is hash-keyed, so row order is arbitrary across runs. Items
/// that never reached an approval produce no row.
pub fn summarize_records(records: &[RawRecord]) -> Vec<SummaryRecord> {
    let normalizer = Normalizer::new();
    let mut events: HashMap<String, Vec<WorkflowEvent>> = HashMap::new();
    let mut metadata: HashMap<String, ItemMetadata> = HashMap::new();

    for raw in records {
        let Some((event, meta)) = normalizer.normalize(raw) else {
            continue;
        };
        events.entry(meta.item_key.clone()).or_default().push(event);
        metadata.entry(meta.item_key.clone()).or_insert(meta);
    }

    let mut summaries = Vec::with_capacity(events.len());
    for (key, item_events) in events {
        let Some(meta) = metadata.remove(&key) else {
            continue;
        };
        let Some(history) = aggregate::reconstruct(item_events) else {
            tracing::debug!(item = %key, "no approval recorded, item dropped");
            continue;
        };
        summaries.push(metrics::derive(meta, &history));
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(item: &str, text: &str, date: &str, created: &str) -> RawRecord {
        RawRecord {
            item_key: item.to_string(),
            free_text: text.to_string(),
            event_date_text: date.to_string(),
            created_text: created.to_string(),
            spec_type: "Functional".to_string(),
            status: "Done".to_string(),
            business_unit: "Payments".to_string(),
            product: "Gateway".to_string(),
            ..RawRecord::default()
        }
    }

    #[test]
    fn items_without_approvals_are_dropped() {
        let records = vec![raw("SPEC-1", "Rejected in W3", "20/Jan/22", "01/Jan/22")];
        assert!(summarize_records(&records).is_empty());
    }

    #[test]
    fn metadata_comes_from_the_first_record_seen() {
        let mut second = raw("SPEC-2", "Approved in W8", "25/Feb/22", "01/Jan/22");
        second.business_unit = "Risk".to_string();
        let records = vec![
            raw("SPEC-2", "Rejected in W5", "01/Feb/22", "01/Jan/22"),
            second,
        ];
        let summaries = summarize_records(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].meta.business_unit, "Payments");
    }

    #[test]
    fn unparseable_records_do_not_poison_the_batch() {
        let records = vec![
            raw("SPEC-3", "Approved in W8", "not-a-date", "01/Jan/22"),
            raw("SPEC-3", "Approved in W9", "04/Mar/22", "01/Jan/22"),
        ];
        let summaries = summarize_records(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].first_week, 9);
    }
}
