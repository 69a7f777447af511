//! Turns raw marker hits into canonical events.
//!
//! Every piece of free-text layout knowledge (marker phrasing, date format,
//! week token shape) lives in this module so nothing downstream depends on
//! how the tracker words its notices.

use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use super::{ItemMetadata, RawRecord, WorkflowEvent};

pub const APPROVED_MARKER: &str = "Approved in ";
pub const REJECTED_MARKER: &str = "Rejected in ";

/// Letter prefixing cycle-week tokens, as in `W32`.
pub const CYCLE_WEEK_PREFIX: char = 'W';

/// Date layout used across the tracker: `10/Jan/22`.
pub const EVENT_DATE_FORMAT: &str = "%d/%b/%y";

/// Which notice a fragment of tracker text announces, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Approved,
    Rejected,
}

pub fn classify_marker(text: &str) -> Option<Notice> {
    if text.contains(APPROVED_MARKER) {
        Some(Notice::Approved)
    } else if text.contains(REJECTED_MARKER) {
        Some(Notice::Rejected)
    } else {
        None
    }
}

/// Parse the leading whitespace-delimited token of `text` as a tracker
/// date. Fields often carry a time-of-day suffix after the date; only the
/// calendar date matters here.
pub fn parse_event_date(text: &str) -> Option<NaiveDate> {
    let token = text.split_whitespace().next()?;
    NaiveDate::parse_from_str(token, EVENT_DATE_FORMAT).ok()
}

pub struct Normalizer {
    week_token: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            week_token: Regex::new(r"W(\d+)").expect("week token pattern is a valid regex"),
        }
    }

    /// Pull the cycle week out of a pre-split token or the free text.
    fn cycle_week(&self, raw: &RawRecord) -> Option<u32> {
        if let Some(token) = &raw.cycle_week_text {
            return token.trim().parse().ok();
        }
        self.week_token
            .captures(&raw.free_text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Turn one raw marker hit into a canonical event plus the metadata
    /// snapshot for its item.
    ///
    /// Unparseable records are skipped with a diagnostic. A bad date is
    /// never replaced by a sentinel; the record simply does not exist as
    /// far as the aggregation is concerned.
    pub fn normalize(&self, raw: &RawRecord) -> Option<(WorkflowEvent, ItemMetadata)> {
        let notice = classify_marker(&raw.free_text)?;

        let Some(occurred_at) = parse_event_date(&raw.event_date_text) else {
            warn!(
                item = %raw.item_key,
                date = %raw.event_date_text,
                "event date not parsed, record skipped"
            );
            return None;
        };

        let event = match notice {
            Notice::Approved => {
                let Some(week) = self.cycle_week(raw) else {
                    warn!(
                        item = %raw.item_key,
                        "approval without a readable cycle week, event skipped"
                    );
                    return None;
                };
                WorkflowEvent::Approved { occurred_at, week }
            }
            Notice::Rejected => WorkflowEvent::Rejected { occurred_at },
        };

        let Some(created_at) = parse_event_date(&raw.created_text) else {
            warn!(
                item = %raw.item_key,
                date = %raw.created_text,
                "created date not parsed, record skipped"
            );
            return None;
        };

        Some((
            event,
            ItemMetadata {
                item_key: raw.item_key.clone(),
                spec_type: raw.spec_type.clone(),
                status: raw.status.clone(),
                business_unit: raw.business_unit.clone(),
                product: raw.product.clone(),
                created_at,
            },
        ))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
