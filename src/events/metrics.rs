//! Latency, quarter, and year derivation for reconstructed histories.

use chrono::{Datelike, Months, NaiveDate};

use super::aggregate::ApprovalHistory;
use super::{ItemMetadata, ReworkSummary, SummaryRecord};

/// Weeks per fiscal quarter under the 52.14-week year the reports bucket by.
const WEEKS_PER_QUARTER: f64 = 13.04;

/// Whole days between creation and first approval.
///
/// Negative values pass through untouched; an approval recorded before the
/// item's creation is a data-quality signal the report should surface, not
/// clamp away.
pub fn latency_days(created: NaiveDate, first_approved: NaiveDate) -> i64 {
    (first_approved - created).num_days()
}

/// Fiscal-quarter bucket for a cycle week.
pub fn quarter_for_week(week: u32) -> u32 {
    (f64::from(week) / WEEKS_PER_QUARTER) as u32 + 1
}

/// Reporting year for a first approval.
///
/// Late-cycle weeks (> 12) can belong to a fiscal period that spills over a
/// calendar-year boundary (week 52 items get signed off in January), so the
/// year is read off the date shifted back one month. Low weeks use the
/// date's own year.
pub fn approval_year(approved_on: NaiveDate, week: u32) -> i32 {
    if week > 12 {
        approved_on
            .checked_sub_months(Months::new(1))
            .unwrap_or(approved_on)
            .year()
    } else {
        approved_on.year()
    }
}

/// Combine an item's metadata and reconstructed history into a report row.
pub fn derive(meta: ItemMetadata, history: &ApprovalHistory) -> SummaryRecord {
    let rework = history.rework.map(|rework| ReworkSummary {
        occurred_at: rework.approval.occurred_at,
        week: rework.approval.week,
        quarter: quarter_for_week(rework.approval.week),
        year: rework.approval.occurred_at.year(),
        later_approvals: rework.later_approvals,
    });

    SummaryRecord {
        first_approved_on: history.first.occurred_at,
        first_week: history.first.week,
        approval_year: approval_year(history.first.occurred_at, history.first.week),
        quarter: quarter_for_week(history.first.week),
        latency_days: latency_days(meta.created_at, history.first.occurred_at),
        rejections_before_first_approval: history.rejections_before_first,
        subsequent_weeks: history.resubmissions.iter().map(|a| a.week).collect(),
        rework,
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::aggregate::{Approval, Rework};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn latency_spans_year_boundaries() {
        assert_eq!(latency_days(date(2021, 12, 1), date(2022, 1, 10)), 40);
    }

    #[test]
    fn latency_can_go_negative() {
        assert_eq!(latency_days(date(2022, 2, 1), date(2022, 1, 22)), -10);
    }

    #[test]
    fn quarter_buckets() {
        assert_eq!(quarter_for_week(1), 1);
        assert_eq!(quarter_for_week(2), 1);
        assert_eq!(quarter_for_week(13), 1);
        assert_eq!(quarter_for_week(14), 2);
        assert_eq!(quarter_for_week(26), 2);
        assert_eq!(quarter_for_week(27), 3);
        assert_eq!(quarter_for_week(45), 4);
        assert_eq!(quarter_for_week(52), 4);
    }

    #[test]
    fn low_week_year_is_the_approval_year() {
        assert_eq!(approval_year(date(2022, 1, 10), 2), 2022);
        assert_eq!(approval_year(date(2022, 1, 10), 12), 2022);
    }

    #[test]
    fn high_week_year_steps_back_a_month() {
        // A week-52 item approved in January belongs to the prior year.
        assert_eq!(approval_year(date(2022, 1, 10), 52), 2021);
        // One month back from March stays inside the same year.
        assert_eq!(approval_year(date(2022, 3, 1), 45), 2022);
        assert_eq!(approval_year(date(2022, 1, 10), 13), 2021);
    }

    #[test]
    fn derive_fills_every_field() {
        let meta = ItemMetadata {
            item_key: "SPEC-1".to_string(),
            spec_type: "Functional".to_string(),
            status: "Done".to_string(),
            business_unit: "Payments".to_string(),
            product: "Gateway".to_string(),
            created_at: date(2021, 12, 1),
        };
        let history = ApprovalHistory {
            first: Approval { occurred_at: date(2022, 1, 10), week: 2 },
            rejections_before_first: 2,
            resubmissions: vec![Approval { occurred_at: date(2022, 7, 1), week: 26 }],
            rework: Some(Rework {
                approval: Approval { occurred_at: date(2022, 7, 1), week: 26 },
                later_approvals: 0,
            }),
        };

        let record = derive(meta, &history);
        assert_eq!(record.latency_days, 40);
        assert_eq!(record.approval_year, 2022);
        assert_eq!(record.quarter, 1);
        assert_eq!(record.rejections_before_first_approval, 2);
        assert_eq!(record.subsequent_weeks, vec![26]);

        let rework = record.rework.unwrap();
        assert_eq!(rework.week, 26);
        assert_eq!(rework.quarter, 2);
        assert_eq!(rework.year, 2022);
        assert_eq!(rework.later_approvals, 0);
    }
}
