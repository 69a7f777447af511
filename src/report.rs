//! CSV rendering of per-item approval summaries.

use std::io::Write;

use crate::events::SummaryRecord;

/// Which column set a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFlavor {
    /// The original latency report.
    #[default]
    Standard,
    /// Latency plus the rework classification columns.
    Rework,
}

const STANDARD_HEADER: [&str; 11] = [
    "Type",
    "Issue",
    "Status",
    "BU",
    "Product",
    "Year",
    "Week",
    "Later Approved Count",
    "Later Approved Weeks",
    "Latency(Days)",
    "Rejected prior to 1st approval",
];

const REWORK_HEADER: [&str; 6] = [
    "Approved first time",
    "Quarter",
    "Rework Week",
    "Rework Quarter",
    "Rework Year",
    "Rework subsequent approvals",
];

/// Write a header row plus one data row per record.
///
/// Row order is whatever the caller hands over; the aggregation is
/// hash-keyed, so callers should not expect stability across runs.
pub fn write_report<W: Write>(
    out: W,
    records: &[SummaryRecord],
    flavor: ReportFlavor,
) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = STANDARD_HEADER.to_vec();
    if flavor == ReportFlavor::Rework {
        header.extend(REWORK_HEADER);
    }
    writer.write_record(&header)?;

    for record in records {
        writer.write_record(&row_cells(record, flavor))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render subsequent approval weeks the way the reports always have:
/// `W23:W26`.
fn week_list(weeks: &[u32]) -> String {
    weeks
        .iter()
        .map(|week| format!("W{week}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn row_cells(record: &SummaryRecord, flavor: ReportFlavor) -> Vec<String> {
    let mut cells = vec![
        record.meta.spec_type.clone(),
        record.meta.item_key.clone(),
        record.meta.status.clone(),
        record.meta.business_unit.clone(),
        record.meta.product.clone(),
        record.approval_year.to_string(),
        record.first_week.to_string(),
        record.subsequent_weeks.len().to_string(),
        week_list(&record.subsequent_weeks),
        record.latency_days.to_string(),
        record.rejections_before_first_approval.to_string(),
    ];

    if flavor == ReportFlavor::Rework {
        let first_time = if record.rejections_before_first_approval == 0 {
            "yes"
        } else {
            "no"
        };
        cells.push(first_time.to_string());
        cells.push(record.quarter.to_string());
        match &record.rework {
            Some(rework) => {
                cells.push(format!("W{}", rework.week));
                cells.push(rework.quarter.to_string());
                cells.push(rework.year.to_string());
                cells.push(rework.later_approvals.to_string());
            }
            None => {
                for _ in 0..4 {
                    cells.push(String::new());
                }
            }
        }
    }

    cells
}
