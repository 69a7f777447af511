//! Bulk adapter over a pre-exported tracker dump.

use std::fs::File;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{EventSource, SourceError};
use crate::events::normalize::{classify_marker, parse_event_date};
use crate::events::RawRecord;

/// Column positions of the semantic fields inside the dump.
///
/// The export is wide (a thousand-plus positional columns), so the mapping
/// is configuration: a re-export with shifted columns is a config edit, not
/// a code change.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportColumns {
    pub issue: usize,
    pub status: usize,
    pub created: usize,
    pub business_unit: usize,
    pub product: usize,
    pub spec_type: usize,
}

impl Default for ExportColumns {
    fn default() -> Self {
        Self {
            issue: 1,
            status: 4,
            created: 20,
            business_unit: 604,
            product: 629,
            spec_type: 1096,
        }
    }
}

/// Reads a positional CSV dump and surfaces every cell that carries an
/// approval/rejection marker, restricted to events dated in the target
/// year.
#[derive(Debug, Clone)]
pub struct ExportSource {
    path: PathBuf,
    columns: ExportColumns,
    target_year: i32,
}

impl ExportSource {
    pub fn new(path: impl Into<PathBuf>, columns: ExportColumns, target_year: i32) -> Self {
        Self {
            path: path.into(),
            columns,
            target_year,
        }
    }

    fn scan_row(&self, row: &csv::StringRecord) -> Vec<RawRecord> {
        let mut hits = Vec::new();
        for cell in row.iter() {
            if classify_marker(cell).is_none() {
                continue;
            }
            let Some(first_line) = cell.lines().next() else {
                continue;
            };
            // The year gate needs the date up front; the normalizer will
            // re-check it from the same text later.
            let Some(event_date) = parse_event_date(first_line) else {
                warn!(date = first_line, "event date not parsed, cell skipped");
                continue;
            };
            if event_date.year() != self.target_year {
                continue;
            }
            match self.raw_record(row, cell, first_line) {
                Some(record) => hits.push(record),
                None => warn!(
                    row_len = row.len(),
                    "row shorter than configured columns, record skipped"
                ),
            }
        }
        hits
    }

    fn raw_record(
        &self,
        row: &csv::StringRecord,
        cell: &str,
        first_line: &str,
    ) -> Option<RawRecord> {
        let column = |index: usize| row.get(index).map(str::to_string);
        Some(RawRecord {
            item_key: column(self.columns.issue)?,
            free_text: cell.to_string(),
            event_date_text: first_line.to_string(),
            cycle_week_text: None,
            spec_type: column(self.columns.spec_type)?,
            status: column(self.columns.status)?,
            business_unit: column(self.columns.business_unit)?,
            product: column(self.columns.product)?,
            created_text: column(self.columns.created)?,
        })
    }
}

#[async_trait]
impl EventSource for ExportSource {
    async fn fetch_all_raw_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.extend(self.scan_row(&row));
        }

        info!(
            records = records.len(),
            path = %self.path.display(),
            "export scan complete"
        );
        Ok(records)
    }
}
