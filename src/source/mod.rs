//! Event-source adapters and the seam the reconstruction core consumes.

pub mod export;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::RawRecord;

/// A place approval/rejection notices can be pulled from.
///
/// Adapters do acquisition only; anything record-level that fails to parse
/// is filtered later by the normalizer.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every raw marker hit the source holds. Acquisition problems
    /// are fatal for the run.
    async fn fetch_all_raw_records(&self) -> Result<Vec<RawRecord>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read export file: {source}")]
    ExportRead {
        #[from]
        source: std::io::Error,
    },
    #[error("malformed export data: {source}")]
    ExportParse {
        #[from]
        source: csv::Error,
    },
    #[error("tracker API error: {source}")]
    Api {
        #[from]
        source: octocrab::Error,
    },
    #[error("tracker credentials missing: {0}")]
    CredentialsMissing(String),
}
