// Signoff Library - Approval-Cycle Reporting
// This exposes the core components for testing and integration

pub mod config;
pub mod events;
pub mod report;
pub mod source;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, init_config, SignoffConfig, TrackerConfig};
pub use events::{summarize_records, ItemMetadata, RawRecord, SummaryRecord, WorkflowEvent};
pub use report::{write_report, ReportFlavor};
pub use source::export::{ExportColumns, ExportSource};
pub use source::remote::RemoteSource;
pub use source::{EventSource, SourceError};
pub use telemetry::init_telemetry;
