//! Persisted artifacts for the cannibalization analysis.
//!
//! Two writers: the spreadsheet workbook (one worksheet per report sheet,
//! competing rows highlighted) and an optional JSON sidecar carrying the
//! machine-readable run summary.

mod summary;
mod workbook;

pub use summary::write_summary_json;
pub use workbook::{default_workbook_path, write_workbook};
