pub mod error;
pub mod extract;
pub mod filter;
pub mod frame;
pub mod frame_utils;
pub mod merge;
pub mod report;

pub use error::AnalysisError;
pub use extract::{Extraction, extract_competitors};
pub use filter::{FilterOutcome, apply_row_filters};
pub use frame::PerformanceFrame;
pub use merge::merge_extractions;
pub use report::{CompetitionReport, ReportSheet, SHEET_LABEL_PREFIX, analyze};
