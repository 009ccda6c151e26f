pub mod error;
pub mod options;
pub mod schema;
pub mod summary;

pub use error::SchemaError;
pub use options::{AnalysisOptions, DEFAULT_THRESHOLD_PERCENT, KeyFilterMode, MIN_SHARE_OF_GROUP};
pub use schema::ReportSchema;
pub use summary::{AnalysisSummary, FilterCounts, SheetCounts};
