//! A performance table paired with its detected schema.

use polars::prelude::DataFrame;

use kca_model::{ReportSchema, SchemaError};

/// An ingested performance table whose layout has been identified.
///
/// The schema is detected once from the column headers and travels with the
/// data; downstream stages read column names off the schema instead of
/// re-inspecting the table.
#[derive(Debug, Clone)]
pub struct PerformanceFrame {
    pub schema: ReportSchema,
    pub data: DataFrame,
}

impl PerformanceFrame {
    /// Pairs an already-detected schema with a table.
    pub fn new(schema: ReportSchema, data: DataFrame) -> Self {
        Self { schema, data }
    }

    /// Detects the schema from the frame's column names and wraps the
    /// table. Headers are expected lower-cased, as the ingest layer
    /// produces them.
    pub fn from_frame(data: DataFrame) -> Result<Self, SchemaError> {
        let headers: Vec<String> = data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let schema = ReportSchema::detect(&headers)?;
        Ok(Self { schema, data })
    }

    pub fn row_count(&self) -> usize {
        self.data.height()
    }

    /// The same schema over a derived table.
    pub fn with_data(&self, data: DataFrame) -> Self {
        Self {
            schema: self.schema,
            data,
        }
    }
}
