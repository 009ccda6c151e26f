//! Run summary returned alongside the assembled report.
//!
//! The summary is a value, not a printed side effect: callers decide
//! whether to render it to a console table, serialize it to JSON, or both.

use serde::{Deserialize, Serialize};

/// Row counts recorded while filtering the input table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    /// Rows in the ingested table before any filtering.
    pub input_rows: usize,
    /// Rows dropped because the group key contained non-ASCII characters.
    pub dropped_non_ascii: usize,
    /// Rows dropped because the primary metric was zero or negative.
    pub dropped_non_positive: usize,
    /// Rows surviving both filters.
    pub retained_rows: usize,
}

/// Counts for one sheet of the assembled report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCounts {
    /// Metric label the sheet was built from, e.g. `clicks` or
    /// `clicks+impressions`.
    pub label: String,
    /// Distinct competing groups on the sheet.
    pub competing_groups: usize,
    /// Total rows on the sheet.
    pub rows: usize,
}

/// What the analysis found, in renderable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Short schema name, e.g. `search-console`.
    pub schema: String,
    /// Share threshold applied, as a whole percentage.
    pub threshold_percent: f64,
    /// Row counts from the filtering stage.
    pub filters: FilterCounts,
    /// Per-sheet counts, in sheet order.
    pub sheets: Vec<SheetCounts>,
    /// One human-readable line per sheet, e.g.
    /// `clicks: 3 competing queries`.
    pub lines: Vec<String>,
}

impl AnalysisSummary {
    /// Summary with no sheets recorded yet.
    pub fn new(schema: impl Into<String>, threshold_percent: f64, filters: FilterCounts) -> Self {
        Self {
            schema: schema.into(),
            threshold_percent,
            filters,
            sheets: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Record one sheet's counts and its rendered line.
    pub fn push_sheet(&mut self, counts: SheetCounts, line: String) {
        self.sheets.push(counts);
        self.lines.push(line);
    }

    /// All summary lines joined for plain-text output.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
