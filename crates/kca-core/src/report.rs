//! End-to-end analysis and report assembly.

use polars::prelude::DataFrame;
use tracing::debug;

use kca_model::{AnalysisOptions, AnalysisSummary, ReportSchema, SheetCounts};

use crate::error::AnalysisError;
use crate::extract::extract_competitors;
use crate::filter::apply_row_filters;
use crate::frame::PerformanceFrame;
use crate::merge::merge_extractions;

/// One sheet of the assembled report.
#[derive(Debug, Clone)]
pub struct ReportSheet {
    /// Worksheet title, `Competing by <metric-or-merged-label>`.
    pub label: String,
    pub table: DataFrame,
    pub group_count: usize,
}

/// The assembled report: one sheet per metric plus the merged view, and
/// the run summary.
#[derive(Debug, Clone)]
pub struct CompetitionReport {
    pub schema: ReportSchema,
    pub sheets: Vec<ReportSheet>,
    pub summary: AnalysisSummary,
}

/// Sheet label prefix shared by the report and the workbook writer.
pub const SHEET_LABEL_PREFIX: &str = "Competing by ";

/// Runs the full analysis: filters, both extractions, the merge, and
/// report assembly.
///
/// Fails with [`AnalysisError::ThresholdTooLow`] when both extractions
/// came back empty and at least one lost groups to the cumulative-share
/// cut; raising the threshold can then surface results. When nothing was
/// cut, an empty report is a valid "no cannibalization found" outcome and
/// assembly succeeds with zero-count summary lines.
pub fn analyze(
    frame: &PerformanceFrame,
    options: &AnalysisOptions,
) -> Result<CompetitionReport, AnalysisError> {
    let schema = frame.schema;
    let outcome = apply_row_filters(frame, options)?;
    let [first_metric, second_metric] = schema.metric_pair();
    let first = extract_competitors(&outcome.frame, first_metric, options)?;
    let second = extract_competitors(&outcome.frame, second_metric, options)?;

    if first.group_count == 0 && second.group_count == 0 && (first.truncated || second.truncated) {
        return Err(AnalysisError::ThresholdTooLow {
            percent: options.threshold_percent(),
            noun: schema.group_noun_plural(),
        });
    }

    let merged = merge_extractions(schema, &first, &second)?;

    let mut summary =
        AnalysisSummary::new(schema.name(), options.threshold_percent(), outcome.counts);
    let mut sheets = Vec::with_capacity(3);
    for extraction in [first, second, merged] {
        summary.push_sheet(
            SheetCounts {
                label: extraction.metric.clone(),
                competing_groups: extraction.group_count,
                rows: extraction.table.height(),
            },
            extraction.summary_line.clone(),
        );
        sheets.push(ReportSheet {
            label: format!("{SHEET_LABEL_PREFIX}{}", extraction.metric),
            table: extraction.table,
            group_count: extraction.group_count,
        });
    }

    debug!(
        schema = schema.name(),
        threshold_percent = summary.threshold_percent,
        sheets = sheets.len(),
        "report assembled"
    );
    Ok(CompetitionReport {
        schema,
        sheets,
        summary,
    })
}
