//! Cross-metric merge of two extractions.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use kca_model::ReportSchema;

use crate::error::AnalysisError;
use crate::extract::{Extraction, summary_line};
use crate::frame_utils::{filter_rows, string_column};

/// Intersects two extractions on (group, detail).
///
/// (group, detail) pairs are unique within each extraction, so the inner
/// join reduces to a membership filter over the first table; only the first
/// source's columns and row order survive. The ≥2-distinct-details rule is
/// re-applied afterwards because the intersection can thin a group below
/// two candidates.
pub fn merge_extractions(
    schema: ReportSchema,
    first: &Extraction,
    second: &Extraction,
) -> Result<Extraction, AnalysisError> {
    let group_col = schema.group_column();
    let detail_col = schema.detail_column();

    let second_groups = string_column(&second.table, group_col)?;
    let second_details = string_column(&second.table, detail_col)?;
    let pairs: HashSet<(&str, &str)> = second_groups
        .iter()
        .map(String::as_str)
        .zip(second_details.iter().map(String::as_str))
        .collect();

    let mut table = first.table.clone();
    let first_groups = string_column(&table, group_col)?;
    let first_details = string_column(&table, detail_col)?;
    let keep: Vec<bool> = first_groups
        .iter()
        .zip(&first_details)
        .map(|(group, detail)| pairs.contains(&(group.as_str(), detail.as_str())))
        .collect();
    filter_rows(&mut table, &keep)?;

    // Post-join rows are still unique on (group, detail), so the row count
    // per group equals its distinct detail count.
    let groups = string_column(&table, group_col)?;
    let mut details_per_group: HashMap<&str, usize> = HashMap::new();
    for group in &groups {
        *details_per_group.entry(group.as_str()).or_insert(0) += 1;
    }
    let keep: Vec<bool> = groups
        .iter()
        .map(|group| details_per_group[group.as_str()] >= 2)
        .collect();
    filter_rows(&mut table, &keep)?;

    let groups = string_column(&table, group_col)?;
    let group_count = groups
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .len();
    let label = schema.merged_label();
    debug!(
        label,
        groups = group_count,
        rows = table.height(),
        "cross-metric merge complete"
    );
    Ok(Extraction {
        metric: label.to_string(),
        table,
        group_count,
        truncated: false,
        summary_line: summary_line(schema, label, group_count),
    })
}
