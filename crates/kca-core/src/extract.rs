//! Cannibalization extraction for a single metric.
//!
//! The extractor is a pure function of (frame, metric, options): it ranks
//! groups by their share of the metric total, keeps the cumulative-share
//! prefix allowed by the threshold, drops rows below the within-group
//! relevance floor, and retains only groups still served by at least two
//! distinct details. Identical inputs produce identical output tables.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use polars::prelude::{Column, DataFrame, NamedFrom, PolarsResult, Series};
use tracing::debug;

use kca_model::{AnalysisOptions, MIN_SHARE_OF_GROUP, ReportSchema};

use crate::error::AnalysisError;
use crate::frame::PerformanceFrame;
use crate::frame_utils::{has_column, numeric_column_f64, optional_numeric_column, string_column};

/// Tolerance on the inclusive cumulative-share boundary, absorbing the
/// rounding error the share divisions accumulate.
const SHARE_BOUNDARY_TOLERANCE: f64 = 1e-9;

/// One metric's extraction: the projected table plus what the caller needs
/// to assemble the report around it.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Metric name, or the merged label for the cross-metric view.
    pub metric: String,
    /// Projection: group, detail, metric, rate, position (when distinct
    /// from the metric), share of total, share within group.
    pub table: DataFrame,
    /// Distinct competing groups in the table.
    pub group_count: usize,
    /// Whether the cumulative-share cut removed at least one group.
    pub truncated: bool,
    /// Rendered line for the run summary.
    pub summary_line: String,
}

#[derive(Debug, Clone)]
struct CandidateRow {
    group: String,
    detail: String,
    metric: f64,
    rate: Option<f64>,
    position: Option<f64>,
    group_sum: f64,
    share_of_total: f64,
    share_of_group: f64,
}

/// Extracts the competing groups for one metric.
///
/// Steps, all deterministic:
/// 1. stable-sort rows by metric descending;
/// 2. per-group sums and shares of the overall total;
/// 3. greedy cumulative prefix over groups ordered by share descending
///    (ties by key ascending): a group is kept while the cumulative share
///    already taken is within the threshold;
/// 4. within kept groups, drop rows below the 10% relevance floor;
/// 5. de-duplicate (group, detail), first occurrence wins;
/// 6. drop groups left with fewer than two distinct details;
/// 7. final order: group sum desc, group asc, metric desc, position asc
///    with absent positions last.
pub fn extract_competitors(
    frame: &PerformanceFrame,
    metric: &str,
    options: &AnalysisOptions,
) -> Result<Extraction, AnalysisError> {
    let threshold = options.share_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(AnalysisError::InvalidThreshold { threshold });
    }
    let schema = frame.schema;
    let df = &frame.data;
    if !has_column(df, metric) {
        return Err(AnalysisError::MissingColumn(metric.to_string()));
    }

    let groups = string_column(df, schema.group_column())?;
    let details = string_column(df, schema.detail_column())?;
    let metrics = numeric_column_f64(df, metric)?;
    let rates = optional_numeric_column(df, schema.rate_column());
    let positions = optional_numeric_column(df, schema.position_column());

    // Null and non-finite metric cells count as zero volume; they fall out
    // at the relevance floor instead of poisoning the sort.
    let mut rows: Vec<CandidateRow> = (0..df.height())
        .map(|idx| CandidateRow {
            group: groups[idx].clone(),
            detail: details[idx].clone(),
            metric: metrics[idx].filter(|v| v.is_finite()).unwrap_or(0.0),
            rate: rates[idx],
            position: positions[idx],
            group_sum: 0.0,
            share_of_total: 0.0,
            share_of_group: 0.0,
        })
        .collect();
    rows.sort_by(|a, b| compare_desc(a.metric, b.metric));

    let mut group_sums: BTreeMap<String, f64> = BTreeMap::new();
    for row in &rows {
        *group_sums.entry(row.group.clone()).or_insert(0.0) += row.metric;
    }
    let total: f64 = group_sums.values().sum();
    if total <= 0.0 {
        let table = project(schema, metric, &[])?;
        return Ok(Extraction {
            metric: metric.to_string(),
            table,
            group_count: 0,
            truncated: false,
            summary_line: summary_line(schema, metric, 0),
        });
    }

    // BTreeMap iteration is key-ascending, so a stable sort on share alone
    // leaves share ties ordered by group key.
    let mut ordered: Vec<(&str, f64)> = group_sums
        .iter()
        .map(|(group, sum)| (group.as_str(), *sum))
        .collect();
    ordered.sort_by(|a, b| compare_desc(a.1, b.1));

    let mut retained: HashMap<&str, f64> = HashMap::new();
    let mut cumulative = 0.0;
    let mut truncated = false;
    for &(group, sum) in &ordered {
        // Inclusive test before adding the group: greedy truncation, so the
        // top group always survives.
        if cumulative <= threshold + SHARE_BOUNDARY_TOLERANCE {
            retained.insert(group, sum);
            cumulative += sum / total;
        } else {
            truncated = true;
            break;
        }
    }

    let mut candidates: Vec<CandidateRow> = Vec::new();
    for mut row in rows {
        let Some(&group_sum) = retained.get(row.group.as_str()) else {
            continue;
        };
        if group_sum <= 0.0 {
            continue;
        }
        let share_of_group = row.metric / group_sum;
        if share_of_group < MIN_SHARE_OF_GROUP {
            continue;
        }
        row.group_sum = group_sum;
        row.share_of_total = group_sum / total;
        row.share_of_group = share_of_group;
        candidates.push(row);
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    candidates.retain(|row| seen.insert((row.group.clone(), row.detail.clone())));

    let mut details_per_group: HashMap<String, usize> = HashMap::new();
    for row in &candidates {
        *details_per_group.entry(row.group.clone()).or_insert(0) += 1;
    }
    candidates.retain(|row| details_per_group[&row.group] >= 2);

    candidates.sort_by(|a, b| {
        compare_desc(a.group_sum, b.group_sum)
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| compare_desc(a.metric, b.metric))
            .then_with(|| compare_positions(a.position, b.position))
    });

    let group_count = candidates
        .iter()
        .map(|row| row.group.as_str())
        .collect::<HashSet<_>>()
        .len();
    let table = project(schema, metric, &candidates)?;
    debug!(
        metric,
        groups = group_count,
        rows = table.height(),
        truncated,
        "extraction complete"
    );
    Ok(Extraction {
        metric: metric.to_string(),
        table,
        group_count,
        truncated,
        summary_line: summary_line(schema, metric, group_count),
    })
}

/// Renders the per-sheet summary line, e.g. `clicks: 3 competing queries`.
pub(crate) fn summary_line(schema: ReportSchema, label: &str, group_count: usize) -> String {
    let noun = if group_count == 1 {
        schema.group_noun()
    } else {
        schema.group_noun_plural()
    };
    format!("{label}: {group_count} competing {noun}")
}

fn compare_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Ascending on position, rows without a position last.
fn compare_positions(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn project(
    schema: ReportSchema,
    metric: &str,
    rows: &[CandidateRow],
) -> PolarsResult<DataFrame> {
    let groups: Vec<String> = rows.iter().map(|row| row.group.clone()).collect();
    let details: Vec<String> = rows.iter().map(|row| row.detail.clone()).collect();
    let metrics: Vec<f64> = rows.iter().map(|row| row.metric).collect();
    let rates: Vec<Option<f64>> = rows.iter().map(|row| row.rate).collect();
    let share_of_total: Vec<f64> = rows.iter().map(|row| row.share_of_total).collect();
    let share_of_group: Vec<f64> = rows.iter().map(|row| row.share_of_group).collect();

    let mut columns: Vec<Column> = vec![
        Series::new(schema.group_column().into(), groups).into(),
        Series::new(schema.detail_column().into(), details).into(),
        Series::new(metric.into(), metrics).into(),
        Series::new(schema.rate_column().into(), rates).into(),
    ];
    // When the position column doubles as the extracted metric it is
    // already present; repeating it would collide.
    if schema.position_column() != metric {
        let positions: Vec<Option<f64>> = rows.iter().map(|row| row.position).collect();
        columns.push(Series::new(schema.position_column().into(), positions).into());
    }
    columns.push(Series::new("share_of_total".into(), share_of_total).into());
    columns.push(Series::new("share_of_group".into(), share_of_group).into());
    DataFrame::new(columns)
}
