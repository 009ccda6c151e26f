//! Row filters applied before extraction.
//!
//! Both filters drop rows silently; drops are counted and logged at debug
//! level but never become errors. Each filter is order-preserving and the
//! outcome is a new frame, leaving the input untouched.

use tracing::debug;

use kca_model::{AnalysisOptions, FilterCounts, KeyFilterMode};

use crate::error::AnalysisError;
use crate::frame::PerformanceFrame;
use crate::frame_utils::{filter_rows, has_column, numeric_column_f64, string_column};

/// The filtered frame plus per-filter drop counts.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub frame: PerformanceFrame,
    pub counts: FilterCounts,
}

/// Applies the group-key and metric filters in sequence.
///
/// 1. Under [`KeyFilterMode::AsciiOnly`], rows whose group key contains
///    non-ASCII characters are dropped; `AllowAll` skips this filter.
/// 2. Rows whose primary metric is null, non-numeric, or not strictly
///    positive are dropped.
pub fn apply_row_filters(
    frame: &PerformanceFrame,
    options: &AnalysisOptions,
) -> Result<FilterOutcome, AnalysisError> {
    let schema = frame.schema;
    let metric = schema.primary_metric();
    if !has_column(&frame.data, metric) {
        return Err(AnalysisError::MissingColumn(metric.to_string()));
    }

    let mut data = frame.data.clone();
    let input_rows = data.height();

    let dropped_non_ascii = match options.key_filter {
        KeyFilterMode::AsciiOnly => {
            let keys = string_column(&data, schema.group_column())?;
            let keep: Vec<bool> = keys.iter().map(|key| key.is_ascii()).collect();
            let dropped = keep.iter().filter(|flag| !**flag).count();
            if dropped > 0 {
                filter_rows(&mut data, &keep)?;
            }
            dropped
        }
        KeyFilterMode::AllowAll => 0,
    };

    let values = numeric_column_f64(&data, metric)?;
    let keep: Vec<bool> = values
        .iter()
        .map(|value| matches!(value, Some(v) if v.is_finite() && *v > 0.0))
        .collect();
    let dropped_non_positive = keep.iter().filter(|flag| !**flag).count();
    if dropped_non_positive > 0 {
        filter_rows(&mut data, &keep)?;
    }

    let counts = FilterCounts {
        input_rows,
        dropped_non_ascii,
        dropped_non_positive,
        retained_rows: data.height(),
    };
    debug!(
        schema = schema.name(),
        input_rows,
        dropped_non_ascii,
        dropped_non_positive,
        retained_rows = counts.retained_rows,
        "row filters applied"
    );

    Ok(FilterOutcome {
        frame: frame.with_data(data),
        counts,
    })
}
