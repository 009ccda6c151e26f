//! Row-wise DataFrame helpers shared by the pipeline stages.

use polars::prelude::{
    AnyValue, BooleanChunked, DataFrame, NewChunkedArray, PolarsResult,
};

use kca_ingest::{any_to_f64, any_to_string};

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// All values of a column rendered as trimmed strings, nulls as empty.
pub fn string_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let series = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = any_to_string(series.get(idx).unwrap_or(AnyValue::Null));
        values.push(value.trim().to_string());
    }
    Ok(values)
}

/// All values of a column as `Option<f64>`, non-numeric cells as None.
pub fn numeric_column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        values.push(any_to_f64(value));
    }
    Ok(values)
}

/// Like [`numeric_column_f64`] but an absent column yields all-None, for
/// auxiliary columns the projection carries through when present.
pub fn optional_numeric_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    match numeric_column_f64(df, name) {
        Ok(values) => values,
        Err(_) => vec![None; df.height()],
    }
}

/// Keeps the rows flagged true, preserving order.
pub fn filter_rows(df: &mut DataFrame, keep: &[bool]) -> PolarsResult<()> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    *df = df.filter(&mask)?;
    Ok(())
}
