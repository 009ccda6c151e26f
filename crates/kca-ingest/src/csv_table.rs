//! CSV ingestion for performance exports.
//!
//! Reads a rectangular CSV export into a [`CsvTable`] with normalized
//! headers, then types it into a polars `DataFrame`: a column becomes
//! `Float64` when every non-empty cell parses as a number, otherwise it
//! stays `String`. Percentage cells like `5.3%` count as numeric and are
//! stored as fractions, which keeps Search Console `ctr` exports usable as
//! a rate column.

use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use polars::prelude::*;

use crate::polars_utils::parse_f64;

/// A raw CSV table: normalized headers plus string cells, row-major.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Lower-cases a header and collapses interior whitespace.
///
/// Export tools disagree on header casing (`Query` vs `query`) and some
/// prepend a BOM to the first header; detection downstream relies on the
/// normalized form.
fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut normalized = String::new();
    let mut parts = trimmed.split_whitespace();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized.to_lowercase()
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads a CSV file into a [`CsvTable`].
///
/// The first record is the header row. Fully-empty records are skipped;
/// short records are padded with empty cells and long ones truncated to the
/// header width.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read csv headers: {}", path.display()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let mut row = Vec::with_capacity(headers.len());
        for idx in 0..headers.len() {
            let value = record.get(idx).unwrap_or("");
            row.push(normalize_cell(value));
        }
        rows.push(row);
    }

    tracing::debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "csv table read"
    );
    Ok(CsvTable { headers, rows })
}

/// Types a [`CsvTable`] into a polars `DataFrame`.
///
/// Per column: if at least one cell is non-empty and every non-empty cell
/// parses via [`parse_f64`], the column is `Float64` with empty cells as
/// nulls; otherwise it is a `String` column carrying the cells verbatim.
pub fn dataframe_from_table(table: &CsvTable) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.headers.len());
    for (col_idx, header) in table.headers.iter().enumerate() {
        let cells: Vec<&str> = table
            .rows
            .iter()
            .map(|row| row.get(col_idx).map(String::as_str).unwrap_or(""))
            .collect();
        let non_empty = cells.iter().filter(|cell| !cell.trim().is_empty()).count();
        let numeric = non_empty > 0
            && cells
                .iter()
                .filter(|cell| !cell.trim().is_empty())
                .all(|cell| parse_f64(cell).is_some());
        let column = if numeric {
            let values: Vec<Option<f64>> = cells.iter().map(|cell| parse_f64(cell)).collect();
            Series::new(header.as_str().into(), values).into()
        } else {
            let values: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();
            Series::new(header.as_str().into(), values).into()
        };
        columns.push(column);
    }
    let df = DataFrame::new(columns).context("build dataframe from csv table")?;
    Ok(df)
}

/// Reads a CSV file straight into a typed `DataFrame`.
pub fn read_dataframe(path: &Path) -> Result<DataFrame> {
    let table = read_csv_table(path)?;
    dataframe_from_table(&table)
}
