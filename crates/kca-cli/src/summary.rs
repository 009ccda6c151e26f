//! Console rendering of a finished run.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use kca_model::FilterCounts;

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    println!("Input: {}", result.input.display());
    if let Some(path) = &result.workbook {
        println!("Workbook: {}", path.display());
    }
    if let Some(path) = &result.summary_json {
        println!("Summary JSON: {}", path.display());
    }
    print_filter_counts(&result.report.summary.filters);

    let noun = result.report.schema.group_noun_plural();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell(&format!("Competing {noun}")),
        header_cell("Rows"),
    ]);
    apply_sheet_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for sheet in &result.report.summary.sheets {
        table.add_row(vec![
            Cell::new(&sheet.label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            count_cell(sheet.competing_groups),
            count_cell(sheet.rows),
        ]);
    }
    println!("{table}");
    for line in &result.report.summary.lines {
        println!("{line}");
    }
}

fn print_filter_counts(counts: &FilterCounts) {
    println!(
        "Rows: {} read, {} analyzed ({} non-ascii dropped, {} non-positive dropped)",
        counts.input_rows,
        counts.retained_rows,
        counts.dropped_non_ascii,
        counts.dropped_non_positive
    );
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_sheet_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
    if table.column_count() >= 3 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(40)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(value: usize) -> Cell {
    if value == 0 {
        dim_cell(value)
    } else {
        Cell::new(value)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
