//! Tests for the XLSX workbook writer: part layout, worksheet rendering,
//! styles, and title handling.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use zip::ZipArchive;

use kca_core::{CompetitionReport, ReportSheet};
use kca_model::{AnalysisSummary, FilterCounts, ReportSchema};
use kca_report::{default_workbook_path, write_workbook};

fn string_col(name: &str, values: &[&str]) -> Column {
    Series::new(
        name.into(),
        values.iter().copied().map(String::from).collect::<Vec<_>>(),
    )
    .into_column()
}

fn float_col(name: &str, values: &[Option<f64>]) -> Column {
    Series::new(name.into(), values.to_vec()).into_column()
}

fn sheet(label: &str, table: DataFrame) -> ReportSheet {
    ReportSheet {
        label: label.to_string(),
        table,
        group_count: 1,
    }
}

fn report_with(sheets: Vec<ReportSheet>) -> CompetitionReport {
    CompetitionReport {
        schema: ReportSchema::SearchConsole,
        sheets,
        summary: AnalysisSummary::new("search-console", 80.0, FilterCounts::default()),
    }
}

fn small_table() -> DataFrame {
    DataFrame::new(vec![
        string_col("query", &["cat food"]),
        string_col("page", &["/cats"]),
        float_col("clicks", &[Some(150.0)]),
    ])
    .expect("build table")
}

fn read_part(path: &Path, name: &str) -> String {
    let file = File::open(path).expect("open workbook");
    let mut archive = ZipArchive::new(file).expect("read archive");
    let mut part = archive.by_name(name).expect("find part");
    let mut contents = String::new();
    part.read_to_string(&mut contents).expect("read part");
    contents
}

#[test]
fn workbook_contains_standard_parts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let report = report_with(vec![
        sheet("Competing by clicks", small_table()),
        sheet("Competing by impressions", small_table()),
        sheet("Competing by clicks+impressions", small_table()),
    ]);
    write_workbook(&path, &report).expect("write workbook");

    let file = File::open(&path).expect("open workbook");
    let archive = ZipArchive::new(file).expect("read archive");
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/app.xml",
            "docProps/core.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
            "xl/worksheets/sheet2.xml",
            "xl/worksheets/sheet3.xml",
        ]
    );
}

#[test]
fn worksheet_renders_header_and_highlighted_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let report = report_with(vec![sheet("Competing by clicks", small_table())]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "xl/worksheets/sheet1.xml");
    insta::assert_snapshot!(contents, @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
      <sheetData>
        <row r="1">
          <c r="A1" s="1" t="inlineStr">
            <is>
              <t>query</t>
            </is>
          </c>
          <c r="B1" s="1" t="inlineStr">
            <is>
              <t>page</t>
            </is>
          </c>
          <c r="C1" s="1" t="inlineStr">
            <is>
              <t>clicks</t>
            </is>
          </c>
        </row>
        <row r="2">
          <c r="A2" s="2" t="inlineStr">
            <is>
              <t>cat food</t>
            </is>
          </c>
          <c r="B2" s="2" t="inlineStr">
            <is>
              <t>/cats</t>
            </is>
          </c>
          <c r="C2" s="2">
            <v>150</v>
          </c>
        </row>
      </sheetData>
    </worksheet>
    "#);
}

#[test]
fn null_cells_keep_the_row_fill() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let table = DataFrame::new(vec![
        string_col("query", &["cat food"]),
        string_col("page", &["/cats"]),
        float_col("clicks", &[Some(150.0)]),
        float_col("ctr", &[None]),
    ])
    .expect("build table");
    let report = report_with(vec![sheet("Competing by clicks", table)]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(contents.contains(r#"<c r="D2" s="2"/>"#));
}

#[test]
fn reserved_characters_are_escaped() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let table = DataFrame::new(vec![
        string_col("query", &["cats & dogs"]),
        string_col("page", &["/pets?sort=<rank>"]),
        float_col("clicks", &[Some(10.0)]),
    ])
    .expect("build table");
    let report = report_with(vec![sheet("Competing by clicks", table)]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(contents.contains("<t>cats &amp; dogs</t>"));
    assert!(contents.contains("<t>/pets?sort=&lt;rank&gt;</t>"));
}

#[test]
fn workbook_part_lists_sheet_titles() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let report = report_with(vec![
        sheet("Competing by clicks", small_table()),
        sheet("Competing by impressions", small_table()),
        sheet("Competing by clicks+impressions", small_table()),
    ]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "xl/workbook.xml");
    assert!(contents.contains(r#"name="Competing by clicks" sheetId="1""#));
    assert!(contents.contains(r#"name="Competing by impressions" sheetId="2""#));
    assert!(contents.contains(r#"name="Competing by clicks+impressions" sheetId="3""#));
}

#[test]
fn styles_define_bold_header_and_competing_fill() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let report = report_with(vec![sheet("Competing by clicks", small_table())]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "xl/styles.xml");
    assert!(contents.contains(r#"<fgColor rgb="FFC6EFCE"/>"#));
    assert!(contents.contains(r#"patternType="solid""#));
    assert!(contents.contains(r#"applyFill="1""#));
    assert!(contents.contains("<b/>"));
}

#[test]
fn core_properties_carry_creation_timestamps() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let report = report_with(vec![sheet("Competing by clicks", small_table())]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "docProps/core.xml");
    assert!(contents.contains("<dc:creator>kca</dc:creator>"));
    assert!(contents.contains(r#"xsi:type="dcterms:W3CDTF""#));
}

#[test]
fn empty_table_writes_header_only() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.xlsx");
    let table = DataFrame::new(vec![
        string_col("query", &[]),
        string_col("page", &[]),
        float_col("clicks", &[]),
    ])
    .expect("build table");
    let report = report_with(vec![sheet("Competing by clicks", table)]);
    write_workbook(&path, &report).expect("write workbook");

    let contents = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(contents.contains(r#"<row r="1">"#));
    assert!(!contents.contains(r#"<row r="2">"#));
}

#[test]
fn default_path_appends_cannibalization_suffix() {
    let path = default_workbook_path(Path::new("/data/june.csv"));
    assert_eq!(path, PathBuf::from("/data/june_cannibalization.xlsx"));
}
