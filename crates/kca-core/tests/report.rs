//! End-to-end analysis tests: filters, both extractions, merge, assembly.

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use kca_core::{AnalysisError, PerformanceFrame, analyze};
use kca_model::AnalysisOptions;

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

fn frame(columns: Vec<Column>) -> PerformanceFrame {
    let df = DataFrame::new(columns).expect("build test frame");
    PerformanceFrame::from_frame(df).expect("detect schema")
}

fn pet_shop_frame() -> PerformanceFrame {
    // dog toys carries the largest share of both metrics but only one
    // page; cat food competes across two pages.
    frame(vec![
        string_col("query", &["cat food", "cat food", "dog toys"]),
        string_col("page", &["/cats", "/pets", "/dogs"]),
        float_col("clicks", &[Some(100.0), Some(50.0), Some(200.0)]),
        float_col("impressions", &[Some(1000.0), Some(500.0), Some(4000.0)]),
    ])
}

#[test]
fn assembles_three_sheets_with_labels_and_summary() {
    let options = AnalysisOptions::default().with_threshold(1.0);
    let report = analyze(&pet_shop_frame(), &options).expect("analyze");

    let labels: Vec<&str> = report
        .sheets
        .iter()
        .map(|sheet| sheet.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Competing by clicks",
            "Competing by impressions",
            "Competing by clicks+impressions"
        ]
    );
    assert_eq!(report.sheets[0].group_count, 1);
    assert_eq!(report.sheets[1].group_count, 1);
    assert_eq!(report.sheets[2].group_count, 1);
    assert_eq!(report.sheets[2].table.height(), 2);

    assert_eq!(report.summary.schema, "search-console");
    assert!((report.summary.threshold_percent - 100.0).abs() < 1e-9);
    assert_eq!(report.summary.filters.input_rows, 3);
    assert_eq!(report.summary.filters.retained_rows, 3);
    insta::assert_snapshot!(report.summary.render(), @r"
    clicks: 1 competing query
    impressions: 1 competing query
    clicks+impressions: 1 competing query
    ");
}

#[test]
fn low_threshold_with_truncation_is_an_error() {
    let options = AnalysisOptions::default().with_threshold(0.3);
    let err = analyze(&pet_shop_frame(), &options).expect_err("must fail");
    assert_eq!(
        err.to_string(),
        "no competing queries found within the top 30% of traffic; raise the threshold and rerun"
    );
    match err {
        AnalysisError::ThresholdTooLow { percent, noun } => {
            assert!((percent - 30.0).abs() < 1e-6);
            assert_eq!(noun, "queries");
        }
        other => panic!("expected ThresholdTooLow, got {other:?}"),
    }
}

#[test]
fn empty_without_truncation_is_a_valid_report() {
    // Every query is served by a single page: nothing competes, nothing
    // was cut, so the report is legitimately empty.
    let frame = frame(vec![
        string_col("query", &["cat food", "dog toys"]),
        string_col("page", &["/cats", "/dogs"]),
        float_col("clicks", &[Some(100.0), Some(50.0)]),
        float_col("impressions", &[Some(400.0), Some(200.0)]),
    ]);
    let options = AnalysisOptions::default().with_threshold(1.0);

    let report = analyze(&frame, &options).expect("analyze");
    assert!(report.sheets.iter().all(|sheet| sheet.group_count == 0));
    assert!(report.sheets.iter().all(|sheet| sheet.table.height() == 0));
    insta::assert_snapshot!(report.summary.render(), @r"
    clicks: 0 competing queries
    impressions: 0 competing queries
    clicks+impressions: 0 competing queries
    ");
}

#[test]
fn filter_drops_are_counted_in_the_summary() {
    let frame = frame(vec![
        string_col("query", &["cat food", "cat food", "café", "dog toys"]),
        string_col("page", &["/cats", "/pets", "/fr", "/dogs"]),
        float_col(
            "clicks",
            &[Some(100.0), Some(50.0), Some(80.0), Some(0.0)],
        ),
        float_col(
            "impressions",
            &[Some(1000.0), Some(500.0), Some(800.0), Some(100.0)],
        ),
    ]);
    let options = AnalysisOptions::default().with_threshold(1.0);

    let report = analyze(&frame, &options).expect("analyze");
    assert_eq!(report.summary.filters.input_rows, 4);
    assert_eq!(report.summary.filters.dropped_non_ascii, 1);
    assert_eq!(report.summary.filters.dropped_non_positive, 1);
    assert_eq!(report.summary.filters.retained_rows, 2);
    assert_eq!(report.sheets[0].group_count, 1);
}

#[test]
fn summary_serializes_for_the_json_sidecar() {
    let options = AnalysisOptions::default().with_threshold(1.0);
    let report = analyze(&pet_shop_frame(), &options).expect("analyze");

    let json = serde_json::to_string(&report.summary).expect("serialize summary");
    assert!(json.contains("\"schema\":\"search-console\""));
    assert!(json.contains("\"label\":\"clicks+impressions\""));
}
