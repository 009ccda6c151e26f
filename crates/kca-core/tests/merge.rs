//! Tests for the cross-metric merge.

use std::collections::HashSet;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use kca_core::{PerformanceFrame, extract_competitors, frame_utils, merge_extractions};
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

fn pairs_of(table: &DataFrame, group_col: &str, detail_col: &str) -> HashSet<(String, String)> {
    let groups = frame_utils::string_column(table, group_col).expect("group column");
    let details = frame_utils::string_column(table, detail_col).expect("detail column");
    groups.into_iter().zip(details).collect()
}

#[test]
fn merge_drops_groups_thinned_below_two_details() {
    // clicks flags shoes on /a and /b; impressions flags shoes on /a and
    // /c. The intersection holds one pair, so shoes drops out entirely.
    let frame = frame(vec![
        string_col("query", &["shoes", "shoes", "shoes"]),
        string_col("page", &["/a", "/b", "/c"]),
        float_col("clicks", &[Some(60.0), Some(40.0), Some(0.0)]),
        float_col("impressions", &[Some(50.0), Some(4.0), Some(46.0)]),
    ]);
    let options = AnalysisOptions::default();

    let by_clicks = extract_competitors(&frame, "clicks", &options).expect("clicks");
    let by_impressions = extract_competitors(&frame, "impressions", &options).expect("impressions");
    assert_eq!(by_clicks.group_count, 1);
    assert_eq!(by_impressions.group_count, 1);

    let merged = merge_extractions(frame.schema, &by_clicks, &by_impressions).expect("merge");
    assert_eq!(merged.group_count, 0);
    assert_eq!(merged.table.height(), 0);
    assert_eq!(merged.metric, "clicks+impressions");
    insta::assert_snapshot!(merged.summary_line, @"clicks+impressions: 0 competing queries");
}

#[test]
fn merge_keeps_groups_confirmed_by_both_metrics() {
    let frame = frame(vec![
        string_col("query", &["cat food", "cat food"]),
        string_col("page", &["/x", "/y"]),
        float_col("clicks", &[Some(70.0), Some(30.0)]),
        float_col("impressions", &[Some(700.0), Some(300.0)]),
    ]);
    let options = AnalysisOptions::default();

    let by_clicks = extract_competitors(&frame, "clicks", &options).expect("clicks");
    let by_impressions = extract_competitors(&frame, "impressions", &options).expect("impressions");
    let merged = merge_extractions(frame.schema, &by_clicks, &by_impressions).expect("merge");

    assert_eq!(merged.group_count, 1);
    assert_eq!(merged.table.height(), 2);

    // Row order and columns come from the first extraction.
    let pages = frame_utils::string_column(&merged.table, "page").expect("page");
    assert_eq!(pages, vec!["/x", "/y"]);
    let names: Vec<String> = merged
        .table
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    assert!(names.contains(&"clicks".to_string()));
    assert!(!names.contains(&"impressions".to_string()));
}

#[test]
fn merged_pairs_are_a_subset_of_both_extractions() {
    let frame = frame(vec![
        string_col(
            "query",
            &["shoes", "shoes", "shoes", "hats", "hats"],
        ),
        string_col("page", &["/a", "/b", "/c", "/h1", "/h2"]),
        float_col(
            "clicks",
            &[Some(60.0), Some(40.0), Some(0.0), Some(50.0), Some(50.0)],
        ),
        float_col(
            "impressions",
            &[Some(50.0), Some(4.0), Some(46.0), Some(60.0), Some(40.0)],
        ),
    ]);
    let options = AnalysisOptions::default();

    let by_clicks = extract_competitors(&frame, "clicks", &options).expect("clicks");
    let by_impressions = extract_competitors(&frame, "impressions", &options).expect("impressions");
    let merged = merge_extractions(frame.schema, &by_clicks, &by_impressions).expect("merge");

    let merged_pairs = pairs_of(&merged.table, "query", "page");
    let first_pairs = pairs_of(&by_clicks.table, "query", "page");
    let second_pairs = pairs_of(&by_impressions.table, "query", "page");
    assert!(merged_pairs.is_subset(&first_pairs));
    assert!(merged_pairs.is_subset(&second_pairs));

    // hats is confirmed by both metrics; shoes is not.
    let groups = frame_utils::string_column(&merged.table, "query").expect("query");
    assert!(groups.iter().all(|group| group == "hats"));
    assert_eq!(merged.group_count, 1);
}
