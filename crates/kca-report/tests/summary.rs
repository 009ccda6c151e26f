//! Tests for the JSON run-summary sidecar.

use kca_model::{AnalysisSummary, FilterCounts, SheetCounts};
use kca_report::write_summary_json;

fn sample_summary() -> AnalysisSummary {
    let filters = FilterCounts {
        input_rows: 10,
        dropped_non_ascii: 1,
        dropped_non_positive: 2,
        retained_rows: 7,
    };
    let mut summary = AnalysisSummary::new("search-console", 80.0, filters);
    summary.push_sheet(
        SheetCounts {
            label: "clicks".to_string(),
            competing_groups: 2,
            rows: 5,
        },
        "clicks: 2 competing queries".to_string(),
    );
    summary
}

#[test]
fn sidecar_wraps_the_summary_in_a_versioned_payload() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("summary.json");
    write_summary_json(&path, &sample_summary()).expect("write summary");

    let contents = std::fs::read_to_string(&path).expect("read summary");
    assert!(contents.ends_with('\n'));

    let value: serde_json::Value = serde_json::from_str(&contents).expect("parse summary");
    assert_eq!(value["schema"], "kca.analysis-summary");
    assert_eq!(value["schema_version"], 1);
    assert!(value["generated_at"].is_string());
    assert_eq!(value["summary"]["schema"], "search-console");
    assert_eq!(value["summary"]["threshold_percent"], 80.0);
    assert_eq!(value["summary"]["filters"]["dropped_non_ascii"], 1);
    assert_eq!(value["summary"]["sheets"][0]["label"], "clicks");
    assert_eq!(value["summary"]["lines"][0], "clicks: 2 competing queries");
}

#[test]
fn sidecar_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested/out/summary.json");
    write_summary_json(&path, &sample_summary()).expect("write summary");
    assert!(path.exists());
}
