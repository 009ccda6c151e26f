use std::time::Instant;

use anyhow::Result;
use comfy_table::Table;
use tracing::{info, info_span};

use kca_core::analyze;
use kca_model::{AnalysisOptions, KeyFilterMode, ReportSchema};

use crate::cli::AnalyzeArgs;
use crate::pipeline::{IngestResult, OutputConfig, ingest, output, resolve_artifact_paths};
use crate::summary::apply_table_style;
use crate::types::RunResult;

pub fn run_analyze(args: &AnalyzeArgs) -> Result<RunResult> {
    let run_span = info_span!("analyze", input = %args.input.display());
    let _run_guard = run_span.enter();

    let options = AnalysisOptions::default()
        .with_threshold(f64::from(args.threshold) / 100.0)
        .with_key_filter(if args.keep_non_ascii {
            KeyFilterMode::AllowAll
        } else {
            KeyFilterMode::AsciiOnly
        });

    // =========================================================================
    // Stage 1: Ingest - Read the export and detect its layout
    // =========================================================================
    let ingest_span = info_span!("ingest", input = %args.input.display());
    let ingest_start = Instant::now();
    let IngestResult {
        frame,
        rows,
        columns,
    } = ingest_span.in_scope(|| ingest(&args.input))?;
    info!(
        schema = frame.schema.name(),
        rows,
        columns,
        duration_ms = ingest_start.elapsed().as_millis(),
        "ingest complete"
    );

    // =========================================================================
    // Stage 2: Extract - Filters, both metric extractions, the merge
    // =========================================================================
    let extract_span = info_span!(
        "extract",
        schema = frame.schema.name(),
        threshold_percent = args.threshold
    );
    let extract_start = Instant::now();
    let report = extract_span.in_scope(|| analyze(&frame, &options))?;
    info!(
        sheets = report.sheets.len(),
        retained_rows = report.summary.filters.retained_rows,
        duration_ms = extract_start.elapsed().as_millis(),
        "analysis complete"
    );

    // =========================================================================
    // Stage 3: Output - Write the workbook and optional JSON summary
    // =========================================================================
    let paths = resolve_artifact_paths(
        &args.input,
        args.output.as_deref(),
        args.summary_json.as_deref(),
    );
    let output_span = info_span!("output", workbook = %paths.workbook.display());
    let output_start = Instant::now();
    let written = output_span.in_scope(|| {
        output(&OutputConfig {
            paths: &paths,
            report: &report,
            dry_run: args.dry_run,
        })
    })?;
    info!(
        dry_run = args.dry_run,
        duration_ms = output_start.elapsed().as_millis(),
        "output complete"
    );

    Ok(RunResult {
        input: args.input.clone(),
        report,
        workbook: written.workbook,
        summary_json: written.summary_json,
    })
}

pub fn run_schemas() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Schema", "Group", "Detail", "Metrics", "Rate"]);
    apply_table_style(&mut table);
    for schema in [ReportSchema::SearchConsole, ReportSchema::ExternalTool] {
        table.add_row(vec![
            schema.name().to_string(),
            schema.group_column().to_string(),
            schema.detail_column().to_string(),
            format!("{}, {}", schema.primary_metric(), schema.secondary_metric()),
            schema.rate_column().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
