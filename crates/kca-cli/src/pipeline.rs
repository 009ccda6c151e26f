//! Pipeline stages behind the `analyze` command.
//!
//! Each stage is a standalone function returning a typed result so the
//! command layer can wrap it in a span and report progress between stages.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use kca_core::{CompetitionReport, PerformanceFrame};
use kca_ingest::read_dataframe;
use kca_report::{default_workbook_path, write_summary_json, write_workbook};

/// Outcome of the ingest stage.
#[derive(Debug)]
pub struct IngestResult {
    pub frame: PerformanceFrame,
    pub rows: usize,
    pub columns: usize,
}

/// Reads the CSV export and detects its column layout.
pub fn ingest(input: &Path) -> Result<IngestResult> {
    let data = read_dataframe(input)?;
    let rows = data.height();
    let columns = data.width();
    let frame = PerformanceFrame::from_frame(data)
        .with_context(|| format!("detect layout of {}", input.display()))?;
    debug!(schema = frame.schema.name(), rows, columns, "export ingested");
    Ok(IngestResult {
        frame,
        rows,
        columns,
    })
}

/// Where the run's artifacts will land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub workbook: PathBuf,
    pub summary_json: Option<PathBuf>,
}

/// Resolves artifact paths from the input path and explicit overrides.
///
/// Without an explicit workbook path the workbook lands next to the input
/// as `<stem>_cannibalization.xlsx`. The JSON summary is only written when
/// a path was given for it.
pub fn resolve_artifact_paths(
    input: &Path,
    workbook: Option<&Path>,
    summary_json: Option<&Path>,
) -> ArtifactPaths {
    ArtifactPaths {
        workbook: workbook.map_or_else(|| default_workbook_path(input), Path::to_path_buf),
        summary_json: summary_json.map(Path::to_path_buf),
    }
}

/// Configuration for the output stage.
#[derive(Debug)]
pub struct OutputConfig<'a> {
    pub paths: &'a ArtifactPaths,
    pub report: &'a CompetitionReport,
    pub dry_run: bool,
}

/// Paths actually written; both stay empty on a dry run.
#[derive(Debug, Default)]
pub struct OutputResult {
    pub workbook: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

/// Writes the workbook and, when requested, the JSON summary sidecar.
pub fn output(config: &OutputConfig<'_>) -> Result<OutputResult> {
    if config.dry_run {
        debug!("dry run, skipping artifact output");
        return Ok(OutputResult::default());
    }
    write_workbook(&config.paths.workbook, config.report)?;
    let mut result = OutputResult {
        workbook: Some(config.paths.workbook.clone()),
        summary_json: None,
    };
    if let Some(path) = &config.paths.summary_json {
        write_summary_json(path, &config.report.summary)?;
        result.summary_json = Some(path.clone());
    }
    Ok(result)
}
