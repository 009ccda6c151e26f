//! JSON sidecar for the machine-readable run summary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use kca_model::AnalysisSummary;

const SUMMARY_SCHEMA: &str = "kca.analysis-summary";
const SUMMARY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct SummaryPayload<'a> {
    schema: &'static str,
    schema_version: u32,
    generated_at: String,
    summary: &'a AnalysisSummary,
}

/// Writes the run summary as pretty-printed JSON at `path`.
pub fn write_summary_json(path: &Path, summary: &AnalysisSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }
    let payload = SummaryPayload {
        schema: SUMMARY_SCHEMA,
        schema_version: SUMMARY_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        summary,
    };
    let json = serde_json::to_string_pretty(&payload)
        .with_context(|| format!("serialize summary for {}", path.display()))?;
    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
