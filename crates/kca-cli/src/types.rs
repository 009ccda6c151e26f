use std::path::PathBuf;

use kca_core::CompetitionReport;

#[derive(Debug)]
pub struct RunResult {
    pub input: PathBuf,
    pub report: CompetitionReport,
    pub workbook: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}
