//! Analysis errors.

use polars::error::PolarsError;
use thiserror::Error;

use kca_model::SchemaError;

/// Errors surfaced by the analysis pipeline.
///
/// Data-quality problems (non-ASCII keys, non-positive metrics) are not
/// errors; they are filtered silently and counted. Everything here halts
/// the run, with [`AnalysisError::ThresholdTooLow`] recoverable by rerunning
/// at a higher threshold.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input headers match no supported layout.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The share threshold is outside `(0, 1]`.
    #[error("share threshold {threshold} is out of range (expected 0 < threshold <= 1)")]
    InvalidThreshold { threshold: f64 },
    /// A column the selected schema requires is absent.
    #[error("required column '{0}' is missing from the input")]
    MissingColumn(String),
    /// The cumulative-share cut removed every group that could have
    /// competed. Distinct from a legitimately empty report: here raising
    /// the threshold can surface results.
    #[error(
        "no competing {noun} found within the top {percent:.0}% of traffic; raise the threshold and rerun"
    )]
    ThresholdTooLow { percent: f64, noun: &'static str },
    /// Column access or frame reconstruction failed.
    #[error(transparent)]
    Frame(#[from] PolarsError),
}
