//! Tuning knobs for a single analysis run.

use serde::{Deserialize, Serialize};

/// Default share-of-traffic threshold, in percent.
///
/// Matching the usual operating point for cannibalization reviews: the
/// queries that together account for the top 80% of each metric.
pub const DEFAULT_THRESHOLD_PERCENT: u8 = 80;

/// Share of a group's metric total a row must reach to count as a
/// competing candidate.
pub const MIN_SHARE_OF_GROUP: f64 = 0.10;

/// How group keys with unusual characters are treated during row
/// filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyFilterMode {
    /// Drop rows whose group key contains any non-ASCII character.
    #[default]
    AsciiOnly,
    /// Keep every group key regardless of character set.
    AllowAll,
}

/// Options controlling filtering and extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Cumulative share of total traffic to retain, in `(0.0, 1.0]`.
    pub share_threshold: f64,
    /// Treatment of non-ASCII group keys.
    pub key_filter: KeyFilterMode,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            share_threshold: f64::from(DEFAULT_THRESHOLD_PERCENT) / 100.0,
            key_filter: KeyFilterMode::default(),
        }
    }
}

impl AnalysisOptions {
    /// Options with the given cumulative share threshold.
    pub fn with_threshold(mut self, share_threshold: f64) -> Self {
        self.share_threshold = share_threshold;
        self
    }

    /// Options with the given key filter mode.
    pub fn with_key_filter(mut self, key_filter: KeyFilterMode) -> Self {
        self.key_filter = key_filter;
        self
    }

    /// The threshold expressed as a whole percentage for display.
    pub fn threshold_percent(&self) -> f64 {
        self.share_threshold * 100.0
    }
}
