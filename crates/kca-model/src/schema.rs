//! Input schema variants and header-based detection.
//!
//! Two column layouts are supported: Search Console performance exports
//! (`query`/`page` dimensions with `clicks`/`impressions` metrics) and
//! generic SEO-tool exports (`keyword`/`url` dimensions with
//! `traffic`/`position` metrics). The variant is selected once from the
//! headers and threaded through every downstream call; no stage re-inspects
//! the raw table to decide which columns apply.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Column layout of the ingested performance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSchema {
    /// Google Search Console export: `query`, `page`, `clicks`,
    /// `impressions`, plus `ctr` and `position`.
    SearchConsole,
    /// Third-party SEO tool export: `keyword`, `url`, `traffic`,
    /// `position`, plus `cpc`.
    ExternalTool,
}

impl ReportSchema {
    /// Select the schema from lower-cased column headers.
    ///
    /// Detection is deterministic: the same headers always yield the same
    /// variant. Headers are matched case-insensitively; callers that
    /// normalize to lowercase at ingest get exact matches here.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Result<Self, SchemaError> {
        let has = |name: &str| {
            headers
                .iter()
                .any(|header| header.as_ref().eq_ignore_ascii_case(name))
        };
        if has("query") && has("clicks") {
            if !has("page") {
                return Err(SchemaError::MissingPageColumn);
            }
            return Ok(Self::SearchConsole);
        }
        if has("keyword") && has("url") {
            return Ok(Self::ExternalTool);
        }
        Err(SchemaError::UnrecognizedFormat)
    }

    /// The competing unit: the column holding the query or keyword.
    pub fn group_column(self) -> &'static str {
        match self {
            Self::SearchConsole => "query",
            Self::ExternalTool => "keyword",
        }
    }

    /// The candidate serving the group: the column holding the page or URL.
    pub fn detail_column(self) -> &'static str {
        match self {
            Self::SearchConsole => "page",
            Self::ExternalTool => "url",
        }
    }

    /// First ranking metric; also the metric the positivity filter checks.
    pub fn primary_metric(self) -> &'static str {
        match self {
            Self::SearchConsole => "clicks",
            Self::ExternalTool => "traffic",
        }
    }

    /// Second ranking metric, extracted independently and merged with the
    /// first.
    pub fn secondary_metric(self) -> &'static str {
        match self {
            Self::SearchConsole => "impressions",
            Self::ExternalTool => "position",
        }
    }

    /// Label for the consolidated two-metric view.
    pub fn merged_label(self) -> &'static str {
        match self {
            Self::SearchConsole => "clicks+impressions",
            Self::ExternalTool => "traffic+position",
        }
    }

    /// Auxiliary rate column carried through the projection.
    pub fn rate_column(self) -> &'static str {
        match self {
            Self::SearchConsole => "ctr",
            Self::ExternalTool => "cpc",
        }
    }

    /// Auxiliary ranking-position column, used as the last sort key.
    pub fn position_column(self) -> &'static str {
        "position"
    }

    /// Singular noun for the competing unit, for messages.
    pub fn group_noun(self) -> &'static str {
        match self {
            Self::SearchConsole => "query",
            Self::ExternalTool => "keyword",
        }
    }

    /// Plural noun for the competing unit, for summary lines.
    pub fn group_noun_plural(self) -> &'static str {
        match self {
            Self::SearchConsole => "queries",
            Self::ExternalTool => "keywords",
        }
    }

    /// Short name used in logs and the JSON summary.
    pub fn name(self) -> &'static str {
        match self {
            Self::SearchConsole => "search-console",
            Self::ExternalTool => "external-tool",
        }
    }

    /// Both ranking metrics in extraction order.
    pub fn metric_pair(self) -> [&'static str; 2] {
        [self.primary_metric(), self.secondary_metric()]
    }
}
