//! Errors shared across the analysis crates.

use thiserror::Error;

/// Errors raised while selecting an input schema from column headers.
///
/// Schema errors are unrecoverable for the current input: the caller must
/// halt processing and report the unsupported or incomplete layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A `query`/`clicks` export was found without its `page` dimension.
    #[error("missing page column")]
    MissingPageColumn,

    /// The headers match neither supported layout.
    #[error("unrecognized format")]
    UnrecognizedFormat,
}
