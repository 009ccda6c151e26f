//! CLI library components for the cannibalization analyzer.

pub mod logging;
pub mod pipeline;
