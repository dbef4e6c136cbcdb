//! perceptest-report: accuracy chart rendering and result archive export.

pub mod archive;
pub mod chart;
