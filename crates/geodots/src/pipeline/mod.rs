//! End-to-end job pipeline.
//!
//! Wires the stages together in call order:
//! load image -> detect (+ visualization) -> optional control-point
//! exclusion -> fit transform -> georeference -> CSV / JSON report.

mod report;
mod run;

pub use report::JobReport;
pub use run::run_job;
