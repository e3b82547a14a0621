//! Workflow Module
//!
//! Orchestrates a complete detection run from loaded datasets to the
//! annotated event rows and run report.

pub mod pipeline;
pub mod report;

pub use pipeline::{AnomalyPipeline, Detection, PipelineInputs, PipelineOutput};
pub use report::DetectionReport;
