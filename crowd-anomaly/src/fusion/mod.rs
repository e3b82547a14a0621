//! Fusion and extraction
//!
//! Combines the two persisted triggers into anomalous timestamps and pulls
//! the matching rows out of the detailed dataset.

pub mod engine;
pub mod extractor;

pub use engine::{AnomalyTimestampSet, FusedTrigger, FusionEngine, FusionResult};
pub use extractor::{EventWindowExtractor, Extraction};
