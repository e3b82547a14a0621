//! Telemetry Data
//!
//! Input row types and CSV access for the detector's datasets.

pub mod io;
pub mod types;

pub use types::{ClassifierPrediction, MovementStats, Table, TrajectorySample};
