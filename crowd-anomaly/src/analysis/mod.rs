//! Kinematic surprise
//!
//! Turns per-entity trajectories into the raw Trigger A signal:
//! - Constant-velocity residuals per observation
//! - Per-entity percentile thresholds
//! - Per-tick fraction of surprised entities

pub mod residual;
pub mod threshold;

pub use residual::{ResidualEstimator, ResidualRecord};
pub use threshold::{EntityThreshold, SurpriseAggregator, SurpriseAnalysis, SurpriseTick};
