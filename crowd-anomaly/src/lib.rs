//! # Crowd Anomaly
//!
//! Detects crowd disturbances (panic, gunshot-like scatter) in per-entity
//! positional telemetry by fusing two independent weak signals, then pulls
//! out the detailed records for the moments that fired.
//!
//! ## Overview
//!
//! Trigger A is kinematic surprise: each entity's constant-velocity
//! prediction error is compared with that entity's own high-percentile
//! residual, and a tick fires when enough of the population is surprised at
//! once. Trigger B is outward flow, either read from an external classifier
//! or derived by rule from movement statistics. Each trigger is debounced,
//! and a timestamp is anomalous only when both agree.
//!
//! ## Quick Start
//!
//! ```no_run
//! use crowd_anomaly::app::config::Config;
//! use crowd_anomaly::data::io;
//! use crowd_anomaly::workflow::{AnomalyPipeline, PipelineInputs};
//! use std::path::Path;
//!
//! let pipeline = AnomalyPipeline::new(Config::default())?;
//! let output = pipeline.run(PipelineInputs {
//!     trajectories: io::load_trajectories(Path::new("modelA_predictors.csv"))?,
//!     movement_stats: Some(io::load_movement_stats(Path::new("modelB_predictors.csv"))?),
//!     classifier: None,
//!     detail: io::load_table(Path::new("expanded_sim.csv"))?,
//! })?;
//!
//! println!("{} anomalous timestamps", output.detection.fusion.anomalies.len());
//! io::save_table(Path::new("anomaly.csv"), &output.extraction.table)?;
//! # Ok::<(), crowd_anomaly::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: exact and fixed-precision tick keys
//! - [`data`]: input row types and CSV access
//! - [`analysis`]: residuals, per-entity thresholds, per-tick surprise
//! - [`signal`]: tick signals and the persistence filter
//! - [`trigger`]: Trigger B sources (classifier or rule)
//! - [`fusion`]: trigger fusion and event window extraction
//! - [`workflow`]: end-to-end pipeline and run report
//! - [`app`]: CLI and configuration management
//!
//! ## Data Flow
//!
//! ```text
//! trajectories ─▶ residuals ─▶ thresholds/surprise ─▶ raw A ─▶ persist ─┐
//!                                                                      ├─▶ fuse ─▶ extract
//! classifier output ──────────────────────────────────────────────────┤
//!   or movement stats ─▶ rule ─▶ raw B ─▶ persist ─────────────────────┘
//! ```

pub mod time;
pub mod data;
pub mod analysis;
pub mod signal;
pub mod trigger;
pub mod fusion;
pub mod workflow;
pub mod app;

// Re-export commonly used types
pub use data::types::{MovementStats, Table, TrajectorySample};
pub use fusion::engine::{AnomalyTimestampSet, FusedTrigger};
pub use signal::persistence::{PersistenceFilter, TickSignal};
pub use workflow::{AnomalyPipeline, PipelineInputs};

/// Result type alias for the detector
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the detector
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
