//! Secondary (Outward-Flow) Trigger
//!
//! Trigger B comes from one of two mutually exclusive sources:
//!
//! - [`ExternalClassifierSource`]: per-tick predictions produced elsewhere.
//!   The prediction column is already persisted, so it is used as-is.
//! - [`RuleBasedSource`]: a two-threshold rule over per-tick movement
//!   statistics, debounced with the shared [`PersistenceFilter`].
//!
//! The caller decides which source applies by what it hands to
//! [`TriggerSource::select`]; nothing here touches storage.

use crate::app::config::TriggerBConfig;
use crate::data::types::{parse_flag, parse_time, ClassifierPrediction, MovementStats, Table};
use crate::signal::persistence::{PersistenceFilter, TickSignal};
use crate::time::tick::Tick;
use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Time column expected in a classifier artifact
pub const CLASSIFIER_TIME_COLUMN: &str = "t";

/// Which source produced Trigger B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// External classifier output
    Classifier,
    /// Movement-statistics rule
    Rule,
}

/// A producer of the persisted Trigger B signal
pub trait SecondaryTriggerSource {
    /// Which kind of source this is
    fn mode(&self) -> TriggerMode;

    /// Persisted Trigger B, one value per unique tick
    fn persisted_signal(&self) -> TickSignal;
}

/// Trigger B taken directly from an external classifier
#[derive(Debug, Clone)]
pub struct ExternalClassifierSource {
    predictions: Vec<ClassifierPrediction>,
}

impl ExternalClassifierSource {
    /// Wrap already-parsed predictions
    pub fn new(predictions: Vec<ClassifierPrediction>) -> Self {
        Self { predictions }
    }

    /// Read predictions from a classifier artifact.
    ///
    /// The artifact must have a `t` column and the configured prediction
    /// column; a missing column is a configuration error. A prediction cell
    /// that is not a recognised flag counts as not asserted.
    pub fn from_table(table: &Table, prediction_column: &str) -> Result<Self> {
        let time_idx = table.column_index(CLASSIFIER_TIME_COLUMN).ok_or_else(|| {
            Error::Config(format!(
                "classifier output is missing the '{}' column",
                CLASSIFIER_TIME_COLUMN
            ))
        })?;
        let pred_idx = table.column_index(prediction_column).ok_or_else(|| {
            Error::Config(format!(
                "classifier output found but missing '{}' column",
                prediction_column
            ))
        })?;

        let mut unreadable = 0usize;
        let predictions = table
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
                let t = parse_time(cell(time_idx)).ok_or_else(|| {
                    Error::Data(format!(
                        "classifier row {}: bad time '{}'",
                        row_idx + 1,
                        cell(time_idx)
                    ))
                })?;
                let prediction = parse_flag(cell(pred_idx)).unwrap_or_else(|| {
                    debug!(
                        "classifier row {}: unrecognised prediction '{}', treated as false",
                        row_idx + 1,
                        cell(pred_idx)
                    );
                    unreadable += 1;
                    false
                });
                Ok(ClassifierPrediction { t, prediction })
            })
            .collect::<Result<Vec<_>>>()?;

        if unreadable > 0 {
            warn!(
                "Classifier column '{}' has {} unrecognised value(s); treated as false",
                prediction_column, unreadable
            );
        }

        Ok(Self::new(predictions))
    }

    /// Number of predictions
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Check if there are no predictions
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl SecondaryTriggerSource for ExternalClassifierSource {
    fn mode(&self) -> TriggerMode {
        TriggerMode::Classifier
    }

    fn persisted_signal(&self) -> TickSignal {
        let (signal, dropped) = TickSignal::from_points(
            self.predictions
                .iter()
                .map(|p| (Tick::new(p.t), p.prediction)),
        );
        if dropped > 0 {
            warn!("Classifier output repeats {} tick(s); kept the first of each", dropped);
        }
        signal
    }
}

/// Trigger B from the outward-flow rule
#[derive(Debug, Clone)]
pub struct RuleBasedSource {
    stats: Vec<MovementStats>,
    /// Minimum share of entities moving outward
    pub outward_fraction: f64,
    /// Minimum mean outward speed
    pub outward_speed: f64,
    /// Debouncer applied to the raw rule
    pub persistence: PersistenceFilter,
}

impl RuleBasedSource {
    /// Create from movement statistics and configuration
    pub fn new(stats: Vec<MovementStats>, config: &TriggerBConfig) -> Self {
        Self {
            stats,
            outward_fraction: config.outward_fraction,
            outward_speed: config.outward_speed,
            persistence: PersistenceFilter::new(config.persist_ticks),
        }
    }

    /// Whether one tick's statistics satisfy both thresholds
    pub fn rule_fires(&self, stats: &MovementStats) -> bool {
        stats.outward_fraction >= self.outward_fraction
            && stats.mean_outward_speed >= self.outward_speed
    }

    /// Raw (undebounced) rule output
    pub fn raw_signal(&self) -> TickSignal {
        let (signal, dropped) = TickSignal::from_points(
            self.stats
                .iter()
                .map(|s| (Tick::new(s.t), self.rule_fires(s))),
        );
        if dropped > 0 {
            warn!("Movement statistics repeat {} tick(s); kept the first of each", dropped);
        }
        signal
    }
}

impl SecondaryTriggerSource for RuleBasedSource {
    fn mode(&self) -> TriggerMode {
        TriggerMode::Rule
    }

    fn persisted_signal(&self) -> TickSignal {
        let raw = self.raw_signal();
        let persisted = self.persistence.apply(&raw);
        debug!(
            "Rule trigger B: {} raw / {} persisted of {} ticks",
            raw.true_count(),
            persisted.true_count(),
            raw.len()
        );
        persisted
    }
}

/// The selected Trigger B source
#[derive(Debug, Clone)]
pub enum TriggerSource {
    /// External classifier output
    Classifier(ExternalClassifierSource),
    /// Movement-statistics rule
    Rule(RuleBasedSource),
}

impl TriggerSource {
    /// Pick the source: classifier output when supplied, otherwise the rule.
    ///
    /// Movement statistics are only consulted in rule mode; rule mode without
    /// them is a configuration error.
    pub fn select(
        classifier: Option<&Table>,
        movement_stats: Option<Vec<MovementStats>>,
        config: &TriggerBConfig,
    ) -> Result<Self> {
        match classifier {
            Some(table) => {
                let source = ExternalClassifierSource::from_table(table, &config.prediction_column)?;
                info!("Trigger B: classifier output ({} predictions)", source.len());
                Ok(TriggerSource::Classifier(source))
            }
            None => {
                let stats = movement_stats.ok_or_else(|| {
                    Error::Config(
                        "no classifier output and no movement statistics for the trigger B rule"
                            .to_string(),
                    )
                })?;
                info!("Trigger B: outward-flow rule over {} ticks", stats.len());
                Ok(TriggerSource::Rule(RuleBasedSource::new(stats, config)))
            }
        }
    }
}

impl SecondaryTriggerSource for TriggerSource {
    fn mode(&self) -> TriggerMode {
        match self {
            TriggerSource::Classifier(source) => source.mode(),
            TriggerSource::Rule(source) => source.mode(),
        }
    }

    fn persisted_signal(&self) -> TickSignal {
        match self {
            TriggerSource::Classifier(source) => source.persisted_signal(),
            TriggerSource::Rule(source) => source.persisted_signal(),
        }
    }
}
