//! Adaptive Thresholds & Per-Tick Surprise
//!
//! Each entity is judged against its own residual distribution: the
//! configured percentile of its residuals becomes its threshold, and an
//! observation is "surprising" when it strictly exceeds that threshold.
//! Surprise is then aggregated per tick into the fraction of active
//! entities that were surprised, which drives the raw Trigger A signal.
//!
//! Percentiles use linear interpolation between order statistics:
//! for sorted values `v[0..n]` and `p` in `[0, 1]`, the position is
//! `p * (n - 1)` and the result blends the two neighbouring values by the
//! fractional part of that position.

use super::residual::ResidualRecord;
use crate::app::config::{ResidualConfig, TriggerAConfig};
use crate::signal::persistence::TickSignal;
use crate::time::tick::Tick;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-entity residual threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityThreshold {
    /// Percentile of the entity's residuals
    Value(f64),
    /// Too few residuals to calibrate; never exceeded
    Degenerate,
}

impl EntityThreshold {
    /// Whether `residual` strictly exceeds this threshold
    #[inline]
    pub fn is_exceeded_by(&self, residual: f64) -> bool {
        match self {
            EntityThreshold::Value(threshold) => residual > *threshold,
            EntityThreshold::Degenerate => false,
        }
    }

    /// The numeric threshold, if calibrated
    pub fn value(&self) -> Option<f64> {
        match self {
            EntityThreshold::Value(v) => Some(*v),
            EntityThreshold::Degenerate => None,
        }
    }
}

/// Population surprise at one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurpriseTick {
    /// Tick time
    pub t: Tick,
    /// Observations at this tick
    pub active: usize,
    /// Observations above their entity's threshold
    pub surprised: usize,
    /// `surprised / active`, 0 when nothing is active
    pub frac_surprised: f64,
    /// Raw Trigger A
    pub flag_raw: bool,
}

/// Result of threshold calibration and aggregation
#[derive(Debug, Clone)]
pub struct SurpriseAnalysis {
    /// Threshold per entity
    pub thresholds: BTreeMap<String, EntityThreshold>,
    /// Per-record flag, parallel to the input residuals
    pub flags: Vec<bool>,
    /// Per-tick aggregation, ascending by time
    pub ticks: Vec<SurpriseTick>,
}

impl SurpriseAnalysis {
    /// Entities whose threshold could not be calibrated
    pub fn degenerate_entities(&self) -> usize {
        self.thresholds
            .values()
            .filter(|t| matches!(t, EntityThreshold::Degenerate))
            .count()
    }

    /// Raw Trigger A as a tick signal
    pub fn raw_signal(&self) -> TickSignal {
        TickSignal::from_sorted_unique(self.ticks.iter().map(|t| (t.t, t.flag_raw)).collect())
    }
}

/// Calibrates per-entity thresholds and aggregates surprise per tick
#[derive(Debug, Clone)]
pub struct SurpriseAggregator {
    /// Percentile (0..=1) used as each entity's threshold
    pub percentile: f64,
    /// Minimum finite residuals needed to calibrate
    pub min_samples: usize,
    /// Fraction surprised at or above which raw Trigger A fires
    pub min_fraction_surprised: f64,
}

impl Default for SurpriseAggregator {
    fn default() -> Self {
        Self::from_config(&ResidualConfig::default(), &TriggerAConfig::default())
    }
}

impl SurpriseAggregator {
    /// Create from configuration
    pub fn from_config(residual: &ResidualConfig, trigger_a: &TriggerAConfig) -> Self {
        Self {
            percentile: residual.percentile,
            min_samples: residual.min_samples,
            min_fraction_surprised: trigger_a.min_fraction_surprised,
        }
    }

    /// Calibrate thresholds, flag records, and aggregate per tick
    pub fn analyze(&self, records: &[ResidualRecord]) -> SurpriseAnalysis {
        let thresholds = self.calibrate(records);

        let flags: Vec<bool> = records
            .iter()
            .map(|r| {
                thresholds
                    .get(&r.entity_id)
                    .is_some_and(|threshold| threshold.is_exceeded_by(r.residual))
            })
            .collect();

        let mut per_tick: BTreeMap<Tick, (usize, usize)> = BTreeMap::new();
        for (record, flagged) in records.iter().zip(&flags) {
            let entry = per_tick.entry(record.t).or_insert((0, 0));
            entry.0 += 1;
            if *flagged {
                entry.1 += 1;
            }
        }

        let ticks: Vec<SurpriseTick> = per_tick
            .into_iter()
            .map(|(t, (active, surprised))| {
                let frac_surprised = fraction(surprised, active);
                SurpriseTick {
                    t,
                    active,
                    surprised,
                    frac_surprised,
                    flag_raw: frac_surprised >= self.min_fraction_surprised,
                }
            })
            .collect();

        debug!(
            "Flagged {} of {} residuals; {} of {} ticks raise raw trigger A",
            flags.iter().filter(|f| **f).count(),
            flags.len(),
            ticks.iter().filter(|t| t.flag_raw).count(),
            ticks.len()
        );

        SurpriseAnalysis {
            thresholds,
            flags,
            ticks,
        }
    }

    /// Threshold for every entity present in `records`
    pub fn calibrate(&self, records: &[ResidualRecord]) -> BTreeMap<String, EntityThreshold> {
        let mut residuals: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for record in records {
            let bucket = residuals.entry(record.entity_id.as_str()).or_default();
            if record.residual.is_finite() {
                bucket.push(record.residual);
            }
        }

        let mut degenerate = 0usize;
        let thresholds = residuals
            .into_iter()
            .map(|(entity_id, mut values)| {
                let threshold = if values.len() < self.min_samples {
                    None
                } else {
                    values.sort_by(|a, b| a.total_cmp(b));
                    percentile_sorted(&values, self.percentile)
                };
                let threshold = match threshold {
                    Some(v) => EntityThreshold::Value(v),
                    None => {
                        degenerate += 1;
                        debug!(
                            "Entity {} has {} usable residuals; threshold is degenerate",
                            entity_id,
                            values.len()
                        );
                        EntityThreshold::Degenerate
                    }
                };
                (entity_id.to_string(), threshold)
            })
            .collect();

        if degenerate > 0 {
            warn!(
                "{} entities have too few residuals for a threshold and will never be flagged",
                degenerate
            );
        }
        thresholds
    }
}

/// `part / whole`, defined as 0 when `whole` is 0
#[inline]
fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Linear-interpolated percentile of ascending `values`, `p` in `[0, 1]`
pub fn percentile_sorted(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !p.is_finite() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    if values.len() == 1 {
        return Some(values[0]);
    }
    let pos = p * ((values.len() - 1) as f64);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let lo_v = *values.get(lo)?;
    let hi_v = *values.get(hi)?;
    let frac = pos - lo as f64;
    Some(lo_v + (hi_v - lo_v) * frac)
}
