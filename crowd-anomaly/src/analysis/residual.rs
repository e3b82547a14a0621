//! Constant-Velocity Residuals
//!
//! For every sample that has a successor in its entity's track, extrapolates
//! the position forward by the current velocity over the gap to the next
//! sample and measures how far the entity actually landed from that guess.
//! Large residuals mean the entity did something its own recent motion did
//! not predict.

use crate::app::config::ResidualConfig;
use crate::data::types::TrajectorySample;
use crate::time::tick::Tick;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Prediction error for one (entity, time) observation
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualRecord {
    /// Entity the observation belongs to
    pub entity_id: String,
    /// Time of the observation the prediction was made from
    pub t: Tick,
    /// Gap used for extrapolation (after the non-positive guard)
    pub time_delta: f64,
    /// Constant-velocity prediction of the next position
    pub predicted: (f64, f64),
    /// Next recorded position
    pub actual_next: (f64, f64),
    /// Euclidean distance between prediction and actual
    pub residual: f64,
}

/// Computes per-entity constant-velocity residuals
#[derive(Debug, Clone)]
pub struct ResidualEstimator {
    /// Gap substituted when the next sample is not strictly later
    pub default_time_delta: f64,
}

impl Default for ResidualEstimator {
    fn default() -> Self {
        Self::from_config(&ResidualConfig::default())
    }
}

impl ResidualEstimator {
    /// Create an estimator with an explicit default delta
    pub fn new(default_time_delta: f64) -> Self {
        Self { default_time_delta }
    }

    /// Create from configuration
    pub fn from_config(config: &ResidualConfig) -> Self {
        Self::new(config.default_time_delta)
    }

    /// Compute residuals for all entities.
    ///
    /// Output is ordered by entity id, then time. Each entity with `n` samples
    /// contributes `n - 1` records; single-sample entities contribute none.
    pub fn estimate(&self, samples: &[TrajectorySample]) -> Vec<ResidualRecord> {
        let tracks = group_tracks(samples);
        let mut records = Vec::with_capacity(samples.len().saturating_sub(tracks.len()));

        for (entity_id, track) in &tracks {
            if track.len() < 2 {
                trace!("Entity {} has a single sample; no residuals", entity_id);
                continue;
            }
            for pair in track.windows(2) {
                records.push(self.residual_between(pair[0], pair[1]));
            }
        }

        debug!(
            "Computed {} residuals across {} entities",
            records.len(),
            tracks.len()
        );
        records
    }

    /// Residual of `current` predicting `next`
    fn residual_between(&self, current: &TrajectorySample, next: &TrajectorySample) -> ResidualRecord {
        let time_delta = self.guarded_delta(current, next);
        let predicted = (
            current.x + current.vx * time_delta,
            current.y + current.vy * time_delta,
        );
        let actual_next = next.position();
        let residual = (actual_next.0 - predicted.0).hypot(actual_next.1 - predicted.1);

        ResidualRecord {
            entity_id: current.entity_id.clone(),
            t: Tick::new(current.t),
            time_delta,
            predicted,
            actual_next,
            residual,
        }
    }

    /// Gap to the next sample, replaced by the default when not strictly positive
    fn guarded_delta(&self, current: &TrajectorySample, next: &TrajectorySample) -> f64 {
        let delta = next.t - current.t;
        // NaN fails the comparison as well
        if delta > 0.0 {
            delta
        } else {
            trace!(
                "Entity {} at t={}: non-positive gap {}, using {}",
                current.entity_id,
                current.t,
                delta,
                self.default_time_delta
            );
            self.default_time_delta
        }
    }
}

/// Group samples by entity, each track sorted by time.
///
/// The sort is stable, so duplicated timestamps keep their input order.
fn group_tracks(samples: &[TrajectorySample]) -> BTreeMap<&str, Vec<&TrajectorySample>> {
    let mut tracks: BTreeMap<&str, Vec<&TrajectorySample>> = BTreeMap::new();
    for sample in samples {
        tracks.entry(sample.entity_id.as_str()).or_default().push(sample);
    }
    for track in tracks.values_mut() {
        track.sort_by(|a, b| a.t.total_cmp(&b.t));
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, t: f64, pos: (f64, f64), vel: (f64, f64)) -> TrajectorySample {
        TrajectorySample::new(id, t, pos, vel)
    }

    #[test]
    fn test_constant_velocity_residual() {
        let samples = vec![
            sample("E", 0.0, (0.0, 0.0), (1.0, 0.0)),
            sample("E", 2.5, (10.0, 0.0), (0.0, 0.0)),
        ];
        let records = ResidualEstimator::default().estimate(&samples);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.entity_id, "E");
        assert_eq!(r.t, Tick::new(0.0));
        assert_eq!(r.time_delta, 2.5);
        assert_eq!(r.predicted, (2.5, 0.0));
        assert_eq!(r.actual_next, (10.0, 0.0));
        assert!((r.residual - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_prediction_has_zero_residual() {
        let samples = vec![
            sample("A", 0.0, (0.0, 0.0), (1.0, 2.0)),
            sample("A", 1.0, (1.0, 2.0), (1.0, 2.0)),
            sample("A", 3.0, (3.0, 6.0), (1.0, 2.0)),
        ];
        let records = ResidualEstimator::default().estimate(&samples);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.residual.abs() < 1e-12));
        assert_eq!(records[1].time_delta, 2.0);
    }

    #[test]
    fn test_record_count_is_samples_minus_one() {
        let mut samples = Vec::new();
        for i in 0..5 {
            samples.push(sample("A", i as f64, (0.0, 0.0), (0.0, 0.0)));
        }
        for i in 0..3 {
            samples.push(sample("B", i as f64, (0.0, 0.0), (0.0, 0.0)));
        }
        samples.push(sample("C", 0.0, (0.0, 0.0), (0.0, 0.0)));

        let records = ResidualEstimator::default().estimate(&samples);
        let count = |id: &str| records.iter().filter(|r| r.entity_id == id).count();
        assert_eq!(count("A"), 4);
        assert_eq!(count("B"), 2);
        assert_eq!(count("C"), 0);
        assert_eq!(records.len(), 6);
    }

    #[test]
    fn test_unsorted_input_is_ordered_per_entity() {
        let samples = vec![
            sample("B", 2.0, (0.0, 0.0), (0.0, 0.0)),
            sample("A", 1.0, (0.0, 0.0), (0.0, 0.0)),
            sample("B", 0.0, (0.0, 0.0), (0.0, 0.0)),
            sample("A", 0.0, (0.0, 0.0), (0.0, 0.0)),
        ];
        let records = ResidualEstimator::default().estimate(&samples);
        let keys: Vec<(&str, f64)> = records
            .iter()
            .map(|r| (r.entity_id.as_str(), r.t.seconds()))
            .collect();
        assert_eq!(keys, vec![("A", 0.0), ("B", 0.0)]);
        assert_eq!(records[1].time_delta, 2.0);
    }

    #[test]
    fn test_duplicate_timestamp_uses_default_delta() {
        let samples = vec![
            sample("A", 5.0, (0.0, 0.0), (2.0, 0.0)),
            sample("A", 5.0, (5.0, 0.0), (0.0, 0.0)),
        ];
        let records = ResidualEstimator::new(2.5).estimate(&samples);
        assert_eq!(records[0].time_delta, 2.5);
        assert_eq!(records[0].predicted, (5.0, 0.0));
        assert!(records[0].residual.abs() < 1e-12);
    }

    #[test]
    fn test_nan_gap_uses_default_delta() {
        let samples = vec![
            sample("A", 0.0, (0.0, 0.0), (1.0, 0.0)),
            sample("A", f64::NAN, (4.0, 0.0), (0.0, 0.0)),
        ];
        let records = ResidualEstimator::new(4.0).estimate(&samples);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time_delta, 4.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(ResidualEstimator::default().estimate(&[]).is_empty());
    }
}
