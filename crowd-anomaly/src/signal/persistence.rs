//! Tick Signals & Persistence
//!
//! A [`TickSignal`] is a boolean series keyed by unique, ascending tick
//! times. The [`PersistenceFilter`] debounces a raw signal: a tick is
//! persisted-true only when it and the `run_length - 1` ticks before it are
//! all true. The first `run_length - 1` ticks can never persist.

use crate::time::tick::Tick;
use serde::Serialize;

/// Boolean series over unique, ascending ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickSignal {
    points: Vec<(Tick, bool)>,
}

impl TickSignal {
    /// Wrap points that are already ascending and unique.
    ///
    /// Callers outside the crate go through [`TickSignal::from_points`].
    pub(crate) fn from_sorted_unique(points: Vec<(Tick, bool)>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
        Self { points }
    }

    /// Sort points by time, keeping the first value seen for a repeated time.
    ///
    /// Returns the signal and how many repeated points were dropped.
    pub fn from_points(points: impl IntoIterator<Item = (Tick, bool)>) -> (Self, usize) {
        let mut points: Vec<(Tick, bool)> = points.into_iter().collect();
        let before = points.len();
        // Stable: the earliest input row wins among equal times
        points.sort_by(|a, b| a.0.cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);
        let dropped = before - points.len();
        (Self { points }, dropped)
    }

    /// Iterate `(time, value)` in ascending time order
    pub fn iter(&self) -> impl Iterator<Item = (Tick, bool)> + '_ {
        self.points.iter().copied()
    }

    /// Value at an exact time
    pub fn get(&self, t: Tick) -> Option<bool> {
        self.points
            .binary_search_by(|(time, _)| time.cmp(&t))
            .ok()
            .map(|idx| self.points[idx].1)
    }

    /// Number of ticks
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the signal has no ticks
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of true ticks
    pub fn true_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| *v).count()
    }

    /// Times at which the signal is true
    pub fn true_ticks(&self) -> Vec<Tick> {
        self.points.iter().filter(|(_, v)| *v).map(|(t, _)| *t).collect()
    }
}

/// Strict AND-over-window debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceFilter {
    /// Consecutive true ticks required
    pub run_length: usize,
}

impl PersistenceFilter {
    /// Create a filter requiring `run_length` consecutive true ticks.
    /// A run length of 0 behaves like 1.
    pub fn new(run_length: usize) -> Self {
        Self {
            run_length: run_length.max(1),
        }
    }

    /// Persist a raw signal.
    ///
    /// Keeps a trailing window of the last `run_length` ticks; a tick is
    /// true only when the window is full and every entry in it is true.
    pub fn apply(&self, raw: &TickSignal) -> TickSignal {
        let n = self.run_length.max(1);
        let values: Vec<bool> = raw.points.iter().map(|(_, v)| *v).collect();
        let mut window_sum = 0usize;

        let points = raw
            .points
            .iter()
            .enumerate()
            .map(|(i, (t, value))| {
                window_sum += usize::from(*value);
                if i >= n {
                    window_sum -= usize::from(values[i - n]);
                }
                let full = i + 1 >= n;
                (*t, full && window_sum == n)
            })
            .collect();

        TickSignal { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(values: &[(f64, bool)]) -> TickSignal {
        TickSignal::from_sorted_unique(values.iter().map(|(t, v)| (Tick::new(*t), *v)).collect())
    }

    fn bools(values: &[u8]) -> TickSignal {
        signal(
            &values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v == 1))
                .collect::<Vec<_>>(),
        )
    }

    fn values(signal: &TickSignal) -> Vec<bool> {
        signal.iter().map(|(_, v)| v).collect()
    }

    #[test]
    fn test_run_of_three_with_two_tick_persistence() {
        let raw = signal(&[
            (0.0, false),
            (1.0, true),
            (2.0, true),
            (3.0, true),
            (4.0, false),
        ]);
        let persisted = PersistenceFilter::new(2).apply(&raw);
        let times: Vec<f64> = persisted.true_ticks().iter().map(|t| t.seconds()).collect();
        assert_eq!(times, vec![2.0, 3.0]);
    }

    #[test]
    fn test_leading_ticks_never_persist() {
        let raw = bools(&[1, 1, 1, 1]);
        let persisted = PersistenceFilter::new(3).apply(&raw);
        assert_eq!(values(&persisted), vec![false, false, true, true]);
    }

    #[test]
    fn test_single_false_resets() {
        let raw = bools(&[1, 1, 0, 1, 1, 1]);
        let persisted = PersistenceFilter::new(3).apply(&raw);
        assert_eq!(values(&persisted), vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_run_length_one_is_identity() {
        let raw = bools(&[0, 1, 0, 1, 1]);
        assert_eq!(PersistenceFilter::new(1).apply(&raw), raw);
        assert_eq!(PersistenceFilter::new(0).run_length, 1);
    }

    #[test]
    fn test_persisted_implies_window_true() {
        // Exhaustive over all 8-tick patterns
        for n in 1..=4 {
            let filter = PersistenceFilter::new(n);
            for mask in 0u32..256 {
                let raw_values: Vec<u8> = (0..8).map(|b| ((mask >> b) & 1) as u8).collect();
                let raw = bools(&raw_values);
                let persisted = values(&filter.apply(&raw));
                for (i, p) in persisted.iter().enumerate() {
                    let expected = i + 1 >= n && raw_values[i + 1 - n..=i].iter().all(|v| *v == 1);
                    assert_eq!(*p, expected, "n={} mask={:08b} i={}", n, mask, i);
                }
            }
        }
    }

    #[test]
    fn test_short_series() {
        let persisted = PersistenceFilter::new(2).apply(&bools(&[1]));
        assert_eq!(values(&persisted), vec![false]);
        assert!(PersistenceFilter::new(2).apply(&TickSignal::default()).is_empty());
    }

    #[test]
    fn test_from_points_sorts_and_dedups() {
        let (sig, dropped) = TickSignal::from_points(vec![
            (Tick::new(2.0), true),
            (Tick::new(1.0), false),
            (Tick::new(2.0), false),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.get(Tick::new(1.0)), Some(false));
        assert_eq!(sig.get(Tick::new(2.0)), Some(true));
        assert_eq!(sig.get(Tick::new(3.0)), None);
    }

    #[test]
    fn test_true_count() {
        assert_eq!(bools(&[1, 0, 1, 1]).true_count(), 3);
    }
}
