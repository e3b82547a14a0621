//! Trigger Fusion
//!
//! Joins persisted Trigger A and Trigger B on exact tick time (inner join:
//! a tick missing from either side is dropped) and declares an anomaly where
//! both are true. Anomalous ticks are rounded to a fixed precision so they
//! can be matched against datasets sampled on a slightly different clock.

use crate::app::config::FusionConfig;
use crate::data::types::Table;
use crate::signal::persistence::TickSignal;
use crate::time::tick::{RoundedTime, Tick};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Both persisted triggers at one shared tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FusedTrigger {
    /// Tick time
    pub t: Tick,
    /// Persisted Trigger A
    pub trigger_a: bool,
    /// Persisted Trigger B
    pub trigger_b: bool,
    /// `trigger_a && trigger_b`
    pub fused: bool,
}

/// Deduplicated, rounded times at which fusion fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyTimestampSet {
    precision: u32,
    times: BTreeSet<RoundedTime>,
}

impl AnomalyTimestampSet {
    /// Empty set at the given precision
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            times: BTreeSet::new(),
        }
    }

    /// Add a raw time; non-finite times are ignored
    pub fn insert(&mut self, t: Tick) -> bool {
        match t.rounded(self.precision) {
            Some(key) => self.times.insert(key),
            None => false,
        }
    }

    /// Membership of an already-rounded key
    pub fn contains(&self, key: &RoundedTime) -> bool {
        self.times.contains(key)
    }

    /// Membership of a raw time after rounding
    pub fn contains_seconds(&self, seconds: f64) -> bool {
        RoundedTime::from_seconds(seconds, self.precision).is_some_and(|key| self.contains(&key))
    }

    /// Rounding precision
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Iterate ascending
    pub fn iter(&self) -> impl Iterator<Item = &RoundedTime> {
        self.times.iter()
    }

    /// Ascending times in seconds
    pub fn seconds(&self) -> Vec<f64> {
        self.times.iter().map(RoundedTime::seconds).collect()
    }

    /// Number of anomalous timestamps
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Check if no anomaly was found
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Output of the fusion step
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// One row per tick present in both triggers, ascending
    pub table: Vec<FusedTrigger>,
    /// Rounded anomalous timestamps
    pub anomalies: AnomalyTimestampSet,
}

impl FusionResult {
    /// Trigger values per rounded tick.
    ///
    /// When several ticks round to the same key, a fused tick wins over a
    /// non-fused one; otherwise the earliest tick wins.
    pub fn annotations(&self) -> BTreeMap<RoundedTime, (bool, bool)> {
        let mut by_key: BTreeMap<RoundedTime, &FusedTrigger> = BTreeMap::new();
        for row in &self.table {
            let Some(key) = row.t.rounded(self.anomalies.precision()) else {
                continue;
            };
            by_key
                .entry(key)
                .and_modify(|current| {
                    if row.fused && !current.fused {
                        *current = row;
                    }
                })
                .or_insert(row);
        }
        by_key
            .into_iter()
            .map(|(key, row)| (key, (row.trigger_a, row.trigger_b)))
            .collect()
    }

    /// Number of fused ticks
    pub fn fused_count(&self) -> usize {
        self.table.iter().filter(|r| r.fused).count()
    }

    /// The fused table as `t,triggerA,triggerB,fused` with 1/0 flags
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            ["t", "triggerA", "triggerB", "fused"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        );
        for row in &self.table {
            table.push_row(vec![
                row.t.to_string(),
                flag_cell(row.trigger_a),
                flag_cell(row.trigger_b),
                flag_cell(row.fused),
            ]);
        }
        table
    }
}

/// `1` / `0` encoding used in CSV output
pub fn flag_cell(value: bool) -> String {
    let cell = if value { "1" } else { "0" };
    cell.to_string()
}

/// Combines the two persisted triggers
#[derive(Debug, Clone)]
pub struct FusionEngine {
    /// Decimal places for anomalous timestamps
    pub time_precision: u32,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::from_config(&FusionConfig::default())
    }
}

impl FusionEngine {
    /// Create from configuration
    pub fn from_config(config: &FusionConfig) -> Self {
        Self {
            time_precision: config.time_precision,
        }
    }

    /// Inner-join both triggers on exact time and AND them
    pub fn fuse(&self, trigger_a: &TickSignal, trigger_b: &TickSignal) -> FusionResult {
        let mut table = Vec::with_capacity(trigger_a.len().min(trigger_b.len()));
        let mut a = trigger_a.iter().peekable();
        let mut b = trigger_b.iter().peekable();

        while let (Some(&(ta, va)), Some(&(tb, vb))) = (a.peek(), b.peek()) {
            match ta.cmp(&tb) {
                Ordering::Less => {
                    a.next();
                }
                Ordering::Greater => {
                    b.next();
                }
                Ordering::Equal => {
                    table.push(FusedTrigger {
                        t: ta,
                        trigger_a: va,
                        trigger_b: vb,
                        fused: va && vb,
                    });
                    a.next();
                    b.next();
                }
            }
        }

        let mut anomalies = AnomalyTimestampSet::new(self.time_precision);
        for row in table.iter().filter(|r| r.fused) {
            anomalies.insert(row.t);
        }

        debug!(
            "Fusion: {} shared ticks (A: {}, B: {}), {} fused, {} anomalous timestamps",
            table.len(),
            trigger_a.len(),
            trigger_b.len(),
            table.iter().filter(|r| r.fused).count(),
            anomalies.len()
        );

        FusionResult { table, anomalies }
    }
}
