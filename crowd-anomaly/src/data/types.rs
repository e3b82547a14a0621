//! Core types for telemetry input
//!
//! Defines the row types the detector consumes: per-entity trajectory
//! samples, per-tick movement statistics, external classifier predictions,
//! and a schema-free [`Table`] for datasets whose columns are passed through.

use serde::{Deserialize, Serialize};

/// One positional sample of a tracked entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Tracked entity (device) identifier
    #[serde(alias = "phone_id")]
    pub entity_id: String,
    /// Sample time (seconds)
    pub t: f64,
    /// Position x
    #[serde(alias = "x_t_m")]
    pub x: f64,
    /// Position y
    #[serde(alias = "y_t_m")]
    pub y: f64,
    /// Velocity x
    #[serde(alias = "vx_t_mps")]
    pub vx: f64,
    /// Velocity y
    #[serde(alias = "vy_t_mps")]
    pub vy: f64,
}

impl TrajectorySample {
    /// Create a sample
    pub fn new(entity_id: impl Into<String>, t: f64, position: (f64, f64), velocity: (f64, f64)) -> Self {
        Self {
            entity_id: entity_id.into(),
            t,
            x: position.0,
            y: position.1,
            vx: velocity.0,
            vy: velocity.1,
        }
    }

    /// Position as a tuple
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Velocity as a tuple
    #[inline]
    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }
}

/// Aggregate outward-movement statistics for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementStats {
    /// Tick time (seconds)
    pub t: f64,
    /// Share of entities moving away from the reference point
    pub outward_fraction: f64,
    /// Mean outward speed
    #[serde(alias = "mean_outward_speed_mps")]
    pub mean_outward_speed: f64,
}

/// A persisted prediction from an external classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPrediction {
    /// Tick time (seconds)
    pub t: f64,
    /// Already-persisted prediction
    pub prediction: bool,
}

/// A schema-free table of string cells.
///
/// Columns that the detector does not interpret are carried through untouched,
/// in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names
    pub headers: Vec<String>,
    /// Rows, each with one cell per header
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with the given headers and no rows
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// First of `names` present in the table, with its position
    pub fn first_column<'a>(&self, names: &'a [String]) -> Option<(&'a str, usize)> {
        names
            .iter()
            .find_map(|name| self.column_index(name).map(|idx| (name.as_str(), idx)))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a boolean cell as written by common tabular tools.
///
/// Accepts `1`/`0`, `true`/`false`, `yes`/`no` (case-insensitive) and
/// integral floats such as `1.0`.
pub fn parse_flag(cell: &str) -> Option<bool> {
    let trimmed = cell.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => match trimmed.parse::<f64>() {
            Ok(v) if v == 1.0 => Some(true),
            Ok(v) if v == 0.0 => Some(false),
            _ => None,
        },
    }
}

/// Parse a numeric time cell.
pub fn parse_time(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sample_accessors() {
        let s = TrajectorySample::new("p1", 2.5, (1.0, 2.0), (0.5, -0.5));
        assert_eq!(s.entity_id, "p1");
        assert_eq!(s.position(), (1.0, 2.0));
        assert_eq!(s.velocity(), (0.5, -0.5));
    }

    #[test]
    fn test_first_column_prefers_earlier_name() {
        let table = Table::new(names(&["timestamp", "zone", "t"]));
        let accepted = names(&["t", "timestamp"]);
        let (name, idx) = table.first_column(&accepted).unwrap();
        assert_eq!(name, "t");
        assert_eq!(idx, 2);
    }

    #[test]
    fn test_first_column_missing() {
        let table = Table::new(names(&["time_s", "zone"]));
        assert!(table.first_column(&names(&["t", "timestamp"])).is_none());
    }

    #[test]
    fn test_table_rows() {
        let mut table = Table::new(names(&["t"]));
        assert!(table.is_empty());
        table.push_row(names(&["1.0"]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.column_index("t"), Some(0));
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag("1.0"), Some(true));
        assert_eq!(parse_flag("0.0"), Some(false));
        assert_eq!(parse_flag("0.5"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time(" 12.3 "), Some(12.3));
        assert_eq!(parse_time("abc"), None);
    }
}
