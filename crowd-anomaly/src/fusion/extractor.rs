//! Event Window Extraction
//!
//! Selects the rows of a detailed dataset that fall on an anomalous
//! timestamp and annotates them with the trigger values behind the anomaly.
//! The detail time column is looked up under each accepted name in turn and
//! rounded to the fusion precision before matching.

use super::engine::{flag_cell, FusionResult};
use crate::app::config::ExtractionConfig;
use crate::data::types::{parse_time, Table};
use crate::time::tick::RoundedTime;
use crate::{Error, Result};
use tracing::debug;

/// Column appended with the persisted Trigger A value
pub const TRIGGER_A_COLUMN: &str = "triggerA";
/// Column appended with the persisted Trigger B value
pub const TRIGGER_B_COLUMN: &str = "triggerB";

/// Rows selected from the detail dataset
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Which accepted time column the detail dataset used
    pub time_column: String,
    /// Selected rows: original columns plus trigger annotations
    pub table: Table,
}

/// Filters and annotates detail rows at anomalous timestamps
#[derive(Debug, Clone)]
pub struct EventWindowExtractor {
    /// Accepted time column names, first match wins
    pub time_columns: Vec<String>,
}

impl Default for EventWindowExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl EventWindowExtractor {
    /// Create from configuration
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            time_columns: config.time_columns.clone(),
        }
    }

    /// Select and annotate rows whose rounded time is anomalous.
    ///
    /// Row order and all original columns are preserved. A row with an empty
    /// time cell never matches; a non-numeric time cell is an error.
    pub fn extract(&self, detail: &Table, fusion: &FusionResult) -> Result<Extraction> {
        let (time_column, time_idx) = detail.first_column(&self.time_columns).ok_or_else(|| {
            Error::Config(format!(
                "detail dataset must contain a time column named one of {:?}",
                self.time_columns
            ))
        })?;

        let precision = fusion.anomalies.precision();
        let annotations = fusion.annotations();

        let mut headers = detail.headers.clone();
        headers.push(TRIGGER_A_COLUMN.to_string());
        headers.push(TRIGGER_B_COLUMN.to_string());
        let mut table = Table::new(headers);

        for (row_idx, row) in detail.rows.iter().enumerate() {
            let cell = row.get(time_idx).map(String::as_str).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            let seconds = parse_time(cell).ok_or_else(|| {
                Error::Data(format!(
                    "detail row {}: bad {} value '{}'",
                    row_idx + 1,
                    time_column,
                    cell
                ))
            })?;
            let Some(key) = RoundedTime::from_seconds(seconds, precision) else {
                continue;
            };
            if !fusion.anomalies.contains(&key) {
                continue;
            }

            let mut out = row.clone();
            match annotations.get(&key) {
                Some((a, b)) => {
                    out.push(flag_cell(*a));
                    out.push(flag_cell(*b));
                }
                None => {
                    out.push(String::new());
                    out.push(String::new());
                }
            }
            table.push_row(out);
        }

        debug!(
            "Extracted {} of {} detail rows using time column '{}'",
            table.len(),
            detail.len(),
            time_column
        );

        Ok(Extraction {
            time_column: time_column.to_string(),
            table,
        })
    }
}
