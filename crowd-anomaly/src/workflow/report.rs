//! Run Report
//!
//! A JSON-serializable summary of one detection run.

use super::pipeline::Detection;
use crate::fusion::extractor::Extraction;
use crate::trigger::secondary::TriggerMode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Summary of one detection run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    /// Unique run ID
    pub run_id: Uuid,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Source of Trigger B
    pub trigger_b_mode: TriggerMode,
    /// Entities with at least one residual
    pub entity_count: usize,
    /// Residual observations
    pub residual_count: usize,
    /// Entities whose threshold could not be calibrated
    pub degenerate_entities: usize,
    /// Ticks in persisted Trigger A / true ticks
    pub trigger_a_ticks: TickCounts,
    /// Ticks in persisted Trigger B / true ticks
    pub trigger_b_ticks: TickCounts,
    /// Ticks present in both triggers
    pub shared_ticks: usize,
    /// Shared ticks where both triggers are true
    pub fused_ticks: usize,
    /// Rounded anomalous timestamps, ascending
    pub anomaly_timestamps: Vec<f64>,
    /// Time column used in the detail dataset
    pub detail_time_column: String,
    /// Detail rows selected
    pub extracted_rows: usize,
}

/// Size of a tick signal and how many ticks are true
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickCounts {
    /// Ticks in the signal
    pub total: usize,
    /// True ticks
    pub asserted: usize,
}

impl DetectionReport {
    /// Summarize a finished run
    pub fn from_run(detection: &Detection, extraction: &Extraction) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            trigger_b_mode: detection.mode,
            entity_count: detection.surprise.thresholds.len(),
            residual_count: detection.residuals.len(),
            degenerate_entities: detection.surprise.degenerate_entities(),
            trigger_a_ticks: TickCounts {
                total: detection.trigger_a.len(),
                asserted: detection.trigger_a.true_count(),
            },
            trigger_b_ticks: TickCounts {
                total: detection.trigger_b.len(),
                asserted: detection.trigger_b.true_count(),
            },
            shared_ticks: detection.fusion.table.len(),
            fused_ticks: detection.fusion.fused_count(),
            anomaly_timestamps: detection.fusion.anomalies.seconds(),
            detail_time_column: extraction.time_column.clone(),
            extracted_rows: extraction.table.len(),
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the report to a file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::threshold::SurpriseAggregator;
    use crate::data::types::Table;
    use crate::fusion::engine::FusionEngine;
    use crate::signal::persistence::TickSignal;
    use crate::time::tick::Tick;
    use tempfile::TempDir;

    fn detection() -> Detection {
        let a = TickSignal::from_sorted_unique(vec![(Tick::new(1.0), true), (Tick::new(2.0), true)]);
        let b = TickSignal::from_sorted_unique(vec![(Tick::new(2.0), true), (Tick::new(3.0), false)]);
        Detection {
            residuals: vec![],
            surprise: SurpriseAggregator::default().analyze(&[]),
            fusion: FusionEngine::default().fuse(&a, &b),
            trigger_a: a,
            trigger_b: b,
            mode: TriggerMode::Rule,
        }
    }

    fn extraction() -> Extraction {
        let mut table = Table::new(vec!["t".to_string()]);
        table.push_row(vec!["2.0".to_string()]);
        Extraction {
            time_column: "t".to_string(),
            table,
        }
    }

    #[test]
    fn test_report_counts() {
        let report = DetectionReport::from_run(&detection(), &extraction());
        assert_eq!(report.trigger_b_mode, TriggerMode::Rule);
        assert_eq!(report.trigger_a_ticks, TickCounts { total: 2, asserted: 2 });
        assert_eq!(report.trigger_b_ticks, TickCounts { total: 2, asserted: 1 });
        assert_eq!(report.shared_ticks, 1);
        assert_eq!(report.fused_ticks, 1);
        assert_eq!(report.anomaly_timestamps, vec![2.0]);
        assert_eq!(report.extracted_rows, 1);
    }

    #[test]
    fn test_report_json() {
        let json = DetectionReport::from_run(&detection(), &extraction()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trigger_b_mode"], "rule");
        assert_eq!(value["anomaly_timestamps"][0], 2.0);
        assert!(value["run_id"].is_string());
    }

    #[test]
    fn test_report_save() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("reports").join("run.json");
        DetectionReport::from_run(&detection(), &extraction())
            .save(&path)
            .expect("Failed to save report");
        assert!(path.exists());
    }
}
