//! Detection Pipeline
//!
//! Runs the full batch: residuals, per-entity thresholds and surprise,
//! persisted Trigger A, Trigger B from the selected source, fusion, and
//! extraction of matching detail rows. Every run recomputes everything from
//! the inputs; nothing is cached between runs.

use super::report::DetectionReport;
use crate::analysis::residual::{ResidualEstimator, ResidualRecord};
use crate::analysis::threshold::{SurpriseAggregator, SurpriseAnalysis};
use crate::app::config::Config;
use crate::data::types::{MovementStats, Table, TrajectorySample};
use crate::fusion::engine::{FusionEngine, FusionResult};
use crate::fusion::extractor::{EventWindowExtractor, Extraction};
use crate::signal::persistence::{PersistenceFilter, TickSignal};
use crate::trigger::secondary::{SecondaryTriggerSource, TriggerMode, TriggerSource};
use crate::Result;
use tracing::info;

/// Everything the pipeline consumes
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    /// Per-entity trajectory samples
    pub trajectories: Vec<TrajectorySample>,
    /// Per-tick movement statistics (rule mode)
    pub movement_stats: Option<Vec<MovementStats>>,
    /// External classifier output (classifier mode when present)
    pub classifier: Option<Table>,
    /// Detailed dataset to extract rows from
    pub detail: Table,
}

/// Intermediate artifacts of one detection pass
#[derive(Debug, Clone)]
pub struct Detection {
    /// Residual per (entity, time) observation
    pub residuals: Vec<ResidualRecord>,
    /// Thresholds, flags and per-tick surprise
    pub surprise: SurpriseAnalysis,
    /// Persisted Trigger A
    pub trigger_a: TickSignal,
    /// Persisted Trigger B
    pub trigger_b: TickSignal,
    /// Source of Trigger B
    pub mode: TriggerMode,
    /// Fused triggers and anomalous timestamps
    pub fusion: FusionResult,
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Intermediate artifacts
    pub detection: Detection,
    /// Selected and annotated detail rows
    pub extraction: Extraction,
    /// Run summary
    pub report: DetectionReport,
}

/// Fusion-based anomaly detector
#[derive(Debug, Clone)]
pub struct AnomalyPipeline {
    config: Config,
}

impl AnomalyPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Persisted Trigger A from trajectories
    pub fn trigger_a(&self, trajectories: &[TrajectorySample]) -> (Vec<ResidualRecord>, SurpriseAnalysis, TickSignal) {
        let residuals = ResidualEstimator::from_config(&self.config.residual).estimate(trajectories);
        let surprise =
            SurpriseAggregator::from_config(&self.config.residual, &self.config.trigger_a).analyze(&residuals);
        let raw = surprise.raw_signal();
        let persisted = PersistenceFilter::new(self.config.trigger_a.persist_ticks).apply(&raw);
        info!(
            "Trigger A: {} residuals, {} entities, {} raw / {} persisted of {} ticks",
            residuals.len(),
            surprise.thresholds.len(),
            raw.true_count(),
            persisted.true_count(),
            persisted.len()
        );
        (residuals, surprise, persisted)
    }

    /// Detect anomalous timestamps without extraction
    pub fn detect(
        &self,
        trajectories: &[TrajectorySample],
        trigger_b_source: &dyn SecondaryTriggerSource,
    ) -> Detection {
        let (residuals, surprise, trigger_a) = self.trigger_a(trajectories);

        let trigger_b = trigger_b_source.persisted_signal();
        info!(
            "Trigger B ({:?}): {} persisted of {} ticks",
            trigger_b_source.mode(),
            trigger_b.true_count(),
            trigger_b.len()
        );

        let fusion = FusionEngine::from_config(&self.config.fusion).fuse(&trigger_a, &trigger_b);
        info!(
            "Found {} anomaly timestamps after fusion",
            fusion.anomalies.len()
        );

        Detection {
            residuals,
            surprise,
            trigger_a,
            trigger_b,
            mode: trigger_b_source.mode(),
            fusion,
        }
    }

    /// Run detection and extraction end to end
    pub fn run(&self, inputs: PipelineInputs) -> Result<PipelineOutput> {
        let PipelineInputs {
            trajectories,
            movement_stats,
            classifier,
            detail,
        } = inputs;

        let source = TriggerSource::select(classifier.as_ref(), movement_stats, &self.config.trigger_b)?;
        let detection = self.detect(&trajectories, &source);

        let extraction = EventWindowExtractor::from_config(&self.config.extraction)
            .extract(&detail, &detection.fusion)?;
        info!("Selected {} detail rows", extraction.table.len());

        let report = DetectionReport::from_run(&detection, &extraction);
        Ok(PipelineOutput {
            detection,
            extraction,
            report,
        })
    }
}
