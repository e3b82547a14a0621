//! Configuration Management

use crate::time::tick::MAX_PRECISION;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Residual estimation and per-entity thresholds
    #[serde(default)]
    pub residual: ResidualConfig,
    /// Trigger A (kinematic surprise)
    #[serde(default)]
    pub trigger_a: TriggerAConfig,
    /// Trigger B (outward flow)
    #[serde(default)]
    pub trigger_b: TriggerBConfig,
    /// Fusion settings
    #[serde(default)]
    pub fusion: FusionConfig,
    /// Event window extraction
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Residual configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualConfig {
    /// Substituted when the gap to the next sample is not positive (seconds)
    pub default_time_delta: f64,
    /// Percentile of an entity's residuals used as its threshold (0..=1)
    pub percentile: f64,
    /// Minimum finite residuals for a usable threshold
    pub min_samples: usize,
}

/// Trigger A configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerAConfig {
    /// Fraction of active entities that must be surprised at a tick
    pub min_fraction_surprised: f64,
    /// Consecutive ticks required before the trigger persists
    pub persist_ticks: usize,
}

/// Trigger B configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerBConfig {
    /// Rule mode: minimum share of entities moving outward
    pub outward_fraction: f64,
    /// Rule mode: minimum mean outward speed
    pub outward_speed: f64,
    /// Rule mode: consecutive ticks required before the trigger persists
    pub persist_ticks: usize,
    /// Classifier mode: column holding the persisted prediction
    pub prediction_column: String,
}

/// Fusion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Decimal places anomaly timestamps are rounded to
    pub time_precision: u32,
}

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Accepted time column names in the detail dataset, first match wins
    pub time_columns: Vec<String>,
}

impl Default for ResidualConfig {
    fn default() -> Self {
        Self {
            default_time_delta: 2.5,
            percentile: 0.99,
            min_samples: 1,
        }
    }
}

impl Default for TriggerAConfig {
    fn default() -> Self {
        Self {
            min_fraction_surprised: 0.35,
            persist_ticks: 2,
        }
    }
}

impl Default for TriggerBConfig {
    fn default() -> Self {
        Self {
            outward_fraction: 0.65,
            outward_speed: 2.3,
            persist_ticks: 2,
            prediction_column: "pred_persist".to_string(),
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { time_precision: 1 }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            time_columns: vec!["t".to_string(), "timestamp".to_string()],
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let delta = self.residual.default_time_delta;
        if !delta.is_finite() || delta <= 0.0 {
            return Err(crate::Error::Config(format!(
                "default_time_delta must be a positive number, got {}", delta
            )));
        }
        if !(0.0..=1.0).contains(&self.residual.percentile) {
            return Err(crate::Error::Config(format!(
                "percentile must be in [0, 1], got {}", self.residual.percentile
            )));
        }
        if self.residual.min_samples == 0 {
            return Err(crate::Error::Config("min_samples must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.trigger_a.min_fraction_surprised) {
            return Err(crate::Error::Config(format!(
                "min_fraction_surprised must be in [0, 1], got {}",
                self.trigger_a.min_fraction_surprised
            )));
        }
        if self.trigger_a.persist_ticks == 0 {
            return Err(crate::Error::Config("trigger_a.persist_ticks must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.trigger_b.outward_fraction) {
            return Err(crate::Error::Config(format!(
                "outward_fraction must be in [0, 1], got {}", self.trigger_b.outward_fraction
            )));
        }
        if !self.trigger_b.outward_speed.is_finite() || self.trigger_b.outward_speed < 0.0 {
            return Err(crate::Error::Config(format!(
                "outward_speed must be >= 0, got {}", self.trigger_b.outward_speed
            )));
        }
        if self.trigger_b.persist_ticks == 0 {
            return Err(crate::Error::Config("trigger_b.persist_ticks must be > 0".to_string()));
        }
        if self.trigger_b.prediction_column.trim().is_empty() {
            return Err(crate::Error::Config("prediction_column must not be empty".to_string()));
        }
        if self.fusion.time_precision > MAX_PRECISION {
            return Err(crate::Error::Config(format!(
                "time_precision must be <= {}, got {}", MAX_PRECISION, self.fusion.time_precision
            )));
        }
        if self.extraction.time_columns.iter().all(|c| c.trim().is_empty()) {
            return Err(crate::Error::Config("time_columns must name at least one column".to_string()));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".crowd_anomaly").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Look up a value by dotted key, e.g. `trigger_b.outward_speed`
    pub fn get(&self, key: &str) -> Result<Option<String>, crate::Error> {
        let value = toml::Value::try_from(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        let found = key
            .split('.')
            .try_fold(&value, |node, part| node.get(part));
        Ok(found.map(|v| v.to_string()))
    }
}
