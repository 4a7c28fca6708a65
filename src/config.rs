//! Model and decision configuration
//!
//! Hyperparameters mirror the pretrained cholera model; the decision
//! thresholds and sampling weights are calibration parameters that can be
//! overridden from a JSON file instead of rebuilding.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};

/// How the forecast head's output is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One continuous value per horizon day
    PerDay,
    /// A single logit vector over the outbreak classes
    ClassDistribution,
}

/// Transformer architecture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of features per time step
    pub input_dim: usize,
    /// Length of the input window in days
    pub input_len: usize,
    /// Model dimension
    pub d_model: usize,
    /// Number of attention heads
    pub n_heads: usize,
    /// Feed-forward hidden dimension
    pub d_ff: usize,
    /// Number of encoder and decoder layers
    pub n_layers: usize,
    /// Number of future days the decoder represents
    pub horizon: usize,
    /// Number of outbreak classes
    pub n_classes: usize,
    /// Dropout rate (training only, inference is identity)
    pub dropout: f64,
    /// Output head interpretation, fixed per model
    pub output_mode: OutputMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_dim: 1,
            input_len: 30,
            d_model: 64,
            n_heads: 4,
            d_ff: 128,
            n_layers: 2,
            horizon: 30,
            n_classes: 3,
            dropout: 0.1,
            output_mode: OutputMode::ClassDistribution,
        }
    }
}

impl ModelConfig {
    /// Output dimension of the forecast head for the configured mode
    pub fn output_dim(&self) -> usize {
        match self.output_mode {
            OutputMode::PerDay => self.horizon,
            OutputMode::ClassDistribution => self.n_classes,
        }
    }

    /// Validate dimensional invariants before building a model
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0
            || self.input_len == 0
            || self.d_model == 0
            || self.d_ff == 0
            || self.n_layers == 0
            || self.horizon == 0
        {
            return Err(Error::InvalidInput(
                "model dimensions must be non-zero".to_string(),
            ));
        }
        if self.n_heads == 0 || self.d_model % self.n_heads != 0 {
            return Err(Error::InvalidInput(format!(
                "d_model ({}) must be divisible by n_heads ({})",
                self.d_model, self.n_heads
            )));
        }
        if self.d_model % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "d_model ({}) must be even for sinusoidal position channels",
                self.d_model
            )));
        }
        if self.n_classes != 3 {
            return Err(Error::InvalidInput(format!(
                "expected 3 outbreak classes, got {}",
                self.n_classes
            )));
        }
        Ok(())
    }
}

/// Decision engine calibration
///
/// Defaults reproduce the deployed heuristics exactly. The daily weight rows
/// give, per overall label, the sampling probability of each outbreak level
/// when the model emits a class distribution instead of per-day values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Values below this bucket as Low
    pub low_threshold: f64,
    /// Values at or above this bucket as High
    pub high_threshold: f64,
    /// Daily level weights when the overall label is Low
    pub low_day_weights: [f64; 3],
    /// Daily level weights when the overall label is Medium
    pub medium_day_weights: [f64; 3],
    /// Daily level weights when the overall label is High
    pub high_day_weights: [f64; 3],
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            low_threshold: 0.3,
            high_threshold: 0.7,
            low_day_weights: [0.8, 0.2, 0.0],
            medium_day_weights: [0.2, 0.6, 0.2],
            high_day_weights: [0.0, 0.3, 0.7],
        }
    }
}

impl DecisionConfig {
    /// Validate thresholds and sampling weights
    pub fn validate(&self) -> Result<()> {
        if !(self.low_threshold < self.high_threshold) {
            return Err(Error::InvalidInput(format!(
                "low threshold ({}) must be below high threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }
        for (label, weights) in [
            ("low", &self.low_day_weights),
            ("medium", &self.medium_day_weights),
            ("high", &self.high_day_weights),
        ] {
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(Error::InvalidInput(format!(
                    "{} day weights must be non-negative and finite",
                    label
                )));
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "{} day weights must not all be zero",
                    label
                )));
            }
        }
        Ok(())
    }
}

/// Combined configuration for the forecasting pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Transformer architecture
    pub model: ModelConfig,
    /// Decision engine calibration
    pub decision: DecisionConfig,
}

impl ForecastConfig {
    /// Validate both sections
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.decision.validate()
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
