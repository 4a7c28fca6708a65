//! Decision engine for outbreak trend forecasts
//!
//! Two paths depending on the model's output mode. Per-day values are
//! bucketed directly into levels; a class distribution yields a genuine
//! probability vector, and the daily sequence is then sampled from
//! label-conditioned weights. That sampled sequence is a presentation
//! heuristic, not a per-day forecast: repeated calls with the same label
//! legitimately differ unless the caller supplies a seeded generator.

use ndarray::Array1;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DecisionConfig;
use crate::error::{Error, Result};
use crate::model::softmax;

/// Discrete outbreak level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutbreakLevel {
    /// Few or no expected cases
    Low = 0,
    /// Elevated case counts
    Medium = 1,
    /// Outbreak conditions
    High = 2,
}

impl OutbreakLevel {
    /// Get the class index
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Create from a class index
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Get a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Direction of the forecast trend over the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    /// Last day above first day
    Increasing,
    /// Last day below first day
    Decreasing,
    /// No change between first and last day
    Stable,
}

impl TrendDirection {
    /// Get a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

/// Complete trend forecast for one inference call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendForecast {
    /// Overall outbreak level for the horizon
    pub label: OutbreakLevel,
    /// Class probabilities; degenerate (one-hot) in per-day mode
    pub probabilities: [f64; 3],
    /// One level per horizon day
    pub daily_levels: Vec<OutbreakLevel>,
    /// Direction derived from the daily sequence endpoints
    pub direction: TrendDirection,
}

impl TrendForecast {
    /// Probability assigned to the overall label
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.label.index()]
    }

    /// Daily levels as raw class indices (0, 1, 2), chart-friendly
    pub fn daily_indices(&self) -> Vec<u8> {
        self.daily_levels.iter().map(|l| l.index() as u8).collect()
    }
}

/// Converts raw head output into a [`TrendForecast`]
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    /// Create an engine, validating the calibration up front
    pub fn new(config: DecisionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Calibration in use
    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Bucket a continuous value into an outbreak level
    ///
    /// Below the low threshold is Low, at or above the high threshold is
    /// High, Medium in between. Boundaries are inclusive on the upper side.
    pub fn bucket(&self, value: f64) -> OutbreakLevel {
        if value < self.config.low_threshold {
            OutbreakLevel::Low
        } else if value < self.config.high_threshold {
            OutbreakLevel::Medium
        } else {
            OutbreakLevel::High
        }
    }

    /// Decide from per-day continuous values
    ///
    /// Each day is bucketed directly; the overall label buckets the mean of
    /// all day values with the same thresholds. There is no distributional
    /// uncertainty in this mode, so the probability vector is one-hot.
    pub fn decide_per_day(&self, day_values: &Array1<f64>) -> Result<TrendForecast> {
        if day_values.is_empty() {
            return Err(Error::InvalidInput(
                "per-day head output must not be empty".to_string(),
            ));
        }

        let daily_levels: Vec<OutbreakLevel> =
            day_values.iter().map(|&v| self.bucket(v)).collect();

        let mean = day_values.sum() / day_values.len() as f64;
        let label = self.bucket(mean);

        let mut probabilities = [0.0; 3];
        probabilities[label.index()] = 1.0;

        Ok(TrendForecast {
            label,
            probabilities,
            direction: direction_of(&daily_levels),
            daily_levels,
        })
    }

    /// Decide from class logits
    ///
    /// Softmax gives the probability vector and argmax the label, both fully
    /// deterministic. The daily sequence is sampled from the label's weight
    /// row using the supplied generator.
    pub fn decide_class_distribution<R: Rng + ?Sized>(
        &self,
        logits: &Array1<f64>,
        horizon: usize,
        rng: &mut R,
    ) -> Result<TrendForecast> {
        if logits.len() != 3 {
            return Err(Error::InvalidInput(format!(
                "expected 3 class logits, got {}",
                logits.len()
            )));
        }

        let probs = softmax(logits);
        let label_idx = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let label = OutbreakLevel::from_index(label_idx);

        let weights = match label {
            OutbreakLevel::Low => &self.config.low_day_weights,
            OutbreakLevel::Medium => &self.config.medium_day_weights,
            OutbreakLevel::High => &self.config.high_day_weights,
        };
        let sampler = WeightedIndex::new(weights)
            .map_err(|e| Error::InvalidInput(format!("invalid day weights: {}", e)))?;

        let daily_levels: Vec<OutbreakLevel> = (0..horizon)
            .map(|_| OutbreakLevel::from_index(sampler.sample(rng)))
            .collect();

        Ok(TrendForecast {
            label,
            probabilities: [probs[0], probs[1], probs[2]],
            direction: direction_of(&daily_levels),
            daily_levels,
        })
    }
}

/// Direction from the endpoints of the daily sequence
fn direction_of(daily_levels: &[OutbreakLevel]) -> TrendDirection {
    match (daily_levels.first(), daily_levels.last()) {
        (Some(first), Some(last)) if last > first => TrendDirection::Increasing,
        (Some(first), Some(last)) if last < first => TrendDirection::Decreasing,
        _ => TrendDirection::Stable,
    }
}
