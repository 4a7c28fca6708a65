//! Trend decision logic
//!
//! Converts raw forecast-head output into a human-facing outbreak level,
//! class probabilities and a per-day trend sequence.

mod decision;

pub use decision::{DecisionEngine, OutbreakLevel, TrendDirection, TrendForecast};
