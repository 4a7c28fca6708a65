//! # Outbreak Trend
//!
//! Transformer-based short-term outbreak trend forecasting for disease
//! case counts.
//!
//! A 30-day window of normalized daily case counts is encoded by a
//! transformer encoder-decoder; the forecast head emits per-day values or a
//! class distribution, and the decision engine turns that into a discrete
//! outbreak level, class probabilities and a 30-day trend sequence for
//! display.
//!
//! ## Modules
//!
//! - `config`: model architecture and decision calibration
//! - `data`: case tables, CSV loading, input-window construction
//! - `error`: error types
//! - `model`: layers, attention, the encoder-decoder model, weight loading
//! - `trend`: decision engine and forecast types

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod trend;

pub use config::{DecisionConfig, ForecastConfig, ModelConfig, OutputMode};
pub use data::{CaseDataLoader, CaseRecord, CaseSeries, InputWindow, WindowProvider};
pub use error::{Error, Result};
pub use model::{LoadReport, ParamMap, TrendModel, TrendPredictor};
pub use trend::{DecisionEngine, OutbreakLevel, TrendDirection, TrendForecast};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
