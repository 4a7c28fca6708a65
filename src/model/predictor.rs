//! Outbreak trend predictor
//!
//! Owns a loaded model plus decision calibration and exposes the single
//! inference entry point. Construct one instance at startup and share it;
//! inference takes `&self` and allocates only call-local buffers, so
//! concurrent calls need no coordination. The random generator is supplied
//! per call so tests and replays can pin the class-mode daily sampling.

use ndarray::{Array1, Axis};
use rand::Rng;

use super::params::{LoadReport, ParamMap};
use super::transformer::TrendModel;
use crate::config::{DecisionConfig, ForecastConfig, OutputMode};
use crate::error::{Error, Result};
use crate::trend::{DecisionEngine, TrendForecast};

/// Inference entry point for a loaded trend model
#[derive(Debug, Clone)]
pub struct TrendPredictor {
    model: TrendModel,
    engine: DecisionEngine,
}

impl TrendPredictor {
    /// Wrap a model with decision calibration
    pub fn new(model: TrendModel, decision: DecisionConfig) -> Result<Self> {
        Ok(Self {
            model,
            engine: DecisionEngine::new(decision)?,
        })
    }

    /// Build a predictor with freshly initialized weights
    pub fn from_config(config: ForecastConfig) -> Result<Self> {
        let model = TrendModel::new(config.model)?;
        Self::new(model, config.decision)
    }

    /// Build a predictor from config plus a pretrained parameter map
    ///
    /// Legacy key names are remapped before loading. The report lists any
    /// parameter left at initialization, which `load_state` also logs.
    pub fn with_weights(config: ForecastConfig, params: &ParamMap) -> Result<(Self, LoadReport)> {
        let mut model = TrendModel::new(config.model)?;
        let report = model.load_state(&params.remap_legacy_keys())?;
        let predictor = Self::new(model, config.decision)?;
        Ok((predictor, report))
    }

    /// The underlying model
    pub fn model(&self) -> &TrendModel {
        &self.model
    }

    /// The decision engine
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Forecast the outbreak trend from a scaled input window
    ///
    /// `window` must hold exactly `input_len` chronologically ordered scaled
    /// observations; anything else is rejected before touching the model.
    /// The generator is only consulted in class-distribution mode.
    pub fn predict<R: Rng + ?Sized>(
        &self,
        window: &Array1<f64>,
        rng: &mut R,
    ) -> Result<TrendForecast> {
        let config = self.model.config();
        if config.input_dim != 1 {
            return Err(Error::InvalidInput(format!(
                "scalar windows require input_dim 1, model has {}",
                config.input_dim
            )));
        }
        if window.len() != config.input_len {
            return Err(Error::InvalidInput(format!(
                "expected a {}-day window, got {} values",
                config.input_len,
                window.len()
            )));
        }

        let matrix = window.view().insert_axis(Axis(1)).to_owned();
        let raw = self.model.forward(&matrix);

        match config.output_mode {
            OutputMode::PerDay => self.engine.decide_per_day(&raw),
            OutputMode::ClassDistribution => {
                self.engine
                    .decide_class_distribution(&raw, config.horizon, rng)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_config(output_mode: OutputMode) -> ForecastConfig {
        ForecastConfig {
            model: ModelConfig {
                d_model: 16,
                d_ff: 32,
                n_heads: 2,
                output_mode,
                ..ModelConfig::default()
            },
            decision: DecisionConfig::default(),
        }
    }

    fn test_window() -> Array1<f64> {
        Array1::from_shape_fn(30, |i| if i % 2 == 0 { -1.0 } else { 1.0 })
    }

    #[test]
    fn test_class_mode_probabilities_form_simplex() {
        let predictor = TrendPredictor::from_config(test_config(OutputMode::ClassDistribution))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let forecast = predictor.predict(&test_window(), &mut rng).unwrap();

        assert_abs_diff_eq!(
            forecast.probabilities.iter().sum::<f64>(),
            1.0,
            epsilon = 1e-10
        );
        assert!(forecast.probabilities.iter().all(|p| *p >= 0.0));
        assert_eq!(forecast.daily_levels.len(), 30);
    }

    #[test]
    fn test_per_day_mode_is_fully_deterministic() {
        let predictor = TrendPredictor::from_config(test_config(OutputMode::PerDay)).unwrap();
        let window = test_window();

        let mut rng_a = StdRng::seed_from_u64(1);
        let mut rng_b = StdRng::seed_from_u64(2);
        let a = predictor.predict(&window, &mut rng_a).unwrap();
        let b = predictor.predict(&window, &mut rng_b).unwrap();

        // No randomness on this path at all
        assert_eq!(a.daily_levels, b.daily_levels);
        assert_eq!(a.label, b.label);
        assert_eq!(a.probabilities.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_rejects_short_window() {
        let predictor = TrendPredictor::from_config(test_config(OutputMode::ClassDistribution))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let short = Array1::zeros(29);

        let err = predictor.predict(&short, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_predictor_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrendPredictor>();
    }
}
