//! Integration tests for the outbreak trend pipeline

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use outbreak_trend::{
    CaseRecord, CaseSeries, DecisionConfig, Error, ForecastConfig, ModelConfig, OutputMode,
    ParamMap, TrendPredictor, WindowProvider,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A synthetic cholera table: `days` consecutive daily counts with a weekly
/// swing, starting at `start`
fn synthetic_series(start: NaiveDate, days: usize) -> CaseSeries {
    let mut records = Vec::with_capacity(days);
    let mut day = start;
    for i in 0..days {
        let count = 20.0 + 15.0 * ((i as f64) * std::f64::consts::TAU / 7.0).sin();
        records.push(CaseRecord::new(day, count.round()));
        day = day.succ_opt().unwrap();
    }
    CaseSeries::new("cholera", records)
}

fn small_config(output_mode: OutputMode) -> ForecastConfig {
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

#[test]
fn test_full_pipeline_class_mode() {
    let mut provider = WindowProvider::new(30);
    provider.insert(synthetic_series(date(2023, 1, 1), 90));

    let predictor = TrendPredictor::from_config(small_config(OutputMode::ClassDistribution))
        .unwrap();

    let window = provider.window("cholera", 2023, 3).unwrap();
    assert_eq!(window.len(), 30);

    let mut rng = StdRng::seed_from_u64(11);
    let forecast = predictor.predict(&window.scaled, &mut rng).unwrap();

    assert_abs_diff_eq!(
        forecast.probabilities.iter().sum::<f64>(),
        1.0,
        epsilon = 1e-10
    );
    assert!(forecast.probabilities.iter().all(|p| *p >= 0.0));
    assert_eq!(forecast.daily_levels.len(), 30);
    assert!(forecast.daily_indices().iter().all(|l| *l <= 2));
}

#[test]
fn test_full_pipeline_is_reproducible_with_seed() {
    let mut provider = WindowProvider::new(30);
    provider.insert(synthetic_series(date(2023, 1, 1), 90));

    let predictor = TrendPredictor::from_config(small_config(OutputMode::ClassDistribution))
        .unwrap();
    let window = provider.window("cholera", 2023, 3).unwrap();

    let mut rng_a = StdRng::seed_from_u64(5);
    let mut rng_b = StdRng::seed_from_u64(5);
    let a = predictor.predict(&window.scaled, &mut rng_a).unwrap();
    let b = predictor.predict(&window.scaled, &mut rng_b).unwrap();

    assert_eq!(a.label, b.label);
    assert_eq!(a.probabilities, b.probabilities);
    assert_eq!(a.daily_levels, b.daily_levels);
}

#[test]
fn test_full_pipeline_per_day_mode() {
    let mut provider = WindowProvider::new(30);
    provider.insert(synthetic_series(date(2023, 1, 1), 90));

    let predictor = TrendPredictor::from_config(small_config(OutputMode::PerDay)).unwrap();
    let window = provider.window("cholera", 2023, 3).unwrap();

    let mut rng = StdRng::seed_from_u64(0);
    let forecast = predictor.predict(&window.scaled, &mut rng).unwrap();

    assert_eq!(forecast.daily_levels.len(), 30);
    // Degenerate distribution: all mass on the overall label
    assert_eq!(forecast.probabilities.iter().sum::<f64>(), 1.0);
    assert_eq!(forecast.probabilities[forecast.label.index()], 1.0);
}

#[test]
fn test_weight_file_round_trip_preserves_forecast() {
    let config = small_config(OutputMode::ClassDistribution);
    let source = TrendPredictor::from_config(config.clone()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    source.model().state().to_file(&path).unwrap();

    let params = ParamMap::from_file(&path).unwrap();
    let (restored, report) = TrendPredictor::with_weights(config, &params).unwrap();
    assert!(report.is_complete());

    let window = Array1::from_shape_fn(30, |i| ((i as f64) * 0.4).cos());
    let mut rng_a = StdRng::seed_from_u64(21);
    let mut rng_b = StdRng::seed_from_u64(21);
    let a = source.predict(&window, &mut rng_a).unwrap();
    let b = restored.predict(&window, &mut rng_b).unwrap();

    assert_eq!(a.label, b.label);
    assert_eq!(a.probabilities, b.probabilities);
    assert_eq!(a.daily_levels, b.daily_levels);
}

#[test]
fn test_month_without_data_reports_insufficient_data() {
    let mut provider = WindowProvider::new(30);
    provider.insert(synthetic_series(date(2023, 1, 1), 90));

    let err = provider.window("cholera", 2024, 6).unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
    assert!(err.is_data_error());
}

#[test]
fn test_malformed_window_is_rejected_before_inference() {
    let predictor = TrendPredictor::from_config(small_config(OutputMode::ClassDistribution))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    let too_long = Array1::zeros(31);
    let err = predictor.predict(&too_long, &mut rng).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(!err.is_data_error());
}
