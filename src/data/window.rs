//! Input window construction
//!
//! Produces the model's 30-day input window for a requested disease and
//! month: the window ends at the last recorded day of that month and walks
//! back exactly `window_len` consecutive calendar days. Any missing day in
//! that span is an insufficient-data failure, reported distinctly from
//! model errors so the caller can present it.

use chrono::{Datelike, Duration, NaiveDate};
use ndarray::Array1;
use std::collections::HashMap;

use super::types::CaseSeries;
use crate::error::{Error, Result};

/// A model-ready input window with its raw counterpart
#[derive(Debug, Clone)]
pub struct InputWindow {
    /// Disease the window belongs to
    pub disease: String,
    /// First day covered
    pub start: NaiveDate,
    /// Last day covered
    pub end: NaiveDate,
    /// Normalized observations, chronological
    pub scaled: Array1<f64>,
    /// Raw case counts for the same days
    pub raw: Array1<f64>,
}

impl InputWindow {
    /// Number of days in the window
    pub fn len(&self) -> usize {
        self.scaled.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.scaled.is_empty()
    }
}

/// Builds input windows from registered case series
#[derive(Debug, Clone, Default)]
pub struct WindowProvider {
    window_len: usize,
    series: HashMap<String, CaseSeries>,
}

impl WindowProvider {
    /// Create a provider producing windows of `window_len` days
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len,
            series: HashMap::new(),
        }
    }

    /// Register a case series, keyed by lowercased disease name
    pub fn insert(&mut self, series: CaseSeries) {
        self.series
            .insert(series.disease().to_lowercase(), series);
    }

    /// Registered disease names
    pub fn diseases(&self) -> Vec<&str> {
        self.series.values().map(|s| s.disease()).collect()
    }

    /// Window length produced by this provider
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Build the input window for a disease and month
    ///
    /// Fails with [`Error::UnknownDisease`] when no series is registered for
    /// the disease, and with [`Error::InsufficientData`] when the month has
    /// no recorded days or fewer than `window_len` consecutive daily records
    /// exist ending at the month's last data point.
    pub fn window(&self, disease: &str, year: i32, month: u32) -> Result<InputWindow> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidInput(format!("invalid month: {}", month)));
        }

        let series = self
            .series
            .get(&disease.to_lowercase())
            .ok_or_else(|| Error::UnknownDisease(disease.to_string()))?;

        let last_day = series
            .records()
            .iter()
            .filter(|r| r.day.year() == year && r.day.month() == month)
            .map(|r| r.day)
            .max()
            .ok_or_else(|| {
                Error::InsufficientData(format!(
                    "no recorded days for {} in {:02}/{}",
                    disease, month, year
                ))
            })?;

        let start_day = last_day - Duration::days(self.window_len as i64 - 1);
        let in_window: Vec<_> = series
            .records()
            .iter()
            .filter(|r| r.day >= start_day && r.day <= last_day)
            .collect();

        if in_window.len() < self.window_len {
            return Err(Error::InsufficientData(format!(
                "only {} of {} consecutive days of history ending {}",
                in_window.len(),
                self.window_len,
                last_day
            )));
        }
        for pair in in_window.windows(2) {
            if (pair[1].day - pair[0].day).num_days() != 1 {
                return Err(Error::InsufficientData(format!(
                    "history between {} and {} is not consecutive",
                    start_day, last_day
                )));
            }
        }

        Ok(InputWindow {
            disease: series.disease().to_string(),
            start: start_day,
            end: last_day,
            scaled: Array1::from_vec(
                in_window
                    .iter()
                    .map(|r| r.count_scaled.unwrap_or(0.0))
                    .collect(),
            ),
            raw: Array1::from_vec(in_window.iter().map(|r| r.count).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::CaseRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Daily records from `start` for `days` consecutive days
    fn daily_records(start: NaiveDate, days: usize) -> Vec<CaseRecord> {
        let mut records = Vec::with_capacity(days);
        let mut day = start;
        for i in 0..days {
            records.push(CaseRecord::new(day, (i % 17) as f64));
            day = day.succ_opt().unwrap();
        }
        records
    }

    fn provider_with(records: Vec<CaseRecord>) -> WindowProvider {
        let mut provider = WindowProvider::new(30);
        provider.insert(CaseSeries::new("cholera", records));
        provider
    }

    #[test]
    fn test_window_ends_at_last_recorded_day_of_month() {
        // Data runs 2023-01-01 through 2023-03-15
        let provider = provider_with(daily_records(date(2023, 1, 1), 74));

        let window = provider.window("cholera", 2023, 3).unwrap();

        assert_eq!(window.len(), 30);
        assert_eq!(window.end, date(2023, 3, 15));
        assert_eq!(window.start, date(2023, 2, 14));
        assert_eq!(window.raw.len(), 30);
    }

    #[test]
    fn test_disease_lookup_is_case_insensitive() {
        let provider = provider_with(daily_records(date(2023, 1, 1), 60));
        assert!(provider.window("Cholera", 2023, 2).is_ok());
    }

    #[test]
    fn test_empty_month_is_insufficient_data() {
        let provider = provider_with(daily_records(date(2023, 1, 1), 60));

        let err = provider.window("cholera", 2023, 7).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
        assert!(err.is_data_error());
    }

    #[test]
    fn test_short_history_is_insufficient_data() {
        let provider = provider_with(daily_records(date(2023, 3, 1), 10));

        let err = provider.window("cholera", 2023, 3).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_gap_in_history_is_insufficient_data() {
        // 40 days of data with one missing day inside the final 30-day span
        let mut records = daily_records(date(2023, 1, 1), 40);
        records.remove(25);
        let provider = provider_with(records);

        let err = provider.window("cholera", 2023, 2).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_unknown_disease_is_its_own_error() {
        let provider = provider_with(daily_records(date(2023, 1, 1), 60));

        let err = provider.window("measles", 2023, 2).unwrap_err();
        assert!(matches!(err, Error::UnknownDisease(_)));
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let provider = provider_with(daily_records(date(2023, 1, 1), 60));

        let err = provider.window("cholera", 2023, 13).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_history_may_span_preceding_month() {
        // Only 5 recorded days in February, but January fills the window
        let provider = provider_with(daily_records(date(2023, 1, 1), 36));

        let window = provider.window("cholera", 2023, 2).unwrap();
        assert_eq!(window.end, date(2023, 2, 5));
        assert_eq!(window.start, date(2023, 1, 7));
    }
}
