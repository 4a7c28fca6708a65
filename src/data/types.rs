//! Data types for disease case counts
//!
//! A case series is a chronologically ordered table of daily counts for one
//! disease, carrying both raw and normalized values. Normalization is a
//! z-score fitted over the full series, applied at construction when the
//! source table does not ship a precomputed scaled column.

use chrono::NaiveDate;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One day of recorded case counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Calendar day of the observation
    pub day: NaiveDate,
    /// Raw case count
    pub count: f64,
    /// Normalized count, if precomputed upstream
    #[serde(default)]
    pub count_scaled: Option<f64>,
}

impl CaseRecord {
    /// Create a record without a precomputed scaled value
    pub fn new(day: NaiveDate, count: f64) -> Self {
        Self {
            day,
            count,
            count_scaled: None,
        }
    }
}

/// Daily case counts for a single disease, in chronological order
#[derive(Debug, Clone)]
pub struct CaseSeries {
    disease: String,
    records: Vec<CaseRecord>,
}

impl CaseSeries {
    /// Build a series: sorts records chronologically and fills in normalized
    /// counts
    ///
    /// If any record lacks a scaled value, a z-score transform fitted over
    /// the whole series replaces the scaled column for every record.
    pub fn new(disease: impl Into<String>, mut records: Vec<CaseRecord>) -> Self {
        records.sort_by_key(|r| r.day);

        let needs_fit = records.iter().any(|r| r.count_scaled.is_none());
        if needs_fit && !records.is_empty() {
            let n = records.len() as f64;
            let mean = records.iter().map(|r| r.count).sum::<f64>() / n;
            let var = records
                .iter()
                .map(|r| (r.count - mean).powi(2))
                .sum::<f64>()
                / n;
            let std = var.sqrt();

            for record in &mut records {
                let scaled = if std > 0.0 {
                    (record.count - mean) / std
                } else {
                    0.0
                };
                record.count_scaled = Some(scaled);
            }
        }

        Self {
            disease: disease.into(),
            records,
        }
    }

    /// Disease identifier
    pub fn disease(&self) -> &str {
        &self.disease
    }

    /// All records, chronological
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Number of recorded days
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the series has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent record
    pub fn latest(&self) -> Option<&CaseRecord> {
        self.records.last()
    }

    /// First recorded day
    pub fn first_day(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.day)
    }

    /// Last recorded day
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.day)
    }

    /// Raw counts as an array
    pub fn raw_counts(&self) -> Array1<f64> {
        Array1::from_vec(self.records.iter().map(|r| r.count).collect())
    }

    /// Normalized counts as an array
    pub fn scaled_counts(&self) -> Array1<f64> {
        Array1::from_vec(
            self.records
                .iter()
                .map(|r| r.count_scaled.unwrap_or(0.0))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_sorts_chronologically() {
        let records = vec![
            CaseRecord::new(date(2023, 1, 3), 5.0),
            CaseRecord::new(date(2023, 1, 1), 2.0),
            CaseRecord::new(date(2023, 1, 2), 3.0),
        ];
        let series = CaseSeries::new("cholera", records);

        assert_eq!(series.first_day(), Some(date(2023, 1, 1)));
        assert_eq!(series.last_day(), Some(date(2023, 1, 3)));
        assert_eq!(series.raw_counts().to_vec(), vec![2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_scaling_fit_produces_zero_mean() {
        let records = (0..10)
            .map(|i| CaseRecord::new(date(2023, 1, 1 + i as u32), (i * 3) as f64))
            .collect();
        let series = CaseSeries::new("cholera", records);

        let scaled = series.scaled_counts();
        let mean = scaled.sum() / scaled.len() as f64;
        let var = scaled.iter().map(|v| v * v).sum::<f64>() / scaled.len() as f64;

        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_precomputed_scaled_values_are_kept() {
        let records = vec![
            CaseRecord {
                day: date(2023, 1, 1),
                count: 10.0,
                count_scaled: Some(0.25),
            },
            CaseRecord {
                day: date(2023, 1, 2),
                count: 20.0,
                count_scaled: Some(-0.5),
            },
        ];
        let series = CaseSeries::new("cholera", records);

        assert_eq!(series.scaled_counts().to_vec(), vec![0.25, -0.5]);
    }

    #[test]
    fn test_constant_series_scales_to_zero() {
        let records = (0..5)
            .map(|i| CaseRecord::new(date(2023, 2, 1 + i as u32), 7.0))
            .collect();
        let series = CaseSeries::new("cholera", records);

        assert!(series.scaled_counts().iter().all(|v| *v == 0.0));
    }
}
