//! Case table loading and saving
//!
//! CSV is the interchange format: `day,count` with an optional
//! `count_scaled` column. Normalization happens in [`CaseSeries::new`]
//! when the scaled column is absent.

use csv::{Reader, Writer};
use std::fs::File;
use std::path::Path;

use super::types::{CaseRecord, CaseSeries};
use crate::error::Result;

/// Loader for disease case tables
pub struct CaseDataLoader;

impl CaseDataLoader {
    /// Load a case series from a CSV file
    pub fn load_csv<P: AsRef<Path>>(disease: &str, path: P) -> Result<CaseSeries> {
        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(file);

        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: CaseRecord = result?;
            records.push(record);
        }

        Ok(CaseSeries::new(disease, records))
    }

    /// Save a case series to a CSV file
    pub fn save_csv<P: AsRef<Path>>(series: &CaseSeries, path: P) -> Result<()> {
        let file = File::create(&path)?;
        let mut writer = Writer::from_writer(file);

        for record in series.records() {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
