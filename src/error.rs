//! Error types for the outbreak trend library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough history to build an input window
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// No case series registered for the requested disease
    #[error("no data available for disease: {0}")]
    UnknownDisease(String),

    /// A loaded parameter tensor does not match the model's expected shape
    #[error("parameter `{name}`: expected shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Invalid input or configuration
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Data parsing error
    #[error("failed to parse data: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Check if the error is a data-availability problem rather than a
    /// model or programming error
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData(_) | Error::UnknownDisease(_)
        )
    }
}
