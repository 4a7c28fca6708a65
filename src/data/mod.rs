//! Case-count data layer
//!
//! Types for daily case tables, CSV loading with on-the-fly normalization,
//! and input-window construction for the model.

pub mod loader;
pub mod types;
pub mod window;

pub use loader::CaseDataLoader;
pub use types::{CaseRecord, CaseSeries};
pub use window::{InputWindow, WindowProvider};
