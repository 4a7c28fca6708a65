//! Sinusoidal positional encoding
//!
//! Injects a deterministic position signal into sequence embeddings so the
//! permutation-invariant attention layers can see day order. The table is
//! precomputed once up to a maximum length; applying it to a sequence only
//! slices, never recomputes.

use ndarray::{s, Array2};

/// Precomputed sinusoidal positional encoding
///
/// PE(pos, 2i) = sin(pos / 10000^(2i/d_model))
/// PE(pos, 2i+1) = cos(pos / 10000^(2i/d_model))
#[derive(Debug, Clone)]
pub struct SinusoidalEncoding {
    d_model: usize,
    max_len: usize,
    table: Array2<f64>,
}

impl SinusoidalEncoding {
    /// Precompute the encoding table
    ///
    /// # Arguments
    ///
    /// * `d_model` - Embedding dimension (must be even)
    /// * `max_len` - Maximum sequence length to precompute
    pub fn new(d_model: usize, max_len: usize) -> Self {
        let mut table = Array2::zeros((max_len, d_model));

        for pos in 0..max_len {
            for i in 0..(d_model / 2) {
                let angle = (pos as f64) / 10000_f64.powf((2.0 * i as f64) / d_model as f64);
                table[[pos, 2 * i]] = angle.sin();
                table[[pos, 2 * i + 1]] = angle.cos();
            }
        }

        Self {
            d_model,
            max_len,
            table,
        }
    }

    /// Embedding dimension
    pub fn d_model(&self) -> usize {
        self.d_model
    }

    /// Maximum supported sequence length
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Encoding rows for the first `len` positions
    pub fn table(&self, len: usize) -> ndarray::ArrayView2<'_, f64> {
        self.table.slice(s![..len, ..])
    }

    /// Add the position signal to a (seq_len, d_model) embedding
    ///
    /// The sequence must not exceed the precomputed maximum length.
    pub fn apply(&self, x: &Array2<f64>) -> Array2<f64> {
        let seq_len = x.nrows();
        debug_assert!(
            seq_len <= self.max_len,
            "sequence length {} exceeds precomputed table length {}",
            seq_len,
            self.max_len
        );
        x + &self.table.slice(s![..seq_len, ..])
    }
}
