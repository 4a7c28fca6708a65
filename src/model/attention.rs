//! Multi-head scaled dot-product attention
//!
//! One block type serves all three usage sites: encoder self-attention,
//! decoder self-attention and decoder cross-attention. Each instantiation
//! owns independent projection weights. No causal masking exists anywhere
//! in this model: the decoder queries are a learned fixed-length seed, not
//! an autoregressive prefix.

use ndarray::{s, Array2};

use super::layers::{softmax_rows, LayerNorm, Linear};
use super::params::ParamLoader;
use crate::error::Result;

/// Multi-head attention block with residual connection and post-norm
#[derive(Debug, Clone)]
pub struct MultiHeadAttention {
    /// Model dimension
    pub d_model: usize,
    /// Number of attention heads
    pub n_heads: usize,
    /// Dimension per head
    pub d_k: usize,
    /// Query projection
    pub w_q: Linear,
    /// Key projection
    pub w_k: Linear,
    /// Value projection
    pub w_v: Linear,
    /// Output projection
    pub w_o: Linear,
    /// Post-residual normalization
    pub norm: LayerNorm,
    /// Dropout rate, stored for completeness but identity at inference
    pub dropout: f64,
}

impl MultiHeadAttention {
    /// Create a new attention block
    ///
    /// `d_model` must be divisible by `n_heads`.
    pub fn new(d_model: usize, n_heads: usize, dropout: f64) -> Self {
        let d_k = d_model / n_heads;

        Self {
            d_model,
            n_heads,
            d_k,
            w_q: Linear::new(d_model, d_model),
            w_k: Linear::new(d_model, d_model),
            w_v: Linear::new(d_model, d_model),
            w_o: Linear::new(d_model, d_model),
            norm: LayerNorm::new(d_model),
            dropout,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `query` - Query source, shape (q_len, d_model)
    /// * `kv` - Key/value source, shape (kv_len, d_model); pass `query` again
    ///   for self-attention, encoder memory for cross-attention
    ///
    /// # Returns
    ///
    /// Updated query sequence, shape (q_len, d_model)
    pub fn forward(&self, query: &Array2<f64>, kv: &Array2<f64>) -> Array2<f64> {
        let q_len = query.nrows();

        let q = self.w_q.forward(query);
        let k = self.w_k.forward(kv);
        let v = self.w_v.forward(kv);

        let scale = (self.d_k as f64).sqrt();
        let mut context = Array2::zeros((q_len, self.d_model));

        for h in 0..self.n_heads {
            let cols = (h * self.d_k)..((h + 1) * self.d_k);
            let q_h = q.slice(s![.., cols.clone()]);
            let k_h = k.slice(s![.., cols.clone()]);
            let v_h = v.slice(s![.., cols.clone()]);

            // Attention scores: Q_h @ K_h^T / sqrt(d_k), softmax over key positions
            let scores = q_h.dot(&k_h.t()) / scale;
            let weights = softmax_rows(&scores);

            context.slice_mut(s![.., cols]).assign(&weights.dot(&v_h));
        }

        let projected = self.w_o.forward(&context);
        self.norm.forward(&(query + &projected))
    }

    /// Per-head attention weight matrices, for inspection
    ///
    /// Each matrix has shape (q_len, kv_len) with rows summing to 1.
    pub fn attention_weights(&self, query: &Array2<f64>, kv: &Array2<f64>) -> Vec<Array2<f64>> {
        let q = self.w_q.forward(query);
        let k = self.w_k.forward(kv);
        let scale = (self.d_k as f64).sqrt();

        (0..self.n_heads)
            .map(|h| {
                let cols = (h * self.d_k)..((h + 1) * self.d_k);
                let q_h = q.slice(s![.., cols.clone()]);
                let k_h = k.slice(s![.., cols]);
                softmax_rows(&(q_h.dot(&k_h.t()) / scale))
            })
            .collect()
    }

    pub(crate) fn load(&mut self, prefix: &str, loader: &mut ParamLoader<'_>) -> Result<()> {
        self.w_q.load(&format!("{}.w_q", prefix), loader)?;
        self.w_k.load(&format!("{}.w_k", prefix), loader)?;
        self.w_v.load(&format!("{}.w_v", prefix), loader)?;
        self.w_o.load(&format!("{}.w_o", prefix), loader)?;
        self.norm.load(&format!("{}.norm", prefix), loader)
    }
}
