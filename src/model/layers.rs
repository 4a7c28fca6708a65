//! Basic neural network layers
//!
//! Linear projection, layer normalization and the position-wise feed-forward
//! block shared by the encoder and decoder stacks.

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::StandardNormal;

use super::params::ParamLoader;
use crate::error::Result;

/// Xavier/Glorot initialized weight matrix
pub(crate) fn xavier_init(rows: usize, cols: usize) -> Array2<f64> {
    let std = (2.0 / (rows + cols) as f64).sqrt();
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.sample::<f64, _>(StandardNormal) * std)
}

/// Linear layer: y = xW + b
#[derive(Debug, Clone)]
pub struct Linear {
    /// Weight matrix, shape (in_features, out_features)
    pub weight: Array2<f64>,
    /// Bias vector, shape (out_features,)
    pub bias: Array1<f64>,
}

impl Linear {
    /// Create a new linear layer with Xavier initialization
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self {
            weight: xavier_init(in_features, out_features),
            bias: Array1::zeros(out_features),
        }
    }

    /// Forward pass for a (seq_len, in_features) matrix
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.weight) + &self.bias
    }

    /// Forward pass for a single feature vector
    pub fn forward_1d(&self, x: &Array1<f64>) -> Array1<f64> {
        x.dot(&self.weight) + &self.bias
    }

    pub(crate) fn load(&mut self, prefix: &str, loader: &mut ParamLoader<'_>) -> Result<()> {
        loader.load2(&format!("{}.weight", prefix), &mut self.weight)?;
        loader.load1(&format!("{}.bias", prefix), &mut self.bias)
    }
}

/// Layer normalization with learned per-channel scale and offset
#[derive(Debug, Clone)]
pub struct LayerNorm {
    /// Scale parameters (gamma)
    pub gamma: Array1<f64>,
    /// Shift parameters (beta)
    pub beta: Array1<f64>,
    /// Epsilon for numerical stability
    pub eps: f64,
}

impl LayerNorm {
    /// Create a new layer norm over `dim` channels
    pub fn new(dim: usize) -> Self {
        Self {
            gamma: Array1::ones(dim),
            beta: Array1::zeros(dim),
            eps: 1e-5,
        }
    }

    /// Normalize each row to zero mean and unit variance, then scale and shift
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        let dim = self.gamma.len();
        let mut result = x.clone();

        for mut row in result.rows_mut() {
            let mean = row.sum() / dim as f64;
            let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / dim as f64;
            let std = (var + self.eps).sqrt();

            for j in 0..dim {
                row[j] = ((row[j] - mean) / std) * self.gamma[j] + self.beta[j];
            }
        }

        result
    }

    pub(crate) fn load(&mut self, prefix: &str, loader: &mut ParamLoader<'_>) -> Result<()> {
        loader.load1(&format!("{}.gamma", prefix), &mut self.gamma)?;
        loader.load1(&format!("{}.beta", prefix), &mut self.beta)
    }
}

/// Position-wise feed-forward block
///
/// Two-layer projection with ReLU, residual connection and post-norm,
/// matching the encoder/decoder layer layout of the pretrained weights.
#[derive(Debug, Clone)]
pub struct FeedForward {
    /// Expansion projection, d_model -> d_ff
    pub linear1: Linear,
    /// Contraction projection, d_ff -> d_model
    pub linear2: Linear,
    /// Post-residual normalization
    pub norm: LayerNorm,
    /// Dropout rate, stored for completeness but identity at inference
    pub dropout: f64,
}

impl FeedForward {
    /// Create a new feed-forward block
    pub fn new(d_model: usize, d_ff: usize, dropout: f64) -> Self {
        Self {
            linear1: Linear::new(d_model, d_ff),
            linear2: Linear::new(d_ff, d_model),
            norm: LayerNorm::new(d_model),
            dropout,
        }
    }

    /// Forward pass: norm(x + W2 relu(W1 x))
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        let hidden = self.linear1.forward(x).mapv(|v| v.max(0.0));
        let projected = self.linear2.forward(&hidden);
        self.norm.forward(&(x + &projected))
    }

    pub(crate) fn load(&mut self, prefix: &str, loader: &mut ParamLoader<'_>) -> Result<()> {
        self.linear1.load(&format!("{}.linear1", prefix), loader)?;
        self.linear2.load(&format!("{}.linear2", prefix), loader)?;
        self.norm.load(&format!("{}.norm", prefix), loader)
    }
}

/// Apply softmax along the last axis of a matrix
pub fn softmax_rows(x: &Array2<f64>) -> Array2<f64> {
    let max_vals = x.map_axis(Axis(1), |row| {
        row.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    });

    let shifted = x - &max_vals.insert_axis(Axis(1));
    let exp_x = shifted.mapv(f64::exp);
    let sum_exp = exp_x.sum_axis(Axis(1));

    &exp_x / &sum_exp.insert_axis(Axis(1))
}

/// Softmax for a 1D logit vector
pub fn softmax(x: &Array1<f64>) -> Array1<f64> {
    let max = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp_x: Array1<f64> = x.mapv(|v| (v - max).exp());
    let sum = exp_x.sum();
    &exp_x / sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_shape() {
        let layer = Linear::new(8, 16);
        let x = Array2::zeros((5, 8));

        let output = layer.forward(&x);
        assert_eq!(output.shape(), &[5, 16]);
    }

    #[test]
    fn test_layer_norm_statistics() {
        let ln = LayerNorm::new(32);
        let x = Array2::from_shape_fn((4, 32), |(i, j)| (i * 32 + j) as f64);

        let output = ln.forward(&x);

        for row in output.rows() {
            let mean = row.sum() / 32.0;
            let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 32.0;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_feed_forward_shape() {
        let ff = FeedForward::new(16, 64, 0.1);
        let x = Array2::from_shape_fn((10, 16), |_| rand::random::<f64>());

        let output = ff.forward(&x);
        assert_eq!(output.shape(), &[10, 16]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let x = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0]).unwrap();
        let result = softmax_rows(&x);

        for row in result.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_softmax_1d() {
        let x = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let probs = softmax(&x);

        assert_abs_diff_eq!(probs.sum(), 1.0, epsilon = 1e-10);
        assert!(probs[2] > probs[1]);
        assert!(probs[1] > probs[0]);
    }
}
