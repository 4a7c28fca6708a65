//! Encoder-decoder trend model
//!
//! Maps a scaled 30-day case-count window to the forecast head's raw output.
//! The encoder reads the input window; the decoder starts from a learned
//! fixed-length seed sequence (one row per horizon day) and cross-attends
//! against the encoder memory. The head averages the decoder output over the
//! horizon and projects it to per-day values or class logits depending on
//! the configured output mode.

use ndarray::{Array1, Array2, Axis};

use super::attention::MultiHeadAttention;
use super::encoding::SinusoidalEncoding;
use super::layers::{FeedForward, Linear};
use super::params::{LoadReport, ParamLoader, ParamMap};
use crate::config::ModelConfig;
use crate::error::Result;

/// Maximum sequence length precomputed for positional encoding
const MAX_POSITIONS: usize = 512;

/// A single encoder layer: self-attention + feed-forward
#[derive(Debug, Clone)]
pub struct EncoderLayer {
    /// Self-attention over the input window
    pub self_attn: MultiHeadAttention,
    /// Position-wise feed-forward block
    pub feed_forward: FeedForward,
}

impl EncoderLayer {
    fn new(config: &ModelConfig) -> Self {
        Self {
            self_attn: MultiHeadAttention::new(config.d_model, config.n_heads, config.dropout),
            feed_forward: FeedForward::new(config.d_model, config.d_ff, config.dropout),
        }
    }

    /// Forward pass, shape preserved
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        let x = self.self_attn.forward(x, x);
        self.feed_forward.forward(&x)
    }

    fn load(&mut self, prefix: &str, loader: &mut ParamLoader<'_>) -> Result<()> {
        self.self_attn.load(&format!("{}.self_attn", prefix), loader)?;
        self.feed_forward
            .load(&format!("{}.feed_forward", prefix), loader)
    }
}

/// A single decoder layer: self-attention, cross-attention vs memory,
/// feed-forward
#[derive(Debug, Clone)]
pub struct DecoderLayer {
    /// Self-attention over the horizon sequence
    pub self_attn: MultiHeadAttention,
    /// Cross-attention: horizon queries against encoder memory
    pub cross_attn: MultiHeadAttention,
    /// Position-wise feed-forward block
    pub feed_forward: FeedForward,
}

impl DecoderLayer {
    fn new(config: &ModelConfig) -> Self {
        Self {
            self_attn: MultiHeadAttention::new(config.d_model, config.n_heads, config.dropout),
            cross_attn: MultiHeadAttention::new(config.d_model, config.n_heads, config.dropout),
            feed_forward: FeedForward::new(config.d_model, config.d_ff, config.dropout),
        }
    }

    /// Forward pass; `x` has horizon rows, `memory` has input-window rows
    pub fn forward(&self, x: &Array2<f64>, memory: &Array2<f64>) -> Array2<f64> {
        let x = self.self_attn.forward(x, x);
        let x = self.cross_attn.forward(&x, memory);
        self.feed_forward.forward(&x)
    }

    fn load(&mut self, prefix: &str, loader: &mut ParamLoader<'_>) -> Result<()> {
        self.self_attn.load(&format!("{}.self_attn", prefix), loader)?;
        self.cross_attn
            .load(&format!("{}.cross_attn", prefix), loader)?;
        self.feed_forward
            .load(&format!("{}.feed_forward", prefix), loader)
    }
}

/// Encoder-decoder transformer for outbreak trend forecasting
#[derive(Debug, Clone)]
pub struct TrendModel {
    config: ModelConfig,
    /// Input projection, input_dim -> d_model
    pub input_proj: Linear,
    /// Fixed sinusoidal position table
    pub pos_enc: SinusoidalEncoding,
    /// Encoder stack
    pub encoder_layers: Vec<EncoderLayer>,
    /// Learned decoder seed, shape (horizon, d_model), identical every call
    pub decoder_seed: Array2<f64>,
    /// Decoder stack
    pub decoder_layers: Vec<DecoderLayer>,
    /// Forecast head, d_model -> output_dim
    pub head: Linear,
}

impl TrendModel {
    /// Build a model with freshly initialized weights
    ///
    /// The decoder seed starts at zero, matching the pretrained export;
    /// everything else uses Xavier initialization.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let encoder_layers = (0..config.n_layers)
            .map(|_| EncoderLayer::new(&config))
            .collect();
        let decoder_layers = (0..config.n_layers)
            .map(|_| DecoderLayer::new(&config))
            .collect();

        Ok(Self {
            input_proj: Linear::new(config.input_dim, config.d_model),
            pos_enc: SinusoidalEncoding::new(config.d_model, MAX_POSITIONS),
            encoder_layers,
            decoder_seed: Array2::zeros((config.horizon, config.d_model)),
            decoder_layers,
            head: Linear::new(config.d_model, config.output_dim()),
            config,
        })
    }

    /// Model configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Encode the input window into memory
    ///
    /// `window` has shape (input_len, input_dim); the result keeps the row
    /// count and widens to d_model.
    pub fn encode(&self, window: &Array2<f64>) -> Array2<f64> {
        let projected = self.input_proj.forward(window);
        let mut x = self.pos_enc.apply(&projected);

        for layer in &self.encoder_layers {
            x = layer.forward(&x);
        }
        x
    }

    /// Run the decoder stack against encoder memory
    ///
    /// Returns (horizon, d_model). The starting sequence is the learned seed,
    /// independent of the input window.
    pub fn decode(&self, memory: &Array2<f64>) -> Array2<f64> {
        let mut x = self.decoder_seed.clone();

        for layer in &self.decoder_layers {
            x = layer.forward(&x, memory);
        }
        x
    }

    /// Full forward pass: raw head output for one window
    ///
    /// The result has `config.output_dim()` entries: per-day values in
    /// per-day mode, class logits in class-distribution mode.
    pub fn forward(&self, window: &Array2<f64>) -> Array1<f64> {
        let memory = self.encode(window);
        let decoded = self.decode(&memory);

        // Average over the horizon dimension, then project
        let summary = decoded.sum_axis(Axis(0)) / self.config.horizon as f64;
        self.head.forward_1d(&summary)
    }

    /// Assign weights from a named parameter map (non-strict)
    ///
    /// Unknown names in the map are ignored; model parameters missing from
    /// the map keep their initialization. Both cases are listed in the
    /// returned report, and partial loads emit a warning. A shape mismatch
    /// on any name the model uses is fatal.
    pub fn load_state(&mut self, params: &ParamMap) -> Result<LoadReport> {
        let mut loader = ParamLoader::new(params);

        self.input_proj.load("input_proj", &mut loader)?;
        for (i, layer) in self.encoder_layers.iter_mut().enumerate() {
            layer.load(&format!("encoder.{}", i), &mut loader)?;
        }
        loader.load2("decoder.seed", &mut self.decoder_seed)?;
        for (i, layer) in self.decoder_layers.iter_mut().enumerate() {
            layer.load(&format!("decoder.{}", i), &mut loader)?;
        }
        self.head.load("head", &mut loader)?;

        let report = loader.finish();
        if !report.is_complete() {
            tracing::warn!(
                "{} model parameter(s) absent from weight file, left at initialization: {}",
                report.missing.len(),
                report.missing.join(", ")
            );
        }
        if !report.ignored.is_empty() {
            tracing::debug!(
                "ignored {} unrecognized tensor(s) in weight file",
                report.ignored.len()
            );
        }
        Ok(report)
    }

    /// Export the current weights as a named parameter map
    pub fn state(&self) -> ParamMap {
        let mut params = ParamMap::new();

        params.insert2("input_proj.weight", &self.input_proj.weight);
        params.insert1("input_proj.bias", &self.input_proj.bias);

        for (i, layer) in self.encoder_layers.iter().enumerate() {
            export_attention(
                &mut params,
                &format!("encoder.{}.self_attn", i),
                &layer.self_attn,
            );
            export_feed_forward(
                &mut params,
                &format!("encoder.{}.feed_forward", i),
                &layer.feed_forward,
            );
        }

        params.insert2("decoder.seed", &self.decoder_seed);

        for (i, layer) in self.decoder_layers.iter().enumerate() {
            export_attention(
                &mut params,
                &format!("decoder.{}.self_attn", i),
                &layer.self_attn,
            );
            export_attention(
                &mut params,
                &format!("decoder.{}.cross_attn", i),
                &layer.cross_attn,
            );
            export_feed_forward(
                &mut params,
                &format!("decoder.{}.feed_forward", i),
                &layer.feed_forward,
            );
        }

        params.insert2("head.weight", &self.head.weight);
        params.insert1("head.bias", &self.head.bias);

        params
    }
}

fn export_attention(params: &mut ParamMap, prefix: &str, attn: &MultiHeadAttention) {
    for (name, linear) in [
        ("w_q", &attn.w_q),
        ("w_k", &attn.w_k),
        ("w_v", &attn.w_v),
        ("w_o", &attn.w_o),
    ] {
        params.insert2(&format!("{}.{}.weight", prefix, name), &linear.weight);
        params.insert1(&format!("{}.{}.bias", prefix, name), &linear.bias);
    }
    params.insert1(&format!("{}.norm.gamma", prefix), &attn.norm.gamma);
    params.insert1(&format!("{}.norm.beta", prefix), &attn.norm.beta);
}

fn export_feed_forward(params: &mut ParamMap, prefix: &str, ff: &FeedForward) {
    params.insert2(&format!("{}.linear1.weight", prefix), &ff.linear1.weight);
    params.insert1(&format!("{}.linear1.bias", prefix), &ff.linear1.bias);
    params.insert2(&format!("{}.linear2.weight", prefix), &ff.linear2.weight);
    params.insert1(&format!("{}.linear2.bias", prefix), &ff.linear2.bias);
    params.insert1(&format!("{}.norm.gamma", prefix), &ff.norm.gamma);
    params.insert1(&format!("{}.norm.beta", prefix), &ff.norm.beta);
}
