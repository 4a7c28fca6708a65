//! Transformer model components
//!
//! Layers, positional encoding, attention blocks, the encoder-decoder model,
//! named-parameter loading and the inference-facing predictor.

pub mod attention;
pub mod encoding;
pub mod layers;
pub mod params;
pub mod predictor;
pub mod transformer;

pub use attention::MultiHeadAttention;
pub use encoding::SinusoidalEncoding;
pub use layers::{softmax, softmax_rows, FeedForward, LayerNorm, Linear};
pub use params::{LoadReport, ParamMap, TensorEntry};
pub use predictor::TrendPredictor;
pub use transformer::{DecoderLayer, EncoderLayer, TrendModel};
