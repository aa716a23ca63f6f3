//! Model backends: transformer embedders and cross-encoders on candle, plus
//! deterministic stand-ins for development.

pub mod cross_encoder;
pub mod device;
pub mod embedder;
pub mod fake;
pub mod loader;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use cross_encoder::CandleCrossEncoder;
pub use embedder::TransformerEmbedder;
pub use fake::{HashingEmbedder, LexicalCrossEncoder};
pub use loader::LocalModelLoader;
pub use pool::masked_mean_l2;
