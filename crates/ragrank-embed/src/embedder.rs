use anyhow::Result;
use candle_core::Device;
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use ragrank_core::traits::Embedder;

use crate::model::{Encoder, ModelFiles};
use crate::pool::masked_mean_l2;
use crate::tokenize::encode_texts;

/// Sentence embedder: transformer encoder + masked mean pooling + L2 norm.
pub struct TransformerEmbedder {
    model: Encoder,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
}

impl TransformerEmbedder {
    pub fn load(root: &Path, model_id: &str, device: Device) -> Result<Self> {
        let start = Instant::now();
        let files = ModelFiles::locate(root, model_id)?;
        info!(model = model_id, dir = %files.dir.display(), "loading embedding model");
        let tokenizer = files.tokenizer()?;
        let dim = files.hidden_size()?;
        let vb = files.var_builder(&device)?;
        let model = Encoder::load(&files, vb)?;
        info!(model = model_id, dim, elapsed_ms = start.elapsed().as_millis() as u64, "embedding model ready");
        Ok(Self { model, tokenizer, device, dim })
    }
}

impl Embedder for TransformerEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let batch = encode_texts(&self.tokenizer, texts, &self.device)?;
        let hidden = self.model.hidden_states(&batch)?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let out: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        debug!(n = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}
