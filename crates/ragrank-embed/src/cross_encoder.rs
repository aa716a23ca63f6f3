use anyhow::Result;
use candle_core::{Device, IndexOp, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use ragrank_core::traits::CrossEncoder;

use crate::model::{Architecture, Encoder, ModelFiles};
use crate::tokenize::{encode_pairs, EncodedBatch};

/// BERT body with the pooler + single-logit classifier used by ms-marco cross-encoders.
struct BertRelevanceHead {
    encoder: Encoder,
    pooler: Linear,
    classifier: Linear,
}

impl BertRelevanceHead {
    fn load(files: &ModelFiles, vb: VarBuilder) -> Result<Self> {
        let hidden = files.hidden_size()?;
        let encoder = Encoder::load(files, vb.pp("bert"))?;
        let pooler = linear(hidden, hidden, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(hidden, 1, vb.pp("classifier"))?;
        Ok(Self { encoder, pooler, classifier })
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Tensor> {
        let hidden = self.encoder.hidden_states(batch)?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        Ok(self.classifier.forward(&pooled)?)
    }
}

enum Head {
    XlmRoberta(XLMRobertaForSequenceClassification),
    Bert(BertRelevanceHead),
}

/// Cross-encoder scoring `(query, passage)` pairs jointly. Scores are the raw
/// relevance logit, unnormalized.
pub struct CandleCrossEncoder {
    head: Head,
    tokenizer: Tokenizer,
    device: Device,
}

impl CandleCrossEncoder {
    pub fn load(root: &Path, model_id: &str, device: Device) -> Result<Self> {
        let start = Instant::now();
        let files = ModelFiles::locate(root, model_id)?;
        info!(model = model_id, dir = %files.dir.display(), "loading cross-encoder");
        let tokenizer = files.tokenizer()?;
        let vb = files.var_builder(&device)?;
        let head = match files.architecture {
            Architecture::XlmRoberta => {
                let config: XLMRobertaConfig = serde_json::from_value(files.config.clone())?;
                Head::XlmRoberta(XLMRobertaForSequenceClassification::new(1, &config, vb)?)
            }
            Architecture::Bert => Head::Bert(BertRelevanceHead::load(&files, vb)?),
        };
        info!(model = model_id, elapsed_ms = start.elapsed().as_millis() as u64, "cross-encoder ready");
        Ok(Self { head, tokenizer, device })
    }
}

impl CrossEncoder for CandleCrossEncoder {
    fn score_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let batch = encode_pairs(&self.tokenizer, pairs, &self.device)?;
        let logits = match &self.head {
            Head::XlmRoberta(m) => m.forward(&batch.input_ids, &batch.attention_mask, &batch.token_type_ids)?,
            Head::Bert(m) => m.forward(&batch)?,
        };
        // [B,1] -> [B]
        let scores: Vec<f32> = logits.squeeze(1)?.to_device(&Device::Cpu)?.to_vec1()?;
        debug!(n = pairs.len(), elapsed_ms = start.elapsed().as_millis() as u64, "scored pairs");
        Ok(scores)
    }
}
