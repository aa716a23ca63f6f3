//! Locating and loading transformer checkpoints from a local model directory.
//!
//! A model id such as `BAAI/bge-reranker-base` maps to `<root>/BAAI/bge-reranker-base`,
//! which must hold `config.json`, `tokenizer.json` and either `model.safetensors`
//! or `pytorch_model.bin`.

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::debug;

use crate::tokenize::{prepare_tokenizer, EncodedBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    XlmRoberta,
    Bert,
}

impl Architecture {
    pub fn detect(config: &serde_json::Value) -> Result<Self> {
        match config.get("model_type").and_then(|v| v.as_str()) {
            Some("xlm-roberta") => Ok(Self::XlmRoberta),
            Some("bert") => Ok(Self::Bert),
            Some(other) => bail!("unsupported model_type '{}'", other),
            None => bail!("config.json has no model_type"),
        }
    }
}

pub struct ModelFiles {
    pub dir: PathBuf,
    pub config: serde_json::Value,
    pub architecture: Architecture,
    weights: PathBuf,
}

impl ModelFiles {
    pub fn locate(root: &Path, model_id: &str) -> Result<Self> {
        let dir = root.join(model_id);
        if !dir.is_dir() {
            bail!("model directory {} does not exist", dir.display());
        }
        let config_path = dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        let architecture = Architecture::detect(&config)?;
        let weights = ["model.safetensors", "pytorch_model.bin"]
            .iter()
            .map(|f| dir.join(f))
            .find(|p| p.exists())
            .ok_or_else(|| anyhow!("no model.safetensors or pytorch_model.bin in {}", dir.display()))?;
        Ok(Self { dir, config, architecture, weights })
    }

    pub fn hidden_size(&self) -> Result<usize> {
        self.config
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))
    }

    /// Longest input the position embeddings allow (XLM-R reserves two slots).
    pub fn max_len(&self) -> usize {
        let positions = self
            .config
            .get("max_position_embeddings")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(512) as usize;
        match self.architecture {
            Architecture::XlmRoberta => positions.saturating_sub(2).min(512),
            Architecture::Bert => positions.min(512),
        }
    }

    pub fn tokenizer(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
        prepare_tokenizer(tokenizer, self.max_len())
    }

    pub fn var_builder(&self, device: &Device) -> Result<VarBuilder<'static>> {
        let dtype = DType::F32;
        debug!(weights = %self.weights.display(), "loading weights");
        if self.weights.extension().and_then(|e| e.to_str()) == Some("safetensors") {
            let bytes = std::fs::read(&self.weights)?;
            Ok(VarBuilder::from_buffered_safetensors(bytes, dtype, device)?)
        } else {
            let weights = candle_core::pickle::read_all(&self.weights)?;
            let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
            Ok(VarBuilder::from_tensors(weights_map, dtype, device))
        }
    }
}

/// Transformer body producing per-token hidden states.
pub enum Encoder {
    XlmRoberta(XLMRobertaModel),
    Bert(BertModel),
}

impl Encoder {
    /// `vb` must point at the encoder root (e.g. `vb.pp("bert")` for checkpoints
    /// that carry a task head).
    pub fn load(files: &ModelFiles, vb: VarBuilder) -> Result<Self> {
        match files.architecture {
            Architecture::XlmRoberta => {
                let config: XLMRobertaConfig = serde_json::from_value(files.config.clone())?;
                Ok(Self::XlmRoberta(XLMRobertaModel::new(&config, vb)?))
            }
            Architecture::Bert => {
                let config: BertConfig = serde_json::from_value(files.config.clone())?;
                Ok(Self::Bert(BertModel::load(vb, &config)?))
            }
        }
    }

    /// `[B,T] -> [B,T,H]`
    pub fn hidden_states(&self, batch: &EncodedBatch) -> Result<Tensor> {
        let hidden = match self {
            Self::XlmRoberta(m) => m.forward(
                &batch.input_ids,
                &batch.attention_mask,
                &batch.token_type_ids,
                None,
                None,
                None,
            )?,
            Self::Bert(m) => m.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?,
        };
        Ok(hidden)
    }
}
