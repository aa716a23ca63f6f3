use anyhow::{anyhow, ensure, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Padded model inputs for one batch, all `[B,T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Configure batch-longest padding and truncation at `max_len` tokens.
pub fn prepare_tokenizer(mut tokenizer: Tokenizer, max_len: usize) -> Result<Tokenizer> {
    let (pad_token, pad_id) = ["<pad>", "[PAD]"]
        .iter()
        .find_map(|t| tokenizer.token_to_id(t).map(|id| (t.to_string(), id)))
        .unwrap_or_else(|| ("[PAD]".to_string(), 0));
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(tokenizer)
}

pub fn encode_texts(tokenizer: &Tokenizer, texts: &[String], device: &Device) -> Result<EncodedBatch> {
    let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let encodings = tokenizer
        .encode_batch(inputs, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    to_batch(&encodings, device)
}

/// Encode `(query, passage)` pairs as single sequences with separator tokens.
pub fn encode_pairs(tokenizer: &Tokenizer, pairs: &[(String, String)], device: &Device) -> Result<EncodedBatch> {
    let inputs: Vec<(&str, &str)> = pairs.iter().map(|(q, p)| (q.as_str(), p.as_str())).collect();
    let encodings = tokenizer
        .encode_batch(inputs, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    to_batch(&encodings, device)
}

fn to_batch(encodings: &[Encoding], device: &Device) -> Result<EncodedBatch> {
    ensure!(!encodings.is_empty(), "cannot build an empty batch");
    let batch = encodings.len();
    let seq_len = encodings[0].get_ids().len();
    let mut ids = Vec::with_capacity(batch * seq_len);
    let mut mask = Vec::with_capacity(batch * seq_len);
    let mut type_ids = Vec::with_capacity(batch * seq_len);
    for enc in encodings {
        ensure!(enc.get_ids().len() == seq_len, "batch is not padded to a common length");
        ids.extend_from_slice(enc.get_ids());
        mask.extend_from_slice(enc.get_attention_mask());
        type_ids.extend_from_slice(enc.get_type_ids());
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (batch, seq_len), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, seq_len), device)?,
        token_type_ids: Tensor::from_vec(type_ids, (batch, seq_len), device)?,
    })
}
