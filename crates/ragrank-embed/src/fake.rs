//! Deterministic stand-ins for the transformer models.
//!
//! Used in development and tests (`APP_USE_FAKE_MODELS=1`) so the pipeline runs
//! without downloading weights. Vectors are L2-normalized; relevance scores
//! grow with query-token overlap.

use anyhow::Result;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use ragrank_core::traits::{CrossEncoder, Embedder};

pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Scores a pair by the share of query tokens found in the passage, scaled to
/// roughly the logit range of ms-marco cross-encoders.
#[derive(Default)]
pub struct LexicalCrossEncoder;

impl LexicalCrossEncoder {
    fn score(query: &str, passage: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() {
            return -10.0;
        }
        let passage_lower = passage.to_lowercase();
        let passage_words: HashSet<&str> = passage_lower.split_whitespace().collect();
        let overlap = query_words.iter().filter(|w| passage_words.contains(*w)).count();
        (overlap as f32 / query_words.len() as f32) * 20.0 - 10.0
    }
}

impl CrossEncoder for LexicalCrossEncoder {
    fn score_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        Ok(pairs.iter().map(|(q, p)| Self::score(q, p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_scores_follow_overlap() {
        let ce = LexicalCrossEncoder;
        let pairs = vec![
            ("תודעה אקטיבית".to_string(), "תודעה אקטיבית מאפשרת בחירה".to_string()),
            ("תודעה אקטיבית".to_string(), "תודעה ריאקטיבית".to_string()),
            ("תודעה אקטיבית".to_string(), "מזג האוויר".to_string()),
        ];
        let scores = ce.score_pairs(&pairs).unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1]);
        assert!(scores[1] > scores[2]);
        assert!((scores[0] - 10.0).abs() < 1e-6);
        assert!((scores[2] + 10.0).abs() < 1e-6);
    }

    #[test]
    fn hashing_embedder_respects_dim() {
        let e = HashingEmbedder::new(16);
        let out = e.embed_batch(&["a b c".to_string()]).unwrap();
        assert_eq!(out[0].len(), 16);
        assert_eq!(e.dim(), 16);
    }
}
