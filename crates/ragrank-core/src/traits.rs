//! Seams between the pipeline and its backends.
//!
//! All methods are blocking; implementations that talk to async clients own
//! their runtime.

use std::sync::Arc;

use crate::types::{Candidate, RankedResult};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Joint (query, passage) relevance model. Returns one raw score per pair,
/// in input order.
pub trait CrossEncoder: Send + Sync {
    fn score_pairs(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>>;
}

/// Read side of the vector store.
pub trait ChunkStore: Send + Sync {
    /// Up to `limit` chunks with a non-null embedding, nearest first.
    fn nearest(&self, query_vec: &[f32], limit: usize) -> anyhow::Result<Vec<Candidate>>;
}

/// Produces the final answer from the user's question and the ranked passages.
pub trait Generator {
    fn generate(&self, question: &str, chunks: &[RankedResult]) -> anyhow::Result<String>;
}

impl<F> Generator for F
where
    F: Fn(&str, &[RankedResult]) -> anyhow::Result<String>,
{
    fn generate(&self, question: &str, chunks: &[RankedResult]) -> anyhow::Result<String> {
        self(question, chunks)
    }
}

/// Builds model handles from a model id. Hosts pick the backend (local
/// candle weights, remote, or deterministic stand-ins).
pub trait ModelLoader: Send + Sync {
    fn load_embedder(&self, name: &str) -> anyhow::Result<Arc<dyn Embedder>>;
    fn load_cross_encoder(&self, name: &str) -> anyhow::Result<Arc<dyn CrossEncoder>>;
}
