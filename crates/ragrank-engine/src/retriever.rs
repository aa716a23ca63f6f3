use std::sync::Arc;
use tracing::debug;

use ragrank_core::traits::ChunkStore;
use ragrank_core::types::Candidate;
use ragrank_core::{Error, Result};

use crate::model_cache::ModelCache;

/// First stage: embed the query and pull the nearest chunks from the store.
pub struct CandidateRetriever {
    cache: Arc<ModelCache>,
    store: Arc<dyn ChunkStore>,
    embedding_model: String,
}

impl CandidateRetriever {
    pub fn new(cache: Arc<ModelCache>, store: Arc<dyn ChunkStore>, embedding_model: impl Into<String>) -> Self {
        Self { cache, store, embedding_model: embedding_model.into() }
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// At most `top_k` candidates, nearest first. No retries: store failures
    /// come back as [`Error::Backend`].
    pub fn retrieve_candidates(&self, query_text: &str, top_k: usize) -> Result<Vec<Candidate>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embed_query(query_text)?;
        let mut candidates = self.store.nearest(&query_vec, top_k).map_err(Error::Backend)?;
        candidates.truncate(top_k);
        debug!(n = candidates.len(), top_k, "retrieved candidates");
        Ok(candidates)
    }

    fn embed_query(&self, query_text: &str) -> Result<Vec<f32>> {
        let embedder = self.cache.get_embedding_model(&self.embedding_model)?;
        embedder
            .embed_batch(&[query_text.to_string()])
            .map_err(Error::Inference)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference(anyhow::anyhow!("embedder returned no vector for the query")))
    }
}
