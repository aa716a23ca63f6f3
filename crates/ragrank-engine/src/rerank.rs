use std::sync::Arc;
use tracing::{debug, info, warn};

use ragrank_core::config::DEFAULT_RERANK_BATCH_SIZE;
use ragrank_core::types::{Candidate, RankedResult};
use ragrank_core::{Error, Result};

use crate::model_cache::ModelCache;

/// Second stage: joint (query, passage) scoring with a cross-encoder.
///
/// Unlike vector distance, which embeds query and passage independently, the
/// cross-encoder reads them together; its raw score is kept as-is and only the
/// relative order matters.
pub struct Reranker {
    cache: Arc<ModelCache>,
    model: String,
    batch_size: usize,
}

impl Reranker {
    pub fn new(cache: Arc<ModelCache>, model: impl Into<String>) -> Self {
        Self { cache, model: model.into(), batch_size: DEFAULT_RERANK_BATCH_SIZE }
    }

    /// Pairs per model call. Affects throughput only, never the ranking.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn rerank(&self, query_text: &str, candidates: Vec<Candidate>, top_n: usize) -> Result<Vec<RankedResult>> {
        self.rerank_with_model(query_text, candidates, top_n, &self.model)
    }

    /// Same as [`rerank`](Self::rerank) with the model (alias or id) chosen per
    /// call. The cache reloads only if the resolved model differs.
    pub fn rerank_with_model(
        &self,
        query_text: &str,
        candidates: Vec<Candidate>,
        top_n: usize,
        model: &str,
    ) -> Result<Vec<RankedResult>> {
        let candidates: Vec<Candidate> = candidates.into_iter().filter(Candidate::has_text).collect();
        if candidates.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let cross_encoder = self.cache.get_rerank_model(model)?;
        let pairs: Vec<(String, String)> =
            candidates.iter().map(|c| (query_text.to_string(), c.text.clone())).collect();
        let mut scores = Vec::with_capacity(pairs.len());
        for batch in pairs.chunks(self.batch_size) {
            let batch_scores = cross_encoder.score_pairs(batch).map_err(Error::Inference)?;
            if batch_scores.len() != batch.len() {
                return Err(Error::Inference(anyhow::anyhow!(
                    "cross-encoder returned {} scores for {} pairs",
                    batch_scores.len(),
                    batch.len()
                )));
            }
            scores.extend(batch_scores);
        }

        let mut ranked: Vec<RankedResult> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, rerank_score)| RankedResult { candidate, rerank_score })
            .collect();
        let unscored = ranked.iter().filter(|r| r.rerank_score.is_nan()).count();
        if unscored > 0 {
            warn!(unscored, model, "cross-encoder returned NaN scores; ranking them last");
        }
        // Stable: equal scores keep their retrieval order.
        ranked.sort_by(|a, b| sort_key(b.rerank_score).total_cmp(&sort_key(a.rerank_score)));
        ranked.truncate(top_n);
        debug!(n = ranked.len(), top_n, model, "re-ranked candidates");
        Ok(ranked)
    }

    /// Run the same candidates through several models, e.g. to pick one for a
    /// corpus. Results come back in the order of `models`.
    pub fn compare_models(
        &self,
        query_text: &str,
        candidates: &[Candidate],
        models: &[&str],
        top_n: usize,
    ) -> Result<Vec<(String, Vec<RankedResult>)>> {
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let ranked = self.rerank_with_model(query_text, candidates.to_vec(), top_n, model)?;
            if let Some(top) = ranked.first() {
                info!(model, top_score = top.rerank_score, "compared model");
            }
            out.push(((*model).to_string(), ranked));
        }
        Ok(out)
    }
}

/// NaN compares as the lowest possible score.
fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
