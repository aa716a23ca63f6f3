//! Retrieve -> re-rank -> generate, one request at a time.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use ragrank_core::config::RetrievalSettings;
use ragrank_core::traits::{ChunkStore, Generator};
use ragrank_core::types::RankedResult;
use ragrank_core::{Error, Result};

use crate::model_cache::ModelCache;
use crate::rerank::Reranker;
use crate::retriever::CandidateRetriever;
use crate::timing::StageTimings;

pub const EMPTY_QUERY_MESSAGE: &str = "שאלה ריקה.";
pub const NO_CANDIDATES_MESSAGE: &str = "לא נמצאו קטעים רלוונטיים במסמכים.";
pub const NO_RANKED_RESULTS_MESSAGE: &str = "לא הצלחתי לדרג קטעים רלוונטיים.";

/// `search_query` drives retrieval and re-ranking and may carry earlier turns
/// of the conversation; `question` (defaulting to `search_query`) is all the
/// generator sees.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub search_query: String,
    pub question: Option<String>,
    pub measure_time: bool,
}

impl QueryRequest {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self { search_query: search_query.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    #[must_use]
    pub fn measure_time(mut self, on: bool) -> Self {
        self.measure_time = on;
        self
    }

    pub fn question(&self) -> &str {
        self.question.as_deref().unwrap_or(&self.search_query)
    }
}

/// How a request ended. Only `Answered` reached the generator; the others are
/// legitimate "nothing to say" results, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    EmptyQuery,
    NoCandidates,
    NoRankedResults,
    Answered(String),
}

impl Outcome {
    /// Text to show the user.
    pub fn message(&self) -> &str {
        match self {
            Self::EmptyQuery => EMPTY_QUERY_MESSAGE,
            Self::NoCandidates => NO_CANDIDATES_MESSAGE,
            Self::NoRankedResults => NO_RANKED_RESULTS_MESSAGE,
            Self::Answered(text) => text.as_str(),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub outcome: Outcome,
    /// Passages handed to the generator; empty unless `outcome` is `Answered`.
    pub chunks: Vec<RankedResult>,
    /// Present when the request asked for timing.
    pub timings: Option<StageTimings>,
}

impl Answer {
    fn terminal(outcome: Outcome, timings: Option<StageTimings>) -> Self {
        Self { outcome, chunks: Vec::new(), timings }
    }
}

pub struct QueryEngine {
    retriever: CandidateRetriever,
    reranker: Reranker,
    top_k: usize,
    top_n: usize,
}

impl QueryEngine {
    pub fn new(cache: Arc<ModelCache>, store: Arc<dyn ChunkStore>, settings: &RetrievalSettings) -> Self {
        let retriever = CandidateRetriever::new(Arc::clone(&cache), store, settings.embedding_model.clone());
        let reranker = Reranker::new(cache, settings.rerank_model.clone()).with_batch_size(settings.rerank_batch_size);
        Self { retriever, reranker, top_k: settings.top_k, top_n: settings.top_n }
    }

    pub fn retriever(&self) -> &CandidateRetriever {
        &self.retriever
    }

    pub fn reranker(&self) -> &Reranker {
        &self.reranker
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Run the full pipeline for one request.
    ///
    /// Retrieval and re-ranking errors propagate unchanged; a generator error
    /// comes back as [`Error::Generator`]. Nothing is retried.
    pub fn answer<G>(&self, request: &QueryRequest, generator: &G) -> Result<Answer>
    where
        G: Generator + ?Sized,
    {
        let mut timings = request.measure_time.then(StageTimings::default);

        let search_query = request.search_query.as_str();
        if search_query.trim().is_empty() {
            return Ok(Answer::terminal(Outcome::EmptyQuery, timings));
        }

        info!("Retrieving candidates");
        let start = Instant::now();
        let candidates = self.retriever.retrieve_candidates(search_query, self.top_k)?;
        if let Some(t) = timings.as_mut() {
            t.retrieve = Some(start.elapsed());
            t.num_candidates = Some(candidates.len());
        }
        if candidates.is_empty() {
            return Ok(Answer::terminal(Outcome::NoCandidates, timings));
        }

        info!(n = candidates.len(), "Re-ranking candidates");
        let start = Instant::now();
        let top_chunks = self.reranker.rerank(search_query, candidates, self.top_n)?;
        if let Some(t) = timings.as_mut() {
            t.rerank = Some(start.elapsed());
            t.num_final_chunks = Some(top_chunks.len());
        }
        if top_chunks.is_empty() {
            return Ok(Answer::terminal(Outcome::NoRankedResults, timings));
        }

        info!(n = top_chunks.len(), "Calling generator with top chunks");
        let start = Instant::now();
        let text = generator.generate(request.question(), &top_chunks).map_err(Error::Generator)?;
        if let Some(t) = timings.as_mut() {
            t.generate = Some(start.elapsed());
        }

        Ok(Answer { outcome: Outcome::Answered(text), chunks: top_chunks, timings })
    }
}
