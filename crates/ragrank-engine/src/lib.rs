//! Two-stage retrieval for the knowledge base.
//!
//! ```text
//! query -> Embedder -> ChunkStore (top_k by distance)
//!                          |
//!                      Reranker (cross-encoder, top_n)
//!                          |
//!                      Generator -> answer
//! ```
//!
//! Models are shared through [`ModelCache`]; everything else is per request.

pub mod model_cache;
pub mod query;
pub mod rerank;
pub mod retriever;
pub mod timing;

pub use model_cache::{resolve_rerank_alias, ModelCache, RERANK_MODEL_ALIASES};
pub use query::{Answer, Outcome, QueryEngine, QueryRequest};
pub use rerank::Reranker;
pub use retriever::CandidateRetriever;
pub use timing::StageTimings;
