//! Process-wide holder for the expensive models.
//!
//! One slot for the embedding model and one for the cross-encoder, each holding
//! at most one `(name, handle)` pair. A request for a different name replaces the
//! slot; a request for the held name returns the same `Arc`. Each slot's mutex
//! is held across the load, so concurrent reloads serialize and a failed load
//! leaves the previous handle in place.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use ragrank_core::traits::{CrossEncoder, Embedder, ModelLoader};
use ragrank_core::{Error, Result};

/// Short names accepted wherever a re-rank model is configured.
pub const RERANK_MODEL_ALIASES: &[(&str, &str)] = &[
    ("fast", "cross-encoder/ms-marco-MiniLM-L-6-v2"),
    ("balanced", "BAAI/bge-reranker-base"),
    ("best", "BAAI/bge-reranker-large"),
    ("latest", "mixedbread-ai/mxbai-rerank-large-v1"),
];

/// Map an alias to its model id; anything else is already a model id.
pub fn resolve_rerank_alias(name: &str) -> &str {
    RERANK_MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |&(_, model)| model)
}

struct Slot<T: ?Sized> {
    name: String,
    handle: Arc<T>,
}

type SlotCell<T> = Mutex<Option<Slot<T>>>;

pub struct ModelCache {
    loader: Box<dyn ModelLoader>,
    embedding: SlotCell<dyn Embedder>,
    rerank: SlotCell<dyn CrossEncoder>,
}

impl ModelCache {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self { loader: Box::new(loader), embedding: Mutex::new(None), rerank: Mutex::new(None) }
    }

    pub fn get_embedding_model(&self, name: &str) -> Result<Arc<dyn Embedder>> {
        get_or_load(&self.embedding, "embedding", name, |n| self.loader.load_embedder(n))
    }

    /// Accepts an alias from [`RERANK_MODEL_ALIASES`] or a full model id. Two
    /// names resolving to the same id share one cached instance.
    pub fn get_rerank_model(&self, name_or_alias: &str) -> Result<Arc<dyn CrossEncoder>> {
        let name = resolve_rerank_alias(name_or_alias);
        get_or_load(&self.rerank, "rerank", name, |n| self.loader.load_cross_encoder(n))
    }

    /// Drop both handles; the next request loads from scratch.
    pub fn clear(&self) {
        *self.embedding.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self.rerank.lock().unwrap_or_else(PoisonError::into_inner) = None;
        info!("model cache cleared");
    }

    pub fn cached_embedding_model(&self) -> Option<String> {
        cached_name(&self.embedding)
    }

    pub fn cached_rerank_model(&self) -> Option<String> {
        cached_name(&self.rerank)
    }
}

fn cached_name<T: ?Sized>(cell: &SlotCell<T>) -> Option<String> {
    cell.lock().unwrap_or_else(PoisonError::into_inner).as_ref().map(|s| s.name.clone())
}

fn get_or_load<T, F>(cell: &SlotCell<T>, kind: &str, name: &str, load: F) -> Result<Arc<T>>
where
    T: ?Sized,
    F: FnOnce(&str) -> anyhow::Result<Arc<T>>,
{
    // The slot only ever holds fully loaded handles, so a poisoned lock is still usable.
    let mut slot = cell.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cached) = slot.as_ref().filter(|s| s.name == name) {
        debug!(kind, model = name, "using cached model");
        return Ok(Arc::clone(&cached.handle));
    }
    info!(kind, model = name, "loading model (first time or model changed)");
    let handle = load(name).map_err(|e| Error::model_load(name, e))?;
    *slot = Some(Slot { name: name.to_string(), handle: Arc::clone(&handle) });
    Ok(handle)
}
