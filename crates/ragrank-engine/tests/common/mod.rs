#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ragrank_core::traits::{ChunkStore, CrossEncoder, Embedder, ModelLoader};
use ragrank_core::types::{Candidate, Metadata};

pub fn candidate(id: &str, text: &str, distance: f32) -> Candidate {
    Candidate {
        id: id.to_string(),
        text: text.to_string(),
        source: format!("{id}.md"),
        order: 0,
        metadata: Metadata::new(),
        distance,
    }
}

/// Points every text along the first axis and records each batch size.
pub struct StubEmbedder {
    dim: usize,
    batches: Arc<Mutex<Vec<usize>>>,
}

impl Embedder for StubEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|_| { let mut v = vec![0.0; self.dim]; v[0] = 1.0; v }).collect())
    }
}

/// Scores passages from a fixed table (unknown text scores 0.0) and records
/// every batch it sees.
#[derive(Clone, Default)]
pub struct ScriptedCrossEncoder {
    pub scores: HashMap<String, f32>,
    pub batches: Arc<Mutex<Vec<usize>>>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub drop_last_score: bool,
}

impl ScriptedCrossEncoder {
    pub fn with_scores(scores: &[(&str, f32)]) -> Self {
        Self { scores: scores.iter().map(|(t, s)| (t.to_string(), *s)).collect(), ..Default::default() }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn seen_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl CrossEncoder for ScriptedCrossEncoder {
    fn score_pairs(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        self.batches.lock().unwrap().push(pairs.len());
        let mut queries = self.queries.lock().unwrap();
        let mut out: Vec<f32> = pairs
            .iter()
            .map(|(q, p)| { queries.push(q.clone()); self.scores.get(p).copied().unwrap_or(0.0) })
            .collect();
        if self.drop_last_score { out.pop(); }
        Ok(out)
    }
}

/// Counts loads; every load returns a fresh instance. Names listed in `broken`
/// fail to load.
#[derive(Clone, Default)]
pub struct CountingLoader {
    pub embed_loads: Arc<AtomicUsize>,
    pub embed_batches: Arc<Mutex<Vec<usize>>>,
    pub rerank_loads: Arc<AtomicUsize>,
    pub loaded_rerankers: Arc<Mutex<Vec<String>>>,
    pub cross_encoder: ScriptedCrossEncoder,
    pub broken: Vec<String>,
}

impl CountingLoader {
    pub fn with_cross_encoder(cross_encoder: ScriptedCrossEncoder) -> Self {
        Self { cross_encoder, ..Default::default() }
    }

    pub fn embed_loads(&self) -> usize { self.embed_loads.load(Ordering::SeqCst) }
    pub fn embed_batch_sizes(&self) -> Vec<usize> { self.embed_batches.lock().unwrap().clone() }
    pub fn rerank_loads(&self) -> usize { self.rerank_loads.load(Ordering::SeqCst) }
    pub fn loaded_rerankers(&self) -> Vec<String> { self.loaded_rerankers.lock().unwrap().clone() }
}

impl ModelLoader for CountingLoader {
    fn load_embedder(&self, name: &str) -> anyhow::Result<Arc<dyn Embedder>> {
        if self.broken.iter().any(|b| b == name) { anyhow::bail!("no such model: {name}"); }
        self.embed_loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubEmbedder { dim: 4, batches: Arc::clone(&self.embed_batches) }))
    }

    fn load_cross_encoder(&self, name: &str) -> anyhow::Result<Arc<dyn CrossEncoder>> {
        if self.broken.iter().any(|b| b == name) { anyhow::bail!("no such model: {name}"); }
        self.rerank_loads.fetch_add(1, Ordering::SeqCst);
        self.loaded_rerankers.lock().unwrap().push(name.to_string());
        Ok(Arc::new(self.cross_encoder.clone()))
    }
}

/// Returns its rows nearest first, honouring the limit, and counts calls.
#[derive(Default)]
pub struct StaticStore {
    pub rows: Vec<Candidate>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl StaticStore {
    pub fn new(rows: Vec<Candidate>) -> Self { Self { rows, ..Default::default() } }
    pub fn failing() -> Self { Self { fail: true, ..Default::default() } }
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl ChunkStore for StaticStore {
    fn nearest(&self, _query_vec: &[f32], limit: usize) -> anyhow::Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail { anyhow::bail!("connection refused"); }
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        rows.truncate(limit);
        Ok(rows)
    }
}
