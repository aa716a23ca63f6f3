//! Domain types shared by the store, retriever and re-ranker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ChunkId = String;

/// Auxiliary chunk fields (topic, key concepts, chunk type, ...).
/// Opaque to retrieval; carried through to the caller unchanged.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A stored passage of a source document.
///
/// - `id`: unique chunk identifier
/// - `text`: passage content (Hebrew-dominant UTF-8)
/// - `embedding`: fixed-dimension vector; chunks without one are never retrieved
/// - `source`: origin document/file name
/// - `order`: position within the source document, for citations
/// - `metadata`: open key/value bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub source: String,
    pub order: u32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A chunk returned by nearest-neighbour search. Lower `distance` is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ChunkId,
    pub text: String,
    pub source: String,
    pub order: u32,
    #[serde(default)]
    pub metadata: Metadata,
    pub distance: f32,
}

impl Candidate {
    pub fn from_chunk(chunk: Chunk, distance: f32) -> Self {
        Self {
            id: chunk.id,
            text: chunk.text,
            source: chunk.source,
            order: chunk.order,
            metadata: chunk.metadata,
            distance,
        }
    }

    /// Whether the candidate carries text worth scoring.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A candidate scored by the cross-encoder. Higher `rerank_score` is more
/// relevant; the scale is whatever the model emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub rerank_score: f32,
}

impl RankedResult {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn text(&self) -> &str {
        &self.candidate.text
    }

    pub fn source(&self) -> &str {
        &self.candidate.source
    }

    pub fn order(&self) -> u32 {
        self.candidate.order
    }

    pub fn distance(&self) -> f32 {
        self.candidate.distance
    }
}
