//! LanceDB-backed chunk store.
//!
//! Wraps the async LanceDB client behind the blocking [`ChunkStore`] seam. The
//! store owns a tokio runtime and blocks on it, so it must not be called from
//! inside another runtime's async context.

use anyhow::{ensure, Result};
use lancedb::Connection;
use tokio::runtime::Runtime;
use tracing::info;

use ragrank_core::traits::ChunkStore;
use ragrank_core::types::{Candidate, Chunk};

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub struct LanceChunkStore {
    // Declared before `rt` so the connection drops while the runtime is alive.
    db: Connection,
    table_name: String,
    dim: usize,
    rt: Runtime,
}

impl LanceChunkStore {
    pub fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
        ensure!(dim > 0, "embedding dimension must be positive");
        let rt = Runtime::new()?;
        let db = rt.block_on(table::open_db(uri))?;
        info!(uri, table = table_name, dim, "opened chunk store");
        Ok(Self { db, table_name: table_name.to_string(), dim, rt })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Persist chunks (embedding optional). Returns the number written.
    pub fn add_chunks(&self, chunks: &[Chunk]) -> Result<usize> {
        self.rt.block_on(writer::write_chunks(&self.db, &self.table_name, self.dim, chunks))
    }

    /// Row count, including rows without an embedding.
    pub fn count(&self) -> Result<usize> {
        self.rt.block_on(async {
            match table::open_if_exists(&self.db, &self.table_name).await? {
                Some(t) => Ok(t.count_rows(None).await?),
                None => Ok(0),
            }
        })
    }
}

impl ChunkStore for LanceChunkStore {
    fn nearest(&self, query_vec: &[f32], limit: usize) -> Result<Vec<Candidate>> {
        ensure!(
            query_vec.len() == self.dim,
            "query vector has dim {} but the store holds dim {}",
            query_vec.len(),
            self.dim
        );
        self.rt.block_on(search::nearest_chunks(&self.db, &self.table_name, query_vec, limit))
    }
}
