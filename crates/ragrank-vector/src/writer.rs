use anyhow::{anyhow, ensure, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;
use tracing::info;

use ragrank_core::types::Chunk;

use crate::schema::build_chunk_schema;
use crate::table::table_exists;

const WRITE_BATCH: usize = 1000;

/// Append chunks to `table_name`, creating the table on first write.
pub async fn write_chunks(db: &Connection, table_name: &str, dim: usize, chunks: &[Chunk]) -> Result<usize> {
    if chunks.is_empty() {
        return Ok(0);
    }
    for chunk in chunks {
        if let Some(v) = &chunk.embedding {
            ensure!(v.len() == dim, "chunk {} has embedding dim {} (table dim {})", chunk.id, v.len(), dim);
        }
    }
    info!(n = chunks.len(), table = table_name, "writing chunks");
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
            .map_err(|e| anyhow!("progress template: {}", e))?
            .progress_chars("#>-"),
    );
    for batch in chunks.chunks(WRITE_BATCH) {
        insert_batch(db, table_name, dim, batch).await?;
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    Ok(chunks.len())
}

async fn insert_batch(db: &Connection, table_name: &str, dim: usize, chunks: &[Chunk]) -> Result<()> {
    let record_batch = chunks_to_record_batch(chunks, dim)?;
    let schema = record_batch.schema();
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
    if table_exists(db, table_name).await? {
        db.open_table(table_name).execute().await?.add(reader).execute().await?;
    } else {
        db.create_table(table_name, reader).execute().await?;
    }
    Ok(())
}

pub fn chunks_to_record_batch(chunks: &[Chunk], dim: usize) -> Result<RecordBatch> {
    let schema = build_chunk_schema(dim);
    let mut ids = Vec::with_capacity(chunks.len());
    let mut texts = Vec::with_capacity(chunks.len());
    let mut sources = Vec::with_capacity(chunks.len());
    let mut orders = Vec::with_capacity(chunks.len());
    let mut metadata = Vec::with_capacity(chunks.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
    for c in chunks {
        ids.push(c.id.clone());
        texts.push(c.text.clone());
        sources.push(Some(c.source.clone()));
        orders.push(Some(c.order));
        metadata.push(if c.metadata.is_empty() { None } else { Some(serde_json::to_string(&c.metadata)?) });
        vectors.push(c.embedding.as_ref().map(|v| v.iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(orders)),
            Arc::new(StringArray::from(metadata)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                vectors.into_iter(),
                dim as i32,
            )),
        ],
    )?;
    Ok(record_batch)
}
