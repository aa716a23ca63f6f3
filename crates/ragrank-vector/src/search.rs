use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray, UInt32Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use tracing::{debug, warn};

use ragrank_core::types::{Candidate, Metadata};

use crate::schema::{DISTANCE_COL, ID_COL, METADATA_COL, ORDER_COL, SOURCE_COL, TEXT_COL, VECTOR_COL};
use crate::table::open_if_exists;

/// Cosine nearest-neighbour search over rows with a vector, nearest first.
pub async fn nearest_chunks(db: &Connection, table_name: &str, query_vec: &[f32], limit: usize) -> Result<Vec<Candidate>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let Some(table) = open_if_exists(db, table_name).await? else {
        debug!(table = table_name, "table missing; no candidates");
        return Ok(Vec::new());
    };
    let mut stream = table
        .vector_search(query_vec.to_vec())?
        .column(VECTOR_COL)
        .distance_type(DistanceType::Cosine)
        .only_if(format!("{VECTOR_COL} IS NOT NULL"))
        .limit(limit)
        .execute()
        .await?;

    let mut candidates = Vec::new();
    while let Some(batch) = stream.try_next().await? {
        candidates.extend(batch_to_candidates(&batch)?);
    }
    // The store returns rows nearest first; keep that order even across batches.
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates.truncate(limit);
    Ok(candidates)
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{} column missing", name))
}

pub fn batch_to_candidates(batch: &RecordBatch) -> Result<Vec<Candidate>> {
    let ids = string_col(batch, ID_COL)?;
    let texts = string_col(batch, TEXT_COL)?;
    let sources = string_col(batch, SOURCE_COL)?;
    let metadata = string_col(batch, METADATA_COL)?;
    let orders = batch
        .column_by_name(ORDER_COL)
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| anyhow!("{} column missing", ORDER_COL))?;
    let distances = batch
        .column_by_name(DISTANCE_COL)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| anyhow!("{} column missing", DISTANCE_COL))?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let id = ids.value(i).to_string();
        let source = if sources.is_null(i) { "unknown".to_string() } else { sources.value(i).to_string() };
        let order = if orders.is_null(i) { 0 } else { orders.value(i) };
        let metadata = if metadata.is_null(i) { Metadata::new() } else { parse_metadata(&id, metadata.value(i)) };
        out.push(Candidate {
            id,
            text: if texts.is_null(i) { String::new() } else { texts.value(i).to_string() },
            source,
            order,
            metadata,
            distance: distances.value(i),
        });
    }
    Ok(out)
}

fn parse_metadata(id: &str, raw: &str) -> Metadata {
    if raw.trim().is_empty() {
        return Metadata::new();
    }
    match serde_json::from_str::<Metadata>(raw) {
        Ok(m) => m,
        Err(e) => {
            warn!(chunk = id, error = %e, "unreadable metadata; using empty map");
            Metadata::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_parsing_is_lenient() {
        assert!(parse_metadata("c", "").is_empty());
        assert!(parse_metadata("c", "not json").is_empty());
        let m = parse_metadata("c", r#"{"topic":"awareness","key_concepts":["choice"]}"#);
        assert_eq!(m["topic"], "awareness");
        assert_eq!(m["key_concepts"][0], "choice");
    }
}
