use ragrank_core::traits::ChunkStore;
use ragrank_core::types::{Chunk, Metadata};
use ragrank_vector::LanceChunkStore;

fn chunk(id: &str, text: &str, embedding: Option<Vec<f32>>, order: u32) -> Chunk {
    let mut metadata = Metadata::new();
    metadata.insert("chunk_type".into(), serde_json::json!("transcript"));
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding,
        source: "course-week-1.md".to_string(),
        order,
        metadata,
    }
}

fn seeded_store(dir: &std::path::Path) -> LanceChunkStore {
    let store = LanceChunkStore::open(&dir.to_string_lossy(), "knowledge_chunks", 3).expect("open");
    assert_eq!((store.table_name(), store.dim()), ("knowledge_chunks", 3));
    let chunks = vec![
        chunk("far", "רחוק", Some(vec![0.0, 1.0, 0.0]), 2),
        chunk("near", "קרוב", Some(vec![1.0, 0.0, 0.0]), 0),
        chunk("unembedded", "ללא וקטור", None, 3),
        chunk("mid", "באמצע", Some(vec![1.0, 1.0, 0.0]), 1),
    ];
    assert_eq!(store.add_chunks(&chunks).expect("add"), 4);
    store
}

#[test]
fn nearest_orders_by_distance_and_respects_limit() {
    let tmp = tempfile::tempdir().expect("tmp");
    let store = seeded_store(tmp.path());

    let hits = store.nearest(&[1.0, 0.0, 0.0], 2).expect("search");
    let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["near", "mid"]);
    assert!(hits[0].distance <= hits[1].distance);
    assert_eq!(hits[0].source, "course-week-1.md");
    assert_eq!(hits[0].metadata["chunk_type"], "transcript");
}

#[test]
fn rows_without_embedding_are_never_returned() {
    let tmp = tempfile::tempdir().expect("tmp");
    let store = seeded_store(tmp.path());
    assert_eq!(store.count().expect("count"), 4);

    let hits = store.nearest(&[1.0, 0.0, 0.0], 10).expect("search");
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|c| c.id != "unembedded"));
}

#[test]
fn missing_table_yields_no_candidates() {
    let tmp = tempfile::tempdir().expect("tmp");
    let store = LanceChunkStore::open(&tmp.path().to_string_lossy(), "empty", 3).expect("open");
    assert_eq!(store.count().expect("count"), 0);
    assert!(store.nearest(&[1.0, 0.0, 0.0], 5).expect("search").is_empty());
}

#[test]
fn wrong_query_dimension_is_an_error() {
    let tmp = tempfile::tempdir().expect("tmp");
    let store = seeded_store(tmp.path());
    assert!(store.nearest(&[1.0, 0.0], 5).is_err());
}
