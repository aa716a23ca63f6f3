use figment::providers::{Format, Serialized, Toml};
use figment::Figment;

use ragrank_core::config::{Config, RetrievalSettings, Settings};
use ragrank_core::types::{Candidate, Chunk, RankedResult};
use ragrank_core::Error;

fn config_from(toml: &str) -> Config {
    let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml));
    Config::from_figment(figment)
}

#[test]
fn toml_overrides_keep_unset_defaults() {
    let config = config_from(
        r#"
        [retrieval]
        rerank_model = "balanced"
        top_n = 5

        [store]
        table = "chunks_test"
        "#,
    );
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.rerank_model, "balanced");
    assert_eq!(settings.retrieval.top_n, 5);
    assert_eq!(settings.retrieval.top_k, 50, "unset keys fall back to defaults");
    assert_eq!(settings.store.table, "chunks_test");
}

#[test]
fn section_extraction_by_key() {
    let config = config_from("[retrieval]\ntop_k = 12\n");
    let retrieval: RetrievalSettings = config.get("retrieval").expect("retrieval section");
    assert_eq!(retrieval.top_k, 12);
}

#[test]
fn invalid_values_surface_as_invalid_config() {
    let config = config_from("[retrieval]\nrerank_batch_size = 0\n");
    assert!(matches!(config.settings(), Err(Error::InvalidConfig(_))));
}

#[test]
fn candidate_keeps_chunk_fields_and_drops_embedding() {
    let mut chunk = Chunk {
        id: "c1".into(),
        text: "תודעה אקטיבית".into(),
        embedding: Some(vec![0.1, 0.2]),
        source: "lesson-01.md".into(),
        order: 3,
        metadata: Default::default(),
    };
    chunk.metadata.insert("topic".into(), serde_json::json!("awareness"));

    let candidate = Candidate::from_chunk(chunk, 0.25);
    assert_eq!(candidate.id, "c1");
    assert_eq!(candidate.order, 3);
    assert_eq!(candidate.metadata["topic"], "awareness");
    assert!(candidate.has_text());

    let ranked = RankedResult { candidate, rerank_score: 4.5 };
    let json = serde_json::to_value(&ranked).expect("serialize");
    assert_eq!(json["id"], "c1", "candidate fields are flattened");
    assert_eq!(json["rerank_score"], 4.5);
}

#[test]
fn whitespace_text_is_not_scoreable() {
    let candidate = Candidate {
        id: "c".into(),
        text: "  \n ".into(),
        source: "s".into(),
        order: 0,
        metadata: Default::default(),
        distance: 0.0,
    };
    assert!(!candidate.has_text());
}
