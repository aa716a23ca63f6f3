use std::path::Path;

use ragrank_core::config::ModelSettings;
use ragrank_core::traits::{Embedder, ModelLoader};
use ragrank_embed::LocalModelLoader;

#[test]
fn fake_embedder_shapes_and_determinism() {
    let loader = LocalModelLoader::fake(384);
    let embedder = loader.load_embedder("any-model").expect("embedder");
    let texts = vec!["מה זו תודעה אקטיבית".to_string(), "מה זו תודעה אקטיבית".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows the loader");
    assert_eq!(embedder.dim(), 384);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn real_loader_reports_missing_model_dir() {
    let tmp = tempfile::tempdir().expect("tmp");
    let loader = LocalModelLoader::new(tmp.path());
    assert!(!loader.uses_fake());
    let err = loader.load_cross_encoder("cross-encoder/ms-marco-MiniLM-L-6-v2").err().expect("missing model");
    assert!(err.to_string().contains("does not exist"), "{err}");
}

#[test]
fn loader_resolves_model_dir_against_base() {
    let settings = ModelSettings { dir: "models".into(), use_fake: false };
    let loader = LocalModelLoader::from_settings(&settings, Path::new("/srv/ragrank"), 768);
    assert_eq!(loader.root(), Path::new("/srv/ragrank/models"));

    let settings = ModelSettings { dir: "/opt/models".into(), use_fake: true };
    let loader = LocalModelLoader::from_settings(&settings, Path::new("/srv/ragrank"), 768);
    assert_eq!(loader.root(), Path::new("/opt/models"));
    assert!(loader.uses_fake());
}

/// Needs real weights under `$APP_MODEL_DIR`:
/// `APP_MODEL_DIR=models cargo test -p ragrank-embed -- --ignored`
#[test]
#[ignore]
fn cross_encoder_prefers_relevant_passage() {
    let root = std::env::var("APP_MODEL_DIR").unwrap_or_else(|_| "models".to_string());
    let loader = LocalModelLoader::new(root);
    let ce = loader.load_cross_encoder("cross-encoder/ms-marco-MiniLM-L-6-v2").expect("load");
    let q = "Who won the Ashes cricket series?".to_string();
    let scores = ce
        .score_pairs(&[
            (q.clone(), "England won the Ashes series 4-1 against Australia.".to_string()),
            (q, "The weather in London was cloudy with occasional rain.".to_string()),
        ])
        .expect("score");
    assert!(scores[0] > scores[1], "{scores:?}");
}
