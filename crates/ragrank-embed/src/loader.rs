use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use ragrank_core::config::ModelSettings;
use ragrank_core::traits::{CrossEncoder, Embedder, ModelLoader};

use crate::cross_encoder::CandleCrossEncoder;
use crate::device::select_device;
use crate::embedder::TransformerEmbedder;
use crate::fake::{HashingEmbedder, LexicalCrossEncoder};

/// Loads models from a local directory tree, or hands out the deterministic
/// stand-ins when `use_fake` is set.
pub struct LocalModelLoader {
    root: PathBuf,
    use_fake: bool,
    fake_dim: usize,
}

impl LocalModelLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), use_fake: false, fake_dim: 768 }
    }

    pub fn fake(dim: usize) -> Self {
        Self { root: PathBuf::new(), use_fake: true, fake_dim: dim }
    }

    /// `APP_USE_FAKE_MODELS=1` forces the stand-ins regardless of settings.
    pub fn from_settings(settings: &ModelSettings, base: &Path, dim: usize) -> Self {
        let root = ragrank_core::config::resolve_with_base(base, &settings.dir);
        let env_fake = std::env::var("APP_USE_FAKE_MODELS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self { root, use_fake: settings.use_fake || env_fake, fake_dim: dim }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uses_fake(&self) -> bool {
        self.use_fake
    }
}

impl ModelLoader for LocalModelLoader {
    fn load_embedder(&self, name: &str) -> Result<Arc<dyn Embedder>> {
        if self.use_fake {
            info!(model = name, dim = self.fake_dim, "using hashing embedder");
            return Ok(Arc::new(HashingEmbedder::new(self.fake_dim)));
        }
        Ok(Arc::new(TransformerEmbedder::load(&self.root, name, select_device())?))
    }

    fn load_cross_encoder(&self, name: &str) -> Result<Arc<dyn CrossEncoder>> {
        if self.use_fake {
            info!(model = name, "using lexical cross-encoder");
            return Ok(Arc::new(LexicalCrossEncoder));
        }
        Ok(Arc::new(CandleCrossEncoder::load(&self.root, name, select_device())?))
    }
}
