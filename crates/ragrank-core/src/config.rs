//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K=20`). Typed
//! sections are pulled out with [`Config::get`]; every section has defaults so
//! a missing file is not an error.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/paraphrase-multilingual-mpnet-base-v2";
pub const DEFAULT_RERANK_MODEL: &str = "fast";
pub const DEFAULT_TOP_K: usize = 50;
pub const DEFAULT_TOP_N: usize = 8;
pub const DEFAULT_RERANK_BATCH_SIZE: usize = 32;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    /// Wrap an already-assembled figment (tests, embedding hosts).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// All sections at once, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub store: StoreSettings,
    pub models: ModelSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        if r.top_n == 0 {
            return Err(Error::InvalidConfig("retrieval.top_n must be positive".into()));
        }
        if r.rerank_batch_size == 0 {
            return Err(Error::InvalidConfig("retrieval.rerank_batch_size must be positive".into()));
        }
        if r.embedding_model.trim().is_empty() || r.rerank_model.trim().is_empty() {
            return Err(Error::InvalidConfig("model names must not be empty".into()));
        }
        if self.store.dim == 0 {
            return Err(Error::InvalidConfig("store.dim must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub embedding_model: String,
    /// Alias (`fast`, `balanced`, `best`, `latest`) or full model id.
    pub rerank_model: String,
    pub top_k: usize,
    pub top_n: usize,
    pub rerank_batch_size: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            rerank_model: DEFAULT_RERANK_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            top_n: DEFAULT_TOP_N,
            rerank_batch_size: DEFAULT_RERANK_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
    pub table: String,
    pub dim: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "data/lancedb".to_string(),
            table: "knowledge_chunks".to_string(),
            dim: 768,
        }
    }
}

impl StoreSettings {
    pub fn resolved_uri(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.uri)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Root directory with one sub-directory per model id.
    pub dir: String,
    pub use_fake: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self { dir: "models".to_string(), use_fake: false }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
