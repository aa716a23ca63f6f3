use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Loading a model by name failed; the cache keeps whatever it held before.
    #[error("Failed to load model '{name}': {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The vector store could not be reached or returned an unusable response.
    #[error("Retrieval backend error: {0}")]
    Backend(#[source] anyhow::Error),

    #[error("Model inference failed: {0}")]
    Inference(#[source] anyhow::Error),

    #[error("Generator failed: {0}")]
    Generator(#[source] anyhow::Error),
}

impl Error {
    pub fn model_load(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ModelLoad { name: name.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
