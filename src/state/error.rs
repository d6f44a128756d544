use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize document store: {0}")]
    DocumentStore(#[source] anyhow::Error),

    #[error("Failed to initialize vector index: {0}")]
    VectorIndex(#[source] anyhow::Error),

    #[error("Failed to initialize generative client: {0}")]
    Llm(#[source] anyhow::Error),
}
