use super::settings::{Settings, VectorBackend};
use crate::core::errors::ApiError;

pub fn validate_settings(settings: &Settings) -> Result<(), ApiError> {
    validate_range("vector_index.top_k", settings.vector_index.top_k, 1, 1_000)?;
    validate_range(
        "pipeline.child_fetch_concurrency",
        settings.pipeline.child_fetch_concurrency,
        1,
        64,
    )?;
    validate_range(
        "llm.timeout_secs",
        settings.llm.timeout_secs as usize,
        1,
        3_600,
    )?;

    if settings.vector_index.backend == VectorBackend::Pinecone
        && settings.vector_index.pinecone.host.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "vector_index.pinecone.host is required for the pinecone backend".to_string(),
        ));
    }

    Ok(())
}

fn validate_range(field: &str, value: usize, min: usize, max: usize) -> Result<(), ApiError> {
    if value < min || value > max {
        return Err(ApiError::BadRequest(format!(
            "{} must be between {} and {} (got {})",
            field, min, max, value
        )));
    }
    Ok(())
}
