use thiserror::Error;

/// Errors surfaced to API callers. Upstream failures (language model,
/// database) never show up here, they are absorbed by fallbacks.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Property not found")]
    PropertyNotFound(i64),

    #[error("One or more properties not found")]
    PropertiesNotFound,

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("{0}")]
    InvalidRequest(String),
}
