use thiserror::Error;

/// Errors surfaced by the intake flow and its collaborators.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Unknown question key: {0}")]
    UnknownQuestion(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
