use thiserror::Error;

/// Errors surfaced by catalog operations.
///
/// Every failure is a value handed back to the caller; nothing here is fatal
/// and nothing is retried automatically. `Clone` lets every caller that joined
/// a shared in-flight fetch observe the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Single-item lookup found nothing under this id
    #[error("No item with id '{0}'")]
    NotFound(String),

    /// Transport or store failure; the message is passed through untouched
    #[error("Remote store error: {0}")]
    RemoteFailure(String),

    /// The store already holds an item with this id
    #[error("An item with id '{0}' already exists")]
    DuplicateId(String),

    /// Caller-supplied input rejected before submission
    #[error("Invalid item: {0}")]
    Validation(String),
}

impl CatalogError {
    /// Wrap any displayable store error as a pass-through remote failure.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        CatalogError::RemoteFailure(err.to_string())
    }
}

/// A specialized `Result` for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
