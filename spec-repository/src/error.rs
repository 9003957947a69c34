//! Crate-level error types

use thiserror::Error;

use crate::repository::RepositoryError;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid argument supplied while constructing a [`Specification`](crate::Specification)
///
/// Raised eagerly by the builder, never deferred to query execution.
///
/// # Example
///
/// ```rust
/// use spec_repository::{Specification, SpecificationError};
///
/// #[derive(Clone)]
/// struct Row;
///
/// let err = Specification::<Row>::builder().apply_paging(-1, 10).unwrap_err();
/// assert_eq!(err, SpecificationError::NegativeSkip(-1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpecificationError {
    /// Paging window with a negative skip
    #[error("Invalid argument: skip must be non-negative, got {0}")]
    NegativeSkip(i64),

    /// Paging window with a negative take
    #[error("Invalid argument: take must be non-negative, got {0}")]
    NegativeTake(i64),
}

/// Main error type for the crate
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Specification could not be constructed
    #[error(transparent)]
    Specification(#[from] SpecificationError),

    /// Store failed to execute a query
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
