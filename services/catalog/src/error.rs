//! Catalog error types

use spec_repository::RepositoryError;
use thiserror::Error;

/// Result type alias using the catalog error
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised by the catalog service and its seed loader
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Seed JSON did not parse
    #[error("Invalid {kind} seed data: {source}")]
    SeedParse {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Two seed records share an identity
    #[error("Duplicate {kind} id {id} in seed data")]
    DuplicateId { kind: &'static str, id: i32 },

    /// A seed product points at a brand or type that does not exist
    #[error("Product {product} references unknown {relation} {id}")]
    DanglingReference {
        product: i32,
        relation: &'static str,
        id: i32,
    },

    /// A repository call failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Configuration, tracing or connection setup failed
    #[error(transparent)]
    Setup(#[from] spec_repository::Error),

    /// Output could not be serialized
    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}
