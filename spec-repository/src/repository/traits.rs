//! Repository trait definitions
//!
//! Uses RPITIT (Return Position Impl Trait In Traits), available since Rust
//! 1.75, so implementations write plain `async fn`.

use std::future::Future;

use super::error::RepositoryError;
use crate::entity::Entity;
use crate::specification::Specification;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Read-only repository for entities of type `T`
///
/// Every method returns `Err` only when the store failed. Absence is `Ok(None)`
/// (single lookups) or an empty list.
///
/// Dropping a returned future cancels the in-flight store call.
///
/// # Example
///
/// ```rust,ignore
/// use spec_repository::{GenericRepository, Specification};
///
/// let spec = Specification::<Product>::by_id(7)
///     .add_include("product_brand")
///     .build();
///
/// match repo.get_entity_with_spec(&spec).await? {
///     Some(product) => println!("found {}", product.name),
///     None => println!("no product 7"),
/// }
/// ```
pub trait GenericRepository<T: Entity>: Send + Sync {
    /// Find an entity by identity, without related data
    fn get_by_id(&self, id: &T::Id) -> impl Future<Output = RepositoryResult<Option<T>>> + Send;

    /// Every entity, unfiltered, without related data, in store order
    fn list_all(&self) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// First entity matching `spec`, with its includes loaded
    ///
    /// Without an ordering, "first" is whatever the store yields first.
    fn get_entity_with_spec(
        &self,
        spec: &Specification<T>,
    ) -> impl Future<Output = RepositoryResult<Option<T>>> + Send;

    /// Every entity matching `spec`, with includes, ordering and paging applied
    fn list(
        &self,
        spec: &Specification<T>,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Number of entities matching the criteria of `spec`
    ///
    /// Includes, ordering and paging are ignored, so the result is the total a
    /// paged [`list`](Self::list) draws from.
    fn count(&self, spec: &Specification<T>) -> impl Future<Output = RepositoryResult<u64>> + Send;
}
