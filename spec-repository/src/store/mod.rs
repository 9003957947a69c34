//! Store contract consumed by the repository
//!
//! A store hands out a fresh [`Queryable`] per call. A queryable supports the
//! five primitives the [`SpecificationEvaluator`](crate::SpecificationEvaluator)
//! needs (filter, include, order, skip, take) and asynchronous materialization.
//! Any backend offering these can sit behind a
//! [`StoreRepository`](crate::StoreRepository) unchanged.
//!
//! Backends:
//!
//! - [`MemoryStore`]: in-process collection
//! - `PgStore`: PostgreSQL through sqlx (`database` feature)

use std::future::Future;

use crate::repository::RepositoryResult;
use crate::specification::{Criteria, Include, OrderDirection, SortKey};

mod memory;
mod plan;

#[cfg(feature = "database")]
mod postgres;

pub use memory::{MemoryQuery, MemoryStore, RelationResolver};
pub use plan::{QueryPlan, QueryStep};

#[cfg(feature = "database")]
pub use postgres::{PgEntity, PgQuery, PgStore, SqlSelect};

/// Unexecuted, composable query over entities of type `T`
///
/// Building methods never fail. Problems with the shape of the query, such as
/// an unknown field, surface as a [`RepositoryError`](crate::RepositoryError)
/// when the query is materialized.
///
/// Calls compose in the order they are made: `skip(2).take(3)` is rows 3–5,
/// a second `filter` narrows further and a second `order_by` replaces the
/// first.
pub trait Queryable<T>: Sized + Send {
    /// Keep only entities matching `criteria`
    fn filter(self, criteria: &Criteria) -> Self;

    /// Ensure the relation is populated on every returned entity
    fn include(self, include: &Include) -> Self;

    /// Sort by `key`
    fn order_by(self, key: &SortKey, direction: OrderDirection) -> Self;

    /// Drop the first `count` entities
    fn skip(self, count: u64) -> Self;

    /// Keep at most `count` entities
    fn take(self, count: u64) -> Self;

    /// Execute and collect every result
    fn to_list(self) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send;

    /// Execute and return the first result, if any
    fn first(self) -> impl Future<Output = RepositoryResult<Option<T>>> + Send;

    /// Execute and count the results
    fn count(self) -> impl Future<Output = RepositoryResult<u64>> + Send;
}

/// Source of queryable collections for entities of type `T`
///
/// The store owns the entities; repositories only borrow query handles.
pub trait Store<T>: Send + Sync {
    /// Query type produced by this store
    type Query: Queryable<T>;

    /// A query over the whole collection
    fn query(&self) -> Self::Query;
}
