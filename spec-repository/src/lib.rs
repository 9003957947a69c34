//! # spec-repository
//!
//! Declarative, storage-agnostic data access built on the specification pattern.
//!
//! Callers describe *what* they want in a [`Specification`]: an optional filter,
//! relations to eager-load, a single sort key and an optional paging window. A
//! [`GenericRepository`] hands that specification to the [`SpecificationEvaluator`],
//! which folds it onto a store-provided [`Queryable`] in a fixed order, and then
//! materializes the result. Upper layers never see the store's query API.
//!
//! ## Features
//!
//! - **Specifications**: immutable, comparable, `Send + Sync` query descriptions
//! - **Evaluator**: filter → includes → ordering → paging, always in that order
//! - **Generic repository**: `get_by_id`, `list_all`, `get_entity_with_spec`, `list`, `count`
//! - **Stores**: in-memory ([`store::MemoryStore`]) and PostgreSQL (`database` feature)
//! - **Ambient stack**: Figment configuration, JSON tracing, structured errors
//!
//! ## Example
//!
//! ```rust
//! use spec_repository::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Brand {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Entity for Brand {
//!     type Id = i32;
//!     const ENTITY_TYPE: &'static str = "Brand";
//!
//!     fn id(&self) -> &i32 {
//!         &self.id
//!     }
//! }
//!
//! impl Record for Brand {
//!     fn field(&self, name: &str) -> Option<FilterValue> {
//!         match name {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.as_str().into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> spec_repository::Result<()> {
//!     let store = MemoryStore::new(vec![
//!         Brand { id: 1, name: "Angular".into() },
//!         Brand { id: 2, name: "React".into() },
//!     ]);
//!     let repo = StoreRepository::new(store);
//!
//!     let spec = Specification::<Brand>::builder()
//!         .add_order_by_descending("name")
//!         .apply_paging(0, 1)?
//!         .build();
//!
//!     let brands = repo.list(&spec).await?;
//!     assert_eq!(brands[0].name, "React");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod evaluator;
pub mod observability;
pub mod repository;
pub mod specification;
pub mod store;

#[cfg(feature = "database")]
pub mod database;

pub use entity::{Entity, Record};
pub use error::{Error, Result, SpecificationError};
pub use evaluator::SpecificationEvaluator;
pub use repository::{
    GenericRepository, RepositoryError, RepositoryErrorKind, RepositoryOperation,
    RepositoryResult, StoreRepository,
};
pub use specification::{
    Criteria, FilterCondition, FilterOperator, FilterValue, Include, OrderDirection, Pagination,
    SortKey, Specification, SpecificationBuilder,
};
pub use store::{Queryable, Store};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, QueryConfig};
    pub use crate::entity::{Entity, Record};
    pub use crate::error::{Error, Result, SpecificationError};
    pub use crate::evaluator::SpecificationEvaluator;
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        GenericRepository, RepositoryError, RepositoryErrorKind, RepositoryOperation,
        RepositoryResult, StoreRepository,
    };
    pub use crate::specification::{
        Criteria, FilterCondition, FilterOperator, FilterValue, Include, OrderDirection,
        Pagination, SortKey, Specification, SpecificationBuilder,
    };
    pub use crate::store::{MemoryStore, Queryable, Store};

    #[cfg(feature = "database")]
    pub use crate::store::{PgEntity, PgStore};
}
