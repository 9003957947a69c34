//! Generic read repository
//!
//! - [`GenericRepository`]: read contract parameterized by entity type
//! - [`StoreRepository`]: implementation over any [`Store`](crate::Store),
//!   delegating query construction to the
//!   [`SpecificationEvaluator`](crate::SpecificationEvaluator)
//! - [`RepositoryError`]: structured data-access failure
//!
//! # Example
//!
//! ```rust,ignore
//! use spec_repository::prelude::*;
//!
//! let products = StoreRepository::new(PgStore::<Product>::new(pool));
//!
//! let spec = Specification::<Product>::builder()
//!     .add_include("product_type")
//!     .add_include("product_brand")
//!     .add_order_by("name")
//!     .build();
//!
//! let listed = products.list(&spec).await?;
//! ```

mod error;
mod store_repository;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use store_repository::StoreRepository;
pub use traits::{GenericRepository, RepositoryResult};
