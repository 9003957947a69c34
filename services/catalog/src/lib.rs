//! # catalog
//!
//! Product catalog reads expressed as named specifications over
//! [`spec_repository`] repositories.
//!
//! The same [`CatalogService`] runs over in-memory stores seeded from JSON
//! ([`memory_catalog`]) or, with the `database` feature, over PostgreSQL
//! (`postgres::pg_catalog`).

pub mod entities;
pub mod error;
pub mod seed;
pub mod service;
pub mod specifications;

#[cfg(feature = "database")]
pub mod postgres;

pub use entities::{Product, ProductBrand, ProductType};
pub use error::{CatalogError, Result};
pub use seed::{memory_catalog, MemoryCatalog, SeedData};
pub use service::{CatalogService, Paged};
pub use specifications::{ProductSort, ProductSpecParams};
