//! Specifications: immutable, storage-agnostic query descriptions
//!
//! A [`Specification`] answers four questions about a read:
//!
//! - **criteria**: which entities match (absent means all of them)
//! - **includes**: which relations must be populated on every result
//! - **ordering**: one sort key, ascending or descending
//! - **paging**: an optional skip/take window applied last
//!
//! Specifications are assembled with a [`SpecificationBuilder`] and never change
//! afterwards. Two specifications with equal fields always evaluate to the same
//! query.
//!
//! # Example
//!
//! ```rust
//! use spec_repository::{FilterCondition, Specification};
//!
//! #[derive(Clone)]
//! struct Product;
//!
//! let spec = Specification::<Product>::with_criteria(FilterCondition::eq("product_brand_id", 2_i32))
//!     .add_include("product_type")
//!     .add_include("product_brand")
//!     .add_order_by("price_cents")
//!     .apply_paging(10, 5)?
//!     .build();
//!
//! assert!(spec.criteria().is_some());
//! assert_eq!(spec.includes().len(), 2);
//! assert_eq!(spec.order_by().map(|k| k.field()), Some("price_cents"));
//! assert!(spec.is_paging_enabled());
//! assert_eq!((spec.skip(), spec.take()), (10, 5));
//! # Ok::<(), spec_repository::SpecificationError>(())
//! ```

mod criteria;
mod filter;

use std::fmt;
use std::marker::PhantomData;

pub use criteria::{Criteria, Include, SortKey};
pub use filter::{
    escape_like, FilterCondition, FilterOperator, FilterValue, OrderDirection, Pagination,
};

use crate::entity::Entity;
use crate::error::SpecificationError;

/// Immutable description of a read against entities of type `T`
///
/// The type parameter only ties the specification to an entity type, so a
/// `Specification<Product>` cannot be handed to a brand repository. It is
/// `Send + Sync` regardless of `T`.
pub struct Specification<T> {
    criteria: Option<Criteria>,
    includes: Vec<Include>,
    order: Option<(SortKey, OrderDirection)>,
    paging: Option<Pagination>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Specification<T> {
    /// Start building a specification that matches every entity
    pub fn builder() -> SpecificationBuilder<T> {
        SpecificationBuilder {
            spec: Self::empty(),
        }
    }

    /// Start building a specification filtered by `criteria`
    pub fn with_criteria(criteria: impl Into<Criteria>) -> SpecificationBuilder<T> {
        Self::builder().criteria(criteria)
    }

    /// The match-all specification: no criteria, includes, ordering or paging
    pub fn all() -> Self {
        Self::empty()
    }

    fn empty() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
            order: None,
            paging: None,
            _entity: PhantomData,
        }
    }

    /// Filter predicate, if any
    pub fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    /// Relations to eager-load, in the order they were added
    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    /// Ascending sort key, if the active ordering is ascending
    pub fn order_by(&self) -> Option<&SortKey> {
        match &self.order {
            Some((key, OrderDirection::Ascending)) => Some(key),
            _ => None,
        }
    }

    /// Descending sort key, if the active ordering is descending
    pub fn order_by_descending(&self) -> Option<&SortKey> {
        match &self.order {
            Some((key, OrderDirection::Descending)) => Some(key),
            _ => None,
        }
    }

    /// Active sort key and direction
    pub fn ordering(&self) -> Option<(&SortKey, OrderDirection)> {
        self.order.as_ref().map(|(key, direction)| (key, *direction))
    }

    /// Whether a paging window applies
    pub fn is_paging_enabled(&self) -> bool {
        self.paging.is_some()
    }

    /// Number of results skipped; 0 when paging is disabled
    pub fn skip(&self) -> u64 {
        self.paging.map_or(0, |p| p.offset)
    }

    /// Maximum number of results; 0 when paging is disabled
    pub fn take(&self) -> u64 {
        self.paging.map_or(0, |p| p.limit)
    }

    /// The paging window, if enabled
    pub fn paging(&self) -> Option<Pagination> {
        self.paging
    }

    /// Copy keeping only the criteria, for counting the full filtered set
    pub fn for_count(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            ..Self::empty()
        }
    }
}

impl<T: Entity> Specification<T> {
    /// Start building a specification matching the entity with identity `id`
    pub fn by_id(id: T::Id) -> SpecificationBuilder<T> {
        Self::with_criteria(FilterCondition::eq(T::ID_FIELD, id))
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            includes: self.includes.clone(),
            order: self.order.clone(),
            paging: self.paging,
            _entity: PhantomData,
        }
    }
}

impl<T> PartialEq for Specification<T> {
    fn eq(&self, other: &Self) -> bool {
        self.criteria == other.criteria
            && self.includes == other.includes
            && self.order == other.order
            && self.paging == other.paging
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("entity", &std::any::type_name::<T>())
            .field("criteria", &self.criteria)
            .field("includes", &self.includes)
            .field("order", &self.order)
            .field("paging", &self.paging)
            .finish()
    }
}

/// Builder for [`Specification`]
///
/// The only place a specification's fields are written.
pub struct SpecificationBuilder<T> {
    spec: Specification<T>,
}

impl<T> SpecificationBuilder<T> {
    /// Set the filter predicate, replacing any previous one
    #[must_use]
    pub fn criteria(mut self, criteria: impl Into<Criteria>) -> Self {
        self.spec.criteria = Some(criteria.into());
        self
    }

    /// Append a relation to eager-load
    ///
    /// Duplicates are kept; loading the same relation twice is harmless.
    #[must_use]
    pub fn add_include(mut self, include: impl Into<Include>) -> Self {
        self.spec.includes.push(include.into());
        self
    }

    /// Sort ascending by `key`, replacing any previous ordering
    #[must_use]
    pub fn add_order_by(mut self, key: impl Into<SortKey>) -> Self {
        self.spec.order = Some((key.into(), OrderDirection::Ascending));
        self
    }

    /// Sort descending by `key`, replacing any previous ordering
    #[must_use]
    pub fn add_order_by_descending(mut self, key: impl Into<SortKey>) -> Self {
        self.spec.order = Some((key.into(), OrderDirection::Descending));
        self
    }

    /// Enable paging: skip `skip` results, then take at most `take`
    ///
    /// # Errors
    ///
    /// [`SpecificationError`] when either argument is negative.
    pub fn apply_paging(mut self, skip: i64, take: i64) -> Result<Self, SpecificationError> {
        let offset = u64::try_from(skip).map_err(|_| SpecificationError::NegativeSkip(skip))?;
        let limit = u64::try_from(take).map_err(|_| SpecificationError::NegativeTake(take))?;
        self.spec.paging = Some(Pagination::new(offset, limit));
        Ok(self)
    }

    /// Enable paging with an already-validated window
    #[must_use]
    pub fn apply_pagination(mut self, pagination: Pagination) -> Self {
        self.spec.paging = Some(pagination);
        self
    }

    /// Finish building
    pub fn build(self) -> Specification<T> {
        self.spec
    }
}

impl<T> fmt::Debug for SpecificationBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificationBuilder")
            .field("spec", &self.spec)
            .finish()
    }
}

impl<T> From<SpecificationBuilder<T>> for Specification<T> {
    fn from(builder: SpecificationBuilder<T>) -> Self {
        builder.build()
    }
}
