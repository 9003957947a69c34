//! Specification evaluator
//!
//! Folds a [`Specification`] onto a store's [`Queryable`]. The order is fixed
//! and does not depend on how the specification was built:
//!
//! 1. criteria
//! 2. includes, in the order they were added
//! 3. ordering (ascending or descending, never both)
//! 4. paging: skip, then take
//!
//! Paging after ordering is what makes a page well defined; callers that page
//! without an ordering get whatever order the store produces.

use crate::specification::Specification;
use crate::store::Queryable;

/// Translates specifications into store queries
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificationEvaluator;

impl SpecificationEvaluator {
    /// Apply `spec` to `input` and return the unexecuted query
    ///
    /// Pure: nothing is executed and equal specifications yield equal queries.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spec_repository::prelude::*;
    /// use spec_repository::store::QueryStep;
    ///
    /// #[derive(Debug, Clone)]
    /// struct Note {
    ///     id: i64,
    /// }
    ///
    /// impl Entity for Note {
    ///     type Id = i64;
    ///     const ENTITY_TYPE: &'static str = "Note";
    ///     fn id(&self) -> &i64 {
    ///         &self.id
    ///     }
    /// }
    ///
    /// impl Record for Note {
    ///     fn field(&self, name: &str) -> Option<FilterValue> {
    ///         (name == "id").then(|| self.id.into())
    ///     }
    /// }
    ///
    /// let spec = Specification::<Note>::builder()
    ///     .apply_paging(4, 2)?
    ///     .add_order_by("id")
    ///     .build();
    ///
    /// let query = SpecificationEvaluator::get_query(MemoryStore::<Note>::new(vec![]).query(), &spec);
    /// assert_eq!(
    ///     query.plan().steps(),
    ///     &[
    ///         QueryStep::OrderBy(SortKey::new("id"), OrderDirection::Ascending),
    ///         QueryStep::Skip(4),
    ///         QueryStep::Take(2),
    ///     ]
    /// );
    /// # Ok::<(), spec_repository::SpecificationError>(())
    /// ```
    pub fn get_query<T, Q>(input: Q, spec: &Specification<T>) -> Q
    where
        Q: Queryable<T>,
    {
        let mut query = input;

        if let Some(criteria) = spec.criteria() {
            query = query.filter(criteria);
        }

        query = spec
            .includes()
            .iter()
            .fold(query, |query, include| query.include(include));

        if let Some((key, direction)) = spec.ordering() {
            query = query.order_by(key, direction);
        }

        if spec.is_paging_enabled() {
            query = query.skip(spec.skip()).take(spec.take());
        }

        query
    }
}
