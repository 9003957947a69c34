//! Repository over a pluggable store
//!
//! ```rust
//! use spec_repository::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Tag {
//!     id: i64,
//! }
//!
//! impl Entity for Tag {
//!     type Id = i64;
//!     const ENTITY_TYPE: &'static str = "Tag";
//!     fn id(&self) -> &i64 {
//!         &self.id
//!     }
//! }
//!
//! impl Record for Tag {
//!     fn field(&self, name: &str) -> Option<FilterValue> {
//!         (name == "id").then(|| self.id.into())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> RepositoryResult<()> {
//!     let repo = StoreRepository::new(MemoryStore::new(vec![Tag { id: 1 }, Tag { id: 2 }]));
//!     assert!(repo.get_by_id(&2).await?.is_some());
//!     assert!(repo.get_by_id(&9).await?.is_none());
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::error::RepositoryOperation;
use super::traits::{GenericRepository, RepositoryResult};
use crate::entity::Entity;
use crate::evaluator::SpecificationEvaluator;
use crate::specification::Specification;
use crate::store::{Queryable, Store};

/// [`GenericRepository`] over any [`Store`]
///
/// Holds no state besides the store handle; every call builds its own query,
/// so a single repository can serve concurrent callers.
pub struct StoreRepository<T, S> {
    store: S,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S> StoreRepository<T, S>
where
    T: Entity,
    S: Store<T>,
{
    /// Create a repository over `store`
    pub fn new(store: S) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn annotate<R>(
        result: RepositoryResult<R>,
        operation: RepositoryOperation,
    ) -> RepositoryResult<R> {
        result.map_err(|err| {
            let err = err.with_operation(operation).with_entity_type(T::ENTITY_TYPE);
            tracing::warn!(
                entity = T::ENTITY_TYPE,
                operation = %operation,
                kind = %err.kind,
                error = %err.message,
                "Repository query failed"
            );
            err
        })
    }
}

impl<T, S> GenericRepository<T> for StoreRepository<T, S>
where
    T: Entity,
    S: Store<T>,
{
    async fn get_by_id(&self, id: &T::Id) -> RepositoryResult<Option<T>> {
        tracing::debug!(entity = T::ENTITY_TYPE, id = %id, "get_by_id");
        let spec = Specification::<T>::by_id(id.clone()).build();
        let query = SpecificationEvaluator::get_query(self.store.query(), &spec);
        Self::annotate(query.first().await, RepositoryOperation::GetById)
            .map_err(|err| err.with_entity(T::ENTITY_TYPE, id.to_string()))
    }

    async fn list_all(&self) -> RepositoryResult<Vec<T>> {
        tracing::debug!(entity = T::ENTITY_TYPE, "list_all");
        Self::annotate(self.store.query().to_list().await, RepositoryOperation::ListAll)
    }

    async fn get_entity_with_spec(&self, spec: &Specification<T>) -> RepositoryResult<Option<T>> {
        tracing::debug!(
            entity = T::ENTITY_TYPE,
            includes = spec.includes().len(),
            "get_entity_with_spec"
        );
        let query = SpecificationEvaluator::get_query(self.store.query(), spec);
        Self::annotate(query.first().await, RepositoryOperation::GetEntityWithSpec)
    }

    async fn list(&self, spec: &Specification<T>) -> RepositoryResult<Vec<T>> {
        tracing::debug!(
            entity = T::ENTITY_TYPE,
            includes = spec.includes().len(),
            paged = spec.is_paging_enabled(),
            skip = spec.skip(),
            take = spec.take(),
            "list"
        );
        let query = SpecificationEvaluator::get_query(self.store.query(), spec);
        let rows = Self::annotate(query.to_list().await, RepositoryOperation::List)?;
        tracing::debug!(entity = T::ENTITY_TYPE, rows = rows.len(), "list complete");
        Ok(rows)
    }

    async fn count(&self, spec: &Specification<T>) -> RepositoryResult<u64> {
        tracing::debug!(entity = T::ENTITY_TYPE, "count");
        let query = SpecificationEvaluator::get_query(self.store.query(), &spec.for_count());
        Self::annotate(query.count().await, RepositoryOperation::Count)
    }
}

impl<T, S: Clone> Clone for StoreRepository<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T, S: fmt::Debug> fmt::Debug for StoreRepository<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRepository")
            .field("entity", &std::any::type_name::<T>())
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use crate::repository::{RepositoryError, RepositoryErrorKind};
    use crate::specification::{FilterCondition, FilterValue};
    use crate::store::MemoryStore;
    use futures::future::join_all;

    #[derive(Debug, Clone, PartialEq)]
    struct Label {
        id: i32,
        name: String,
        owner_id: i32,
        owner: Option<String>,
    }

    impl Entity for Label {
        type Id = i32;
        const ENTITY_TYPE: &'static str = "Label";

        fn id(&self) -> &i32 {
            &self.id
        }
    }

    impl Record for Label {
        fn field(&self, name: &str) -> Option<FilterValue> {
            match name {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.as_str().into()),
                "owner_id" => Some(self.owner_id.into()),
                _ => None,
            }
        }
    }

    fn label(id: i32, name: &str) -> Label {
        Label {
            id,
            name: name.to_string(),
            owner_id: id * 10,
            owner: None,
        }
    }

    fn repo_with(rows: Vec<Label>) -> StoreRepository<Label, MemoryStore<Label>> {
        let store = MemoryStore::new(rows).with_relation("owner", |rows: &mut [Label]| {
            for row in rows.iter_mut() {
                row.owner = Some(format!("owner-{}", row.owner_id));
            }
            Ok(())
        });
        StoreRepository::new(store)
    }

    fn repo() -> StoreRepository<Label, MemoryStore<Label>> {
        repo_with(vec![label(1, "A"), label(2, "B"), label(3, "C")])
    }

    fn names(rows: &[Label]) -> Vec<&str> {
        rows.iter().map(|row| row.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_descending_first_page() {
        let spec = Specification::<Label>::builder()
            .add_order_by_descending("name")
            .apply_paging(0, 2)
            .unwrap()
            .build();
        let rows = repo().list(&spec).await.unwrap();
        assert_eq!(
            rows.iter().map(|r| (r.id, r.name.as_str())).collect::<Vec<_>>(),
            vec![(3, "C"), (2, "B")]
        );
    }

    #[tokio::test]
    async fn test_paging_window_after_ordering() {
        let rows: Vec<_> = [5, 3, 7, 1, 6, 2, 4]
            .iter()
            .map(|id| label(*id, &format!("n{}", id)))
            .collect();
        let spec = Specification::<Label>::builder()
            .add_order_by("id")
            .apply_paging(2, 3)
            .unwrap()
            .build();
        let page = repo_with(rows).list(&spec).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_paging_without_ordering_is_stable() {
        let spec = Specification::<Label>::builder()
            .apply_paging(1, 1)
            .unwrap()
            .build();
        let repo = repo();
        let first = repo.list(&spec).await.unwrap();
        let second = repo.list(&spec).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["B"]);
    }

    #[tokio::test]
    async fn test_empty_spec_lists_everything() {
        let repo = repo();
        let listed = repo.list(&Specification::all()).await.unwrap();
        let all = repo.list_all().await.unwrap();
        assert_eq!(listed, all);
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let repo = repo();
        let found = repo.get_by_id(&2).await.unwrap();
        assert_eq!(found.as_ref().map(|l| l.name.as_str()), Some("B"));
        assert!(found.and_then(|l| l.owner).is_none());

        assert!(repo.get_by_id(&42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_entity_with_spec_loads_includes() {
        let spec = Specification::<Label>::by_id(3).add_include("owner").build();
        let found = repo().get_entity_with_spec(&spec).await.unwrap();
        assert_eq!(found.and_then(|l| l.owner), Some("owner-30".to_string()));
    }

    #[tokio::test]
    async fn test_get_entity_with_spec_missing_is_none() {
        let spec = Specification::<Label>::by_id(99).add_include("owner").build();
        assert_eq!(repo().get_entity_with_spec(&spec).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_includes_do_not_duplicate_rows() {
        let spec = Specification::<Label>::builder()
            .add_include("owner")
            .add_include("owner")
            .build();
        let rows = repo().list(&spec).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].owner.as_deref(), Some("owner-10"));
    }

    #[tokio::test]
    async fn test_equal_specs_give_equal_results() {
        let build = || {
            Specification::<Label>::with_criteria(FilterCondition::gte("id", 2_i32))
                .add_order_by_descending("name")
                .build()
        };
        let repo = repo();
        let a = repo.list(&build()).await.unwrap();
        let b = repo.list(&build()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(names(&a), vec!["C", "B"]);
    }

    #[tokio::test]
    async fn test_count_ignores_paging() {
        let spec = Specification::<Label>::with_criteria(FilterCondition::gt("id", 1_i32))
            .add_order_by("name")
            .add_include("owner")
            .apply_paging(0, 1)
            .unwrap()
            .build();
        let repo = repo();
        assert_eq!(repo.list(&spec).await.unwrap().len(), 1);
        assert_eq!(repo.count(&spec).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_not_found() {
        let repo = repo();
        repo.store()
            .set_failure(Some(RepositoryError::connection_failed("refused")));

        let err = repo.get_by_id(&1).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);
        assert_eq!(err.operation, RepositoryOperation::GetById);
        assert_eq!(err.entity_type.as_deref(), Some("Label"));
        assert_eq!(err.entity_id.as_deref(), Some("1"));
        assert!(err.is_retriable());

        let err = repo.list(&Specification::all()).await.unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::List);

        let err = repo.count(&Specification::all()).await.unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Count);
    }

    #[tokio::test]
    async fn test_unknown_relation_is_reported() {
        let spec = Specification::<Label>::builder().add_include("parent").build();
        let err = repo().list(&spec).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::RelationLoad);
        assert_eq!(err.operation, RepositoryOperation::List);
        assert!(err.to_string().contains("parent"));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_repository() {
        let repo = repo();
        let specs: Vec<_> = (1..=3)
            .map(|id| Specification::<Label>::by_id(id).add_include("owner").build())
            .collect();

        let results = join_all(specs.iter().map(|spec| repo.get_entity_with_spec(spec))).await;
        let ids: Vec<_> = results
            .into_iter()
            .map(|r| r.unwrap().map(|l| l.id))
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }
}
