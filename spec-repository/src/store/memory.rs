//! In-memory store
//!
//! Holds an immutable snapshot of the collection and evaluates recorded query
//! plans against it. Criteria follow SQL semantics: comparisons against null
//! are unknown, unknown rows are filtered out, and nulls sort last ascending
//! and first descending. Without an ordering, results keep insertion order.
//!
//! Relations are populated by [`RelationResolver`]s registered per include path.
//!
//! # Example
//!
//! ```rust
//! use spec_repository::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Book {
//!     id: i32,
//!     author_id: i32,
//!     author: Option<String>,
//! }
//!
//! impl Entity for Book {
//!     type Id = i32;
//!     const ENTITY_TYPE: &'static str = "Book";
//!     fn id(&self) -> &i32 {
//!         &self.id
//!     }
//! }
//!
//! impl Record for Book {
//!     fn field(&self, name: &str) -> Option<FilterValue> {
//!         match name {
//!             "id" => Some(self.id.into()),
//!             "author_id" => Some(self.author_id.into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let store = MemoryStore::new(vec![Book { id: 1, author_id: 9, author: None }])
//!     .with_relation("author", |books: &mut [Book]| {
//!         for book in books {
//!             book.author = Some(format!("author #{}", book.author_id));
//!         }
//!         Ok(())
//!     });
//!
//! assert_eq!(store.len(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use super::plan::{QueryPlan, QueryStep};
use super::{Queryable, Store};
use crate::entity::{Entity, Record};
use crate::repository::{RepositoryError, RepositoryResult};
use crate::specification::{
    Criteria, FilterCondition, FilterOperator, FilterValue, Include, OrderDirection, SortKey,
};

/// Populates one relation on a batch of entities
pub type RelationResolver<T> = Arc<dyn Fn(&mut [T]) -> RepositoryResult<()> + Send + Sync>;

type Relations<T> = Arc<HashMap<String, RelationResolver<T>>>;

struct Inner<T> {
    rows: RwLock<Arc<[T]>>,
    relations: RwLock<Relations<T>>,
    failure: RwLock<Option<RepositoryError>>,
}

/// In-process collection of entities
///
/// Cloning is cheap and clones share the same collection.
pub struct MemoryStore<T> {
    inner: Arc<Inner<T>>,
}

impl<T> MemoryStore<T> {
    /// Create a store holding `rows` in the given order
    pub fn new(rows: impl IntoIterator<Item = T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                rows: RwLock::new(rows.into_iter().collect()),
                relations: RwLock::new(Arc::new(HashMap::new())),
                failure: RwLock::new(None),
            }),
        }
    }

    /// Register a relation resolver and return the store
    #[must_use]
    pub fn with_relation<F>(self, path: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&mut [T]) -> RepositoryResult<()> + Send + Sync + 'static,
    {
        self.register_relation(path, resolver);
        self
    }

    /// Register (or replace) the resolver for an include path
    pub fn register_relation<F>(&self, path: impl Into<String>, resolver: F)
    where
        F: Fn(&mut [T]) -> RepositoryResult<()> + Send + Sync + 'static,
    {
        let mut guard = self
            .inner
            .relations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut relations: HashMap<_, _> = guard.as_ref().clone();
        relations.insert(path.into(), Arc::new(resolver) as RelationResolver<T>);
        *guard = Arc::new(relations);
    }

    /// Current contents of the collection
    pub fn snapshot(&self) -> Arc<[T]> {
        read(&self.inner.rows).clone()
    }

    /// Replace the collection; queries already handed out keep their snapshot
    pub fn replace(&self, rows: impl IntoIterator<Item = T>) {
        let rows: Arc<[T]> = rows.into_iter().collect();
        *self
            .inner
            .rows
            .write()
            .unwrap_or_else(PoisonError::into_inner) = rows;
    }

    /// Make every subsequent query fail with `failure` (`None` restores service)
    pub fn set_failure(&self, failure: Option<RepositoryError>) {
        *self
            .inner
            .failure
            .write()
            .unwrap_or_else(PoisonError::into_inner) = failure;
    }

    /// Number of entities in the collection
    pub fn len(&self) -> usize {
        read(&self.inner.rows).len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .field(
                "relations",
                &read(&self.inner.relations).keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: Entity + Record> Store<T> for MemoryStore<T> {
    type Query = MemoryQuery<T>;

    fn query(&self) -> MemoryQuery<T> {
        MemoryQuery {
            rows: self.snapshot(),
            relations: read(&self.inner.relations).clone(),
            failure: read(&self.inner.failure).clone(),
            plan: QueryPlan::new(),
        }
    }
}

fn read<G>(lock: &RwLock<G>) -> RwLockReadGuard<'_, G> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Query over a [`MemoryStore`] snapshot
pub struct MemoryQuery<T> {
    rows: Arc<[T]>,
    relations: Relations<T>,
    failure: Option<RepositoryError>,
    plan: QueryPlan,
}

impl<T> MemoryQuery<T> {
    /// Steps recorded so far
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    fn push(mut self, step: QueryStep) -> Self {
        self.plan.push(step);
        self
    }
}

impl<T> fmt::Debug for MemoryQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryQuery")
            .field("rows", &self.rows.len())
            .field("plan", &self.plan)
            .finish()
    }
}

impl<T: Entity + Record> MemoryQuery<T> {
    /// Run filter, ordering and windowing steps, in plan order
    fn select(&self) -> RepositoryResult<Vec<&T>> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone().with_entity_type(T::ENTITY_TYPE));
        }

        let mut selected: Vec<&T> = self.rows.iter().collect();
        for step in self.plan.steps() {
            match step {
                QueryStep::Filter(criteria) => {
                    let mut kept = Vec::with_capacity(selected.len());
                    for row in selected {
                        if evaluate(criteria, row)? == Some(true) {
                            kept.push(row);
                        }
                    }
                    selected = kept;
                }
                QueryStep::Include(_) => {}
                QueryStep::OrderBy(key, direction) => sort_rows(&mut selected, key, *direction)?,
                QueryStep::Skip(count) => {
                    let count = to_index(*count).min(selected.len());
                    selected.drain(..count);
                }
                QueryStep::Take(count) => selected.truncate(to_index(*count)),
            }
        }

        tracing::trace!(
            entity = T::ENTITY_TYPE,
            steps = self.plan.steps().len(),
            scanned = self.rows.len(),
            selected = selected.len(),
            "Evaluated in-memory query"
        );
        Ok(selected)
    }

    fn execute(&self) -> RepositoryResult<Vec<T>> {
        let mut rows: Vec<T> = self.select()?.into_iter().cloned().collect();
        for include in self.plan.includes() {
            self.resolve(include, &mut rows)?;
        }
        Ok(rows)
    }

    fn resolve(&self, include: &Include, rows: &mut [T]) -> RepositoryResult<()> {
        let resolver = self
            .relations
            .get(include.path())
            .ok_or_else(|| RepositoryError::relation_load(T::ENTITY_TYPE, include.path()))?;
        resolver(rows)
    }
}

impl<T: Entity + Record> Queryable<T> for MemoryQuery<T> {
    fn filter(self, criteria: &Criteria) -> Self {
        self.push(QueryStep::Filter(criteria.clone()))
    }

    fn include(self, include: &Include) -> Self {
        self.push(QueryStep::Include(include.clone()))
    }

    fn order_by(self, key: &SortKey, direction: OrderDirection) -> Self {
        self.push(QueryStep::OrderBy(key.clone(), direction))
    }

    fn skip(self, count: u64) -> Self {
        self.push(QueryStep::Skip(count))
    }

    fn take(self, count: u64) -> Self {
        self.push(QueryStep::Take(count))
    }

    async fn to_list(self) -> RepositoryResult<Vec<T>> {
        self.execute()
    }

    async fn first(self) -> RepositoryResult<Option<T>> {
        let mut rows = self.take(1).execute()?;
        Ok(rows.pop())
    }

    async fn count(self) -> RepositoryResult<u64> {
        Ok(self.select()?.len() as u64)
    }
}

fn to_index(count: u64) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

fn unknown_field<T: Entity>(field: &str) -> RepositoryError {
    RepositoryError::malformed_criteria(format!("Unknown field '{}'", field))
        .with_entity_type(T::ENTITY_TYPE)
}

fn read_field<T: Entity + Record>(row: &T, field: &str) -> RepositoryResult<FilterValue> {
    row.field(field).ok_or_else(|| unknown_field::<T>(field))
}

/// Three-valued evaluation: `None` is SQL's unknown
fn evaluate<T: Entity + Record>(criteria: &Criteria, row: &T) -> RepositoryResult<Option<bool>> {
    match criteria {
        Criteria::Condition(condition) => evaluate_condition(condition, row),
        Criteria::And(items) => {
            let mut result = Some(true);
            for item in items {
                match evaluate(item, row)? {
                    Some(false) => return Ok(Some(false)),
                    None => result = None,
                    Some(true) => {}
                }
            }
            Ok(result)
        }
        Criteria::Or(items) => {
            let mut result = Some(false);
            for item in items {
                match evaluate(item, row)? {
                    Some(true) => return Ok(Some(true)),
                    None => result = None,
                    Some(false) => {}
                }
            }
            Ok(result)
        }
        Criteria::Not(inner) => Ok(evaluate(inner, row)?.map(|matched| !matched)),
    }
}

fn evaluate_condition<T: Entity + Record>(
    condition: &FilterCondition,
    row: &T,
) -> RepositoryResult<Option<bool>> {
    let actual = read_field(row, &condition.field)?;
    let expected = &condition.value;

    match condition.operator {
        FilterOperator::IsNull => return Ok(Some(actual.is_null())),
        FilterOperator::IsNotNull => return Ok(Some(!actual.is_null())),
        _ if actual.is_null() || expected.is_null() => return Ok(None),
        _ => {}
    }

    let mismatch = || {
        RepositoryError::malformed_criteria(format!(
            "Cannot apply {} to field '{}' with value {:?}",
            condition.operator, condition.field, expected
        ))
        .with_entity_type(T::ENTITY_TYPE)
    };

    let matched = match condition.operator {
        FilterOperator::Like | FilterOperator::ILike => match (&actual, expected) {
            (FilterValue::String(text), FilterValue::String(pattern)) => {
                if condition.operator == FilterOperator::ILike {
                    like_match(&pattern.to_lowercase(), &text.to_lowercase())
                } else {
                    like_match(pattern, text)
                }
            }
            _ => return Err(mismatch()),
        },
        FilterOperator::In => match (&actual, expected) {
            (FilterValue::String(value), FilterValue::StringList(list)) => list.contains(value),
            (FilterValue::Integer(value), FilterValue::IntegerList(list)) => list.contains(value),
            _ => return Err(mismatch()),
        },
        operator => {
            let ordering = compare_values(&actual, expected).ok_or_else(mismatch)?;
            match operator {
                FilterOperator::Equal => ordering == Ordering::Equal,
                FilterOperator::NotEqual => ordering != Ordering::Equal,
                FilterOperator::GreaterThan => ordering == Ordering::Greater,
                FilterOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                FilterOperator::LessThan => ordering == Ordering::Less,
                FilterOperator::LessThanOrEqual => ordering != Ordering::Greater,
                _ => return Err(mismatch()),
            }
        }
    };
    Ok(Some(matched))
}

fn compare_values(a: &FilterValue, b: &FilterValue) -> Option<Ordering> {
    use FilterValue as V;
    match (a, b) {
        (V::String(x), V::String(y)) => Some(x.cmp(y)),
        (V::Integer(x), V::Integer(y)) => Some(x.cmp(y)),
        (V::Float(x), V::Float(y)) => Some(compare_floats(*x, *y)),
        (V::Integer(x), V::Float(y)) => Some(compare_floats(*x as f64, *y)),
        (V::Float(x), V::Integer(y)) => Some(compare_floats(*x, *y as f64)),
        (V::Boolean(x), V::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order on floats: NaN equals NaN and sorts above every number
fn compare_floats(x: f64, y: f64) -> Ordering {
    x.partial_cmp(&y).unwrap_or_else(|| x.is_nan().cmp(&y.is_nan()))
}

fn sort_rows<T: Entity + Record>(
    rows: &mut Vec<&T>,
    key: &SortKey,
    direction: OrderDirection,
) -> RepositoryResult<()> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        keyed.push((read_field(*row, key.field())?, *row));
    }

    // Stable, so equal keys keep their previous relative order.
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare_values(a, b).unwrap_or(Ordering::Equal),
        };
        match direction {
            OrderDirection::Ascending => ordering,
            OrderDirection::Descending => ordering.reverse(),
        }
    });

    rows.clear();
    rows.extend(keyed.into_iter().map(|(_, row)| row));
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    AnyRun,
    AnyChar,
    Literal(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            other => LikeToken::Literal(other),
        });
    }
    tokens
}

fn like_match(pattern: &str, text: &str) -> bool {
    let tokens = like_tokens(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::AnyChar) => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
            }
            _ => match backtrack {
                Some((run, start)) => {
                    p = run + 1;
                    t = start + 1;
                    backtrack = Some((run, start + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|token| *token == LikeToken::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RepositoryErrorKind, RepositoryOperation};

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        name: String,
        rating: Option<f64>,
        tags: Vec<String>,
    }

    impl Entity for Item {
        type Id = i64;
        const ENTITY_TYPE: &'static str = "Item";

        fn id(&self) -> &i64 {
            &self.id
        }
    }

    impl Record for Item {
        fn field(&self, name: &str) -> Option<FilterValue> {
            match name {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.as_str().into()),
                "rating" => Some(self.rating.into()),
                _ => None,
            }
        }
    }

    fn item(id: i64, name: &str, rating: Option<f64>) -> Item {
        Item {
            id,
            name: name.to_string(),
            rating,
            tags: Vec::new(),
        }
    }

    fn store() -> MemoryStore<Item> {
        MemoryStore::new(vec![
            item(1, "Boots", Some(4.5)),
            item(2, "Gloves", None),
            item(3, "Hat", Some(3.0)),
            item(4, "Scarf", Some(4.5)),
        ])
    }

    fn ids(rows: &[Item]) -> Vec<i64> {
        rows.iter().map(|row| row.id).collect()
    }

    fn cond(condition: FilterCondition) -> Criteria {
        condition.into()
    }

    #[tokio::test]
    async fn test_unfiltered_query_keeps_insertion_order() {
        let rows = store().query().to_list().await.unwrap();
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_comparison_operators() {
        let cases = vec![
            (FilterCondition::eq("id", 2_i64), vec![2]),
            (FilterCondition::ne("id", 2_i64), vec![1, 3, 4]),
            (FilterCondition::gt("id", 2_i64), vec![3, 4]),
            (FilterCondition::gte("id", 2_i64), vec![2, 3, 4]),
            (FilterCondition::lt("id", 2_i64), vec![1]),
            (FilterCondition::lte("id", 2_i64), vec![1, 2]),
            (FilterCondition::gte("rating", 4_i64), vec![1, 4]),
            (FilterCondition::in_integers("id", vec![1, 3]), vec![1, 3]),
            (
                FilterCondition::in_strings("name", vec!["Hat".into(), "Cap".into()]),
                vec![3],
            ),
        ];
        for (condition, expected) in cases {
            let rows = store().query().filter(&cond(condition.clone())).to_list().await.unwrap();
            assert_eq!(ids(&rows), expected, "condition {:?}", condition);
        }
    }

    #[tokio::test]
    async fn test_null_comparisons_are_unknown() {
        let not_high = !cond(FilterCondition::gt("rating", 4.0_f64));
        let rows = store().query().filter(&not_high).to_list().await.unwrap();
        // Gloves has no rating, so neither the comparison nor its negation holds.
        assert_eq!(ids(&rows), vec![3]);

        let rows = store()
            .query()
            .filter(&cond(FilterCondition::is_null("rating")))
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![2]);
    }

    #[tokio::test]
    async fn test_unknown_or_true_is_true() {
        let criteria = cond(FilterCondition::gt("rating", 4.0_f64))
            .or(FilterCondition::eq("name", "Gloves"));
        let rows = store().query().filter(&criteria).to_list().await.unwrap();
        assert_eq!(ids(&rows), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_empty_and_matches_all_empty_or_matches_none() {
        let all = store().query().filter(&Criteria::And(vec![])).count().await.unwrap();
        let none = store().query().filter(&Criteria::Or(vec![])).count().await.unwrap();
        assert_eq!((all, none), (4, 0));
    }

    #[tokio::test]
    async fn test_successive_filters_narrow() {
        let rows = store()
            .query()
            .filter(&cond(FilterCondition::gt("id", 1_i64)))
            .filter(&cond(FilterCondition::lt("id", 4_i64)))
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_like_and_ilike() {
        let like = store()
            .query()
            .filter(&cond(FilterCondition::like("name", "%o%")))
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&like), vec![1, 2]);

        let ilike = store()
            .query()
            .filter(&cond(FilterCondition::contains_ignore_case("name", "SCA")))
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&ilike), vec![4]);
    }

    #[test]
    fn test_like_match_wildcards_and_escapes() {
        assert!(like_match("H_t", "Hat"));
        assert!(!like_match("H_t", "Heat"));
        assert!(like_match("%a%b%", "xxaxxbxx"));
        assert!(like_match("%", ""));
        assert!(!like_match("_", ""));
        assert!(like_match("100\\%", "100%"));
        assert!(!like_match("100\\%", "1000"));
        assert!(like_match("a\\_b", "a_b"));
        assert!(!like_match("a\\_b", "axb"));
        assert!(like_match("%ab", "aab"));
    }

    #[tokio::test]
    async fn test_unknown_field_is_malformed_criteria() {
        let err = store()
            .query()
            .filter(&cond(FilterCondition::eq("colour", "red")))
            .to_list()
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::MalformedCriteria);
        assert_eq!(err.entity_type.as_deref(), Some("Item"));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_malformed_criteria() {
        let err = store()
            .query()
            .filter(&cond(FilterCondition::gt("name", 3_i64)))
            .count()
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::MalformedCriteria);
    }

    #[tokio::test]
    async fn test_sort_puts_nulls_last_ascending_first_descending() {
        let key = SortKey::new("rating");
        let asc = store()
            .query()
            .order_by(&key, OrderDirection::Ascending)
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec![3, 1, 4, 2]);

        let desc = store()
            .query()
            .order_by(&key, OrderDirection::Descending)
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&desc), vec![2, 1, 4, 3]);
    }

    #[tokio::test]
    async fn test_sort_and_page_with_nan() {
        let readings: Vec<Item> = (0..200)
            .map(|i| {
                let rating = if i % 3 == 0 { f64::NAN } else { ((i * 37) % 101) as f64 };
                item(i, "reading", Some(rating))
            })
            .collect();
        let nan_count = readings.iter().filter(|r| r.rating.is_some_and(f64::is_nan)).count();
        let store = MemoryStore::new(readings);
        let key = SortKey::new("rating");

        let asc = store
            .query()
            .order_by(&key, OrderDirection::Ascending)
            .to_list()
            .await
            .unwrap();
        let ratings: Vec<f64> = asc.iter().filter_map(|r| r.rating).collect();
        let (numbers, nans) = ratings.split_at(ratings.len() - nan_count);
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        assert!(nans.iter().all(|r| r.is_nan()));

        let desc = store
            .query()
            .order_by(&key, OrderDirection::Descending)
            .skip(nan_count as u64)
            .take(3)
            .to_list()
            .await
            .unwrap();
        let mut top: Vec<f64> = numbers.to_vec();
        top.reverse();
        assert_eq!(
            desc.iter().filter_map(|r| r.rating).collect::<Vec<_>>(),
            top[..3].to_vec()
        );
    }

    #[tokio::test]
    async fn test_nan_compares_above_numbers() {
        let store = MemoryStore::new(vec![
            item(1, "a", Some(f64::NAN)),
            item(2, "b", Some(1.0)),
            item(3, "c", Some(f64::INFINITY)),
        ]);
        let rows = store
            .query()
            .filter(&cond(FilterCondition::gt("rating", 2_i64)))
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![1, 3]);

        let rows = store
            .query()
            .filter(&cond(FilterCondition::eq("rating", f64::NAN)))
            .to_list()
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![1]);
    }

    #[tokio::test]
    async fn test_pattern_and_list_against_null_match_nothing() {
        for operator in [FilterOperator::Like, FilterOperator::ILike, FilterOperator::In] {
            let criteria = cond(FilterCondition::new("name", operator, FilterValue::Null));
            let rows = store().query().filter(&criteria).to_list().await.unwrap();
            assert!(rows.is_empty(), "operator {}", operator);

            let rows = store().query().filter(&!criteria).to_list().await.unwrap();
            assert!(rows.is_empty(), "NOT {}", operator);
        }
    }

    #[tokio::test]
    async fn test_skip_then_take() {
        let rows = store().query().skip(1).take(2).to_list().await.unwrap();
        assert_eq!(ids(&rows), vec![2, 3]);

        let rows = store().query().skip(10).take(2).to_list().await.unwrap();
        assert!(rows.is_empty());

        let rows = store().query().take(0).to_list().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_first_respects_order() {
        let first = store()
            .query()
            .order_by(&SortKey::new("name"), OrderDirection::Descending)
            .first()
            .await
            .unwrap();
        assert_eq!(first.map(|row| row.id), Some(4));

        let none = store()
            .query()
            .filter(&cond(FilterCondition::eq("id", 99_i64)))
            .first()
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_relation_resolver_runs_for_each_include() {
        let store = store().with_relation("tags", |rows: &mut [Item]| {
            for row in rows.iter_mut() {
                row.tags = vec![format!("tag-{}", row.id)];
            }
            Ok(())
        });
        let rows = store
            .query()
            .filter(&cond(FilterCondition::lte("id", 2_i64)))
            .include(&Include::new("tags"))
            .include(&Include::new("tags"))
            .to_list()
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tags, vec!["tag-1".to_string()]);
        assert_eq!(rows[1].tags, vec!["tag-2".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_relation_fails() {
        let err = store()
            .query()
            .include(&Include::new("owner"))
            .to_list()
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::RelationLoad);
        assert_eq!(err.operation, RepositoryOperation::LoadRelation);
    }

    #[tokio::test]
    async fn test_injected_failure_propagates() {
        let store = store();
        store.set_failure(Some(RepositoryError::connection_failed("store offline")));
        let err = store.query().to_list().await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);

        store.set_failure(None);
        assert_eq!(store.query().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_query_keeps_snapshot_after_replace() {
        let store = store();
        let query = store.query();
        store.replace(vec![item(9, "Belt", None)]);

        assert_eq!(query.count().await.unwrap(), 4);
        assert_eq!(ids(&store.query().to_list().await.unwrap()), vec![9]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_plan_records_steps_in_order() {
        let query = store()
            .query()
            .skip(1)
            .include(&Include::new("tags"))
            .take(2);
        assert_eq!(
            query.plan().steps(),
            &[
                QueryStep::Skip(1),
                QueryStep::Include(Include::new("tags")),
                QueryStep::Take(2),
            ]
        );
    }
}
