//! PostgreSQL store
//!
//! Renders queries into a single parameterized statement with
//! [`sqlx::QueryBuilder`]: `SELECT ... FROM table WHERE ... ORDER BY ... OFFSET
//! $n LIMIT $m`. Every value is bound; field names are checked against
//! [`PgEntity::COLUMNS`] before anything is sent to the server.
//!
//! Includes are not joins. After the main rows are fetched, each requested
//! relation is loaded with [`PgEntity::load_relation`], typically one
//! `WHERE id = ANY($1)` query per relation.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{Queryable, Store};
use crate::entity::Entity;
use crate::repository::{RepositoryError, RepositoryResult};
use crate::specification::{
    Criteria, FilterCondition, FilterOperator, FilterValue, Include, OrderDirection, SortKey,
};

/// Entity stored in a PostgreSQL table
///
/// # Example
///
/// ```rust,ignore
/// impl PgEntity for ProductBrand {
///     const TABLE: &'static str = "product_brands";
///     const COLUMNS: &'static [&'static str] = &["id", "name"];
/// }
/// ```
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> + Unpin {
    /// Table (optionally schema-qualified) holding the entity
    const TABLE: &'static str;

    /// Selectable columns; also the only names criteria and sort keys may use
    const COLUMNS: &'static [&'static str];

    /// Populate the relation named by `include` on every row
    ///
    /// The default knows no relations.
    fn load_relation(
        pool: &PgPool,
        include: &Include,
        rows: &mut [Self],
    ) -> impl Future<Output = RepositoryResult<()>> + Send {
        let _ = (pool, rows);
        let err = RepositoryError::relation_load(Self::ENTITY_TYPE, include.path());
        async move { Err(err) }
    }
}

/// Store backed by a PostgreSQL connection pool
pub struct PgStore<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgStore<T> {
    /// Create a store over `pool`
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<T> Clone for PgStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> fmt::Debug for PgStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgStore")
            .field("entity", &std::any::type_name::<T>())
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl<T: PgEntity> Store<T> for PgStore<T> {
    type Query = PgQuery<T>;

    fn query(&self) -> PgQuery<T> {
        PgQuery {
            pool: self.pool.clone(),
            select: SqlSelect::new(),
        }
    }
}

/// Query over a [`PgStore`]
pub struct PgQuery<T> {
    pool: PgPool,
    select: SqlSelect<T>,
}

impl<T> PgQuery<T> {
    /// Statement the query will run
    pub fn select(&self) -> &SqlSelect<T> {
        &self.select
    }
}

impl<T> fmt::Debug for PgQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgQuery")
            .field("select", &self.select)
            .finish()
    }
}

impl<T: PgEntity> PgQuery<T> {
    async fn load_includes(&self, rows: &mut [T]) -> RepositoryResult<()> {
        for include in &self.select.includes {
            tracing::debug!(
                entity = T::ENTITY_TYPE,
                relation = %include,
                rows = rows.len(),
                "Loading relation"
            );
            T::load_relation(&self.pool, include, rows).await?;
        }
        Ok(())
    }
}

impl<T: PgEntity> Queryable<T> for PgQuery<T> {
    fn filter(mut self, criteria: &Criteria) -> Self {
        self.select = self.select.filter(criteria);
        self
    }

    fn include(mut self, include: &Include) -> Self {
        self.select.includes.push(include.clone());
        self
    }

    fn order_by(mut self, key: &SortKey, direction: OrderDirection) -> Self {
        self.select = self.select.order_by(key, direction);
        self
    }

    fn skip(mut self, count: u64) -> Self {
        self.select = self.select.skip(count);
        self
    }

    fn take(mut self, count: u64) -> Self {
        self.select = self.select.take(count);
        self
    }

    async fn to_list(self) -> RepositoryResult<Vec<T>> {
        let mut builder = self.select.build()?;
        tracing::debug!(entity = T::ENTITY_TYPE, sql = builder.sql(), "Executing query");

        let mut rows = builder
            .build_query_as::<T>()
            .fetch_all(&self.pool)
            .await?;
        self.load_includes(&mut rows).await?;
        Ok(rows)
    }

    async fn first(self) -> RepositoryResult<Option<T>> {
        let query = self.take(1);
        let mut builder = query.select.build()?;
        tracing::debug!(entity = T::ENTITY_TYPE, sql = builder.sql(), "Executing query");

        let mut row = builder
            .build_query_as::<T>()
            .fetch_optional(&query.pool)
            .await?;
        if let Some(row) = row.as_mut() {
            query.load_includes(std::slice::from_mut(row)).await?;
        }
        Ok(row)
    }

    async fn count(self) -> RepositoryResult<u64> {
        let mut builder = self.select.build_count()?;
        tracing::debug!(entity = T::ENTITY_TYPE, sql = builder.sql(), "Executing count");

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// SELECT statement under construction
///
/// Filtering or ordering a windowed select nests it as a subquery, so every
/// call applies to the rows produced by the calls before it.
pub struct SqlSelect<T> {
    source: Option<Box<SqlSelect<T>>>,
    criteria: Vec<Criteria>,
    includes: Vec<Include>,
    order: Option<(SortKey, OrderDirection)>,
    offset: u64,
    limit: Option<u64>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SqlSelect<T> {
    /// Select every row of the table
    pub fn new() -> Self {
        Self {
            source: None,
            criteria: Vec::new(),
            includes: Vec::new(),
            order: None,
            offset: 0,
            limit: None,
            _entity: PhantomData,
        }
    }

    /// Relations to load after the rows are fetched
    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    fn is_windowed(&self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }

    fn nest(mut self) -> Self {
        let includes = std::mem::take(&mut self.includes);
        let order = self.order.clone();
        Self {
            source: Some(Box::new(self)),
            includes,
            order,
            ..Self::new()
        }
    }

    /// Add a WHERE predicate, ANDed with earlier ones
    #[must_use]
    pub fn filter(self, criteria: &Criteria) -> Self {
        let mut select = if self.is_windowed() { self.nest() } else { self };
        select.criteria.push(criteria.clone());
        select
    }

    /// Set the ORDER BY clause
    #[must_use]
    pub fn order_by(self, key: &SortKey, direction: OrderDirection) -> Self {
        let mut select = if self.is_windowed() { self.nest() } else { self };
        select.order = Some((key.clone(), direction));
        select
    }

    /// Skip `count` more rows of the current window
    #[must_use]
    pub fn skip(mut self, count: u64) -> Self {
        self.offset = self.offset.saturating_add(count);
        self.limit = self.limit.map(|limit| limit.saturating_sub(count));
        self
    }

    /// Shrink the current window to at most `count` rows
    #[must_use]
    pub fn take(mut self, count: u64) -> Self {
        self.limit = Some(self.limit.map_or(count, |limit| limit.min(count)));
        self
    }
}

impl<T: PgEntity> SqlSelect<T> {
    /// SQL text with `$n` placeholders
    ///
    /// # Errors
    ///
    /// `MalformedCriteria` when a field is not one of the entity's columns or a
    /// value does not fit its operator.
    pub fn to_sql(&self) -> RepositoryResult<String> {
        Ok(self.build()?.sql().to_string())
    }

    /// SQL text of the matching COUNT statement
    pub fn to_count_sql(&self) -> RepositoryResult<String> {
        Ok(self.build_count()?.sql().to_string())
    }

    fn build(&self) -> RepositoryResult<QueryBuilder<'static, Postgres>> {
        let mut builder = QueryBuilder::new("");
        self.push_select(&mut builder)?;
        Ok(builder)
    }

    fn build_count(&self) -> RepositoryResult<QueryBuilder<'static, Postgres>> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*)");
        if self.is_windowed() {
            builder.push(" FROM (");
            self.push_select(&mut builder)?;
            builder.push(") AS counted");
        } else {
            self.push_from_where(&mut builder)?;
        }
        Ok(builder)
    }

    fn push_select(&self, builder: &mut QueryBuilder<'static, Postgres>) -> RepositoryResult<()> {
        builder.push("SELECT ");
        for (i, column) in T::COLUMNS.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_identifier(builder, column);
        }

        self.push_from_where(builder)?;

        if let Some((key, direction)) = &self.order {
            builder.push(" ORDER BY ");
            push_identifier(builder, column::<T>(key.field())?);
            builder.push(" ").push(direction.as_sql());
        }
        if self.offset > 0 {
            builder.push(" OFFSET ").push_bind(to_i64(self.offset));
        }
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ").push_bind(to_i64(limit));
        }
        Ok(())
    }

    fn push_from_where(
        &self,
        builder: &mut QueryBuilder<'static, Postgres>,
    ) -> RepositoryResult<()> {
        builder.push(" FROM ");
        match &self.source {
            Some(inner) => {
                builder.push("(");
                inner.push_select(builder)?;
                builder.push(") AS windowed");
            }
            None => {
                builder.push(T::TABLE);
            }
        }

        for (i, criteria) in self.criteria.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            push_criteria::<T>(builder, criteria)?;
        }
        Ok(())
    }
}

impl<T> Default for SqlSelect<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SqlSelect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlSelect")
            .field("source", &self.source)
            .field("criteria", &self.criteria)
            .field("includes", &self.includes)
            .field("order", &self.order)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn column<T: PgEntity>(field: &str) -> RepositoryResult<&'static str> {
    T::COLUMNS
        .iter()
        .copied()
        .find(|column| *column == field)
        .ok_or_else(|| {
            RepositoryError::malformed_criteria(format!(
                "Unknown column '{}' on {}",
                field,
                T::TABLE
            ))
            .with_entity_type(T::ENTITY_TYPE)
        })
}

fn push_identifier(builder: &mut QueryBuilder<'static, Postgres>, column: &str) {
    builder.push("\"").push(column).push("\"");
}

fn push_criteria<T: PgEntity>(
    builder: &mut QueryBuilder<'static, Postgres>,
    criteria: &Criteria,
) -> RepositoryResult<()> {
    match criteria {
        Criteria::Condition(condition) => push_condition::<T>(builder, condition)?,
        Criteria::And(items) => push_group::<T>(builder, items, " AND ", "TRUE")?,
        Criteria::Or(items) => push_group::<T>(builder, items, " OR ", "FALSE")?,
        Criteria::Not(inner) => {
            builder.push("NOT (");
            push_criteria::<T>(builder, inner)?;
            builder.push(")");
        }
    }
    Ok(())
}

fn push_group<T: PgEntity>(
    builder: &mut QueryBuilder<'static, Postgres>,
    items: &[Criteria],
    separator: &str,
    empty: &str,
) -> RepositoryResult<()> {
    if items.is_empty() {
        builder.push(empty);
        return Ok(());
    }
    builder.push("(");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_criteria::<T>(builder, item)?;
    }
    builder.push(")");
    Ok(())
}

fn push_condition<T: PgEntity>(
    builder: &mut QueryBuilder<'static, Postgres>,
    condition: &FilterCondition,
) -> RepositoryResult<()> {
    let mismatch = || {
        RepositoryError::malformed_criteria(format!(
            "Cannot apply {} to column '{}' with value {:?}",
            condition.operator, condition.field, condition.value
        ))
        .with_entity_type(T::ENTITY_TYPE)
    };

    push_identifier(builder, column::<T>(&condition.field)?);
    match (condition.operator, &condition.value) {
        (FilterOperator::IsNull | FilterOperator::IsNotNull, _) => {
            builder.push(" ").push(condition.operator);
        }
        (FilterOperator::In, FilterValue::StringList(values)) => {
            builder.push(" = ANY(").push_bind(values.clone()).push(")");
        }
        (FilterOperator::In, FilterValue::IntegerList(values)) => {
            builder.push(" = ANY(").push_bind(values.clone()).push(")");
        }
        (FilterOperator::Like | FilterOperator::ILike, FilterValue::String(pattern)) => {
            builder.push(" ").push(condition.operator).push(" ");
            builder.push_bind(pattern.clone());
        }
        // Unknown for every row, as in memory
        (FilterOperator::Like | FilterOperator::ILike, FilterValue::Null) => {
            builder.push(" ").push(condition.operator).push(" NULL");
        }
        (FilterOperator::In, FilterValue::Null) => {
            builder.push(" IN (NULL)");
        }
        (FilterOperator::In | FilterOperator::Like | FilterOperator::ILike, _) => {
            return Err(mismatch());
        }
        (operator, value) => {
            builder.push(" ").push(operator).push(" ");
            match value {
                FilterValue::String(v) => {
                    builder.push_bind(v.clone());
                }
                FilterValue::Integer(v) => {
                    builder.push_bind(*v);
                }
                FilterValue::Float(v) => {
                    builder.push_bind(*v);
                }
                FilterValue::Boolean(v) => {
                    builder.push_bind(*v);
                }
                // Comparing with NULL is never true, as in memory
                FilterValue::Null => {
                    builder.push("NULL");
                }
                FilterValue::StringList(_) | FilterValue::IntegerList(_) => {
                    return Err(mismatch());
                }
            }
        }
    }
    Ok(())
}
