//! Criteria trees, sort keys and relation includes
//!
//! All three are plain data so that any store can interpret them: the
//! in-memory store walks them against [`Record`](crate::Record) fields and the
//! PostgreSQL store renders them into SQL.

use std::fmt;
use std::ops::Not;

use super::filter::FilterCondition;

/// Boolean filter expression over named fields
///
/// An empty `And` matches everything and an empty `Or` matches nothing.
///
/// # Example
///
/// ```rust
/// use spec_repository::{Criteria, FilterCondition};
///
/// let criteria = Criteria::from(FilterCondition::eq("product_brand_id", 1_i32))
///     .and(FilterCondition::gte("price_cents", 1_000_i64))
///     .and(!Criteria::from(FilterCondition::is_null("picture_url")));
///
/// assert_eq!(criteria.fields(), vec!["product_brand_id", "price_cents", "picture_url"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// A single field comparison
    Condition(FilterCondition),
    /// All children must match
    And(Vec<Criteria>),
    /// At least one child must match
    Or(Vec<Criteria>),
    /// The child must not match
    Not(Box<Criteria>),
}

impl Criteria {
    /// Conjunction of all `items`
    pub fn all(items: impl IntoIterator<Item = impl Into<Criteria>>) -> Self {
        Self::And(items.into_iter().map(Into::into).collect())
    }

    /// Disjunction of all `items`
    pub fn any(items: impl IntoIterator<Item = impl Into<Criteria>>) -> Self {
        Self::Or(items.into_iter().map(Into::into).collect())
    }

    /// `self AND other`, flattening nested conjunctions
    #[must_use]
    pub fn and(self, other: impl Into<Criteria>) -> Self {
        let other = other.into();
        match (self, other) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, Self::And(mut right)) => {
                right.insert(0, left);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// `self OR other`, flattening nested disjunctions
    #[must_use]
    pub fn or(self, other: impl Into<Criteria>) -> Self {
        let other = other.into();
        match (self, other) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, Self::Or(mut right)) => {
                right.insert(0, left);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Every field name referenced by this tree, in traversal order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Condition(condition) => out.push(condition.field.as_str()),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_fields(out);
                }
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl From<FilterCondition> for Criteria {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

impl Not for Criteria {
    type Output = Criteria;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// Name of the field results are sorted by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey(String);

impl SortKey {
    /// Create a sort key for `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }

    /// The field name
    pub fn field(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SortKey {
    fn from(field: &str) -> Self {
        Self::new(field)
    }
}

impl From<String> for SortKey {
    fn from(field: String) -> Self {
        Self(field)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A relation to eager-load, as a dot-separated navigation path
///
/// # Example
///
/// ```rust
/// use spec_repository::Include;
///
/// let nested = Include::new("order").then("items");
/// assert_eq!(nested.path(), "order.items");
/// assert_eq!(nested.segments().collect::<Vec<_>>(), vec!["order", "items"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Include {
    path: String,
}

impl Include {
    /// Include the relation at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Navigate one level further from this relation
    #[must_use]
    pub fn then(mut self, relation: &str) -> Self {
        self.path.push('.');
        self.path.push_str(relation);
        self
    }

    /// The full navigation path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments from the root relation outwards
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

impl From<&str> for Include {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Include {
    fn from(path: String) -> Self {
        Self { path }
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
