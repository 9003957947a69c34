//! Filter, ordering and paging primitives
//!
//! These are the building blocks of a [`Specification`](super::Specification):
//! field-level filter conditions, sort direction and the paging window.
//!
//! # Example
//!
//! ```rust
//! use spec_repository::{FilterCondition, OrderDirection, Pagination};
//!
//! let window = Pagination::page(3, 20);
//! assert_eq!(window.offset, 40);
//!
//! let filters = vec![
//!     FilterCondition::eq("status", "active"),
//!     FilterCondition::gte("price_cents", 1_000_i64),
//! ];
//! assert_eq!(filters.len(), 2);
//! assert_eq!(OrderDirection::Descending.as_sql(), "DESC");
//! ```

use std::fmt;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl OrderDirection {
    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Paging window: skip `offset` results, then return at most `limit`
///
/// # Example
///
/// ```rust
/// use spec_repository::Pagination;
///
/// let first = Pagination::first_page(20);
/// assert_eq!((first.offset, first.limit), (0, 20));
///
/// let third = Pagination::page(3, 20);
/// assert_eq!((third.offset, third.limit), (40, 20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create a paging window from an offset and a limit
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// The first `limit` results
    #[must_use]
    pub const fn first_page(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// Window for a 1-indexed page number; page 0 is treated as page 1
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Case-sensitive pattern match (LIKE)
    Like,
    /// Case-insensitive pattern match (ILIKE)
    ILike,
    /// Value is in a list (IN)
    In,
    /// Value is null (IS NULL)
    IsNull,
    /// Value is not null (IS NOT NULL)
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::ILike => write!(f, "ILIKE"),
            Self::In => write!(f, "IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A value a field is compared against
///
/// # Example
///
/// ```rust
/// use spec_repository::FilterValue;
///
/// let name: FilterValue = "Angular".into();
/// let id: FilterValue = 7_i32.into();
/// assert_eq!(id, FilterValue::Integer(7));
/// assert!(matches!(name, FilterValue::String(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of string values (for IN operator)
    StringList(Vec<String>),
    /// List of integer values (for IN operator)
    IntegerList(Vec<i64>),
    /// Null value (for IS NULL / IS NOT NULL)
    Null,
}

impl FilterValue {
    /// Whether this is [`FilterValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A single comparison between a named field and a value
///
/// # Example
///
/// ```rust
/// use spec_repository::{FilterCondition, FilterOperator};
///
/// let by_brand = FilterCondition::eq("product_brand_id", 3_i32);
/// assert_eq!(by_brand.operator, FilterOperator::Equal);
///
/// let search = FilterCondition::contains_ignore_case("name", "50%");
/// assert_eq!(search.operator, FilterOperator::ILike);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// `field LIKE pattern` (`%` and `_` wildcards, `\` escapes)
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// `field ILIKE pattern`
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::ILike, FilterValue::String(pattern.into()))
    }

    /// Case-insensitive substring match; wildcards in `text` are matched literally
    pub fn contains_ignore_case(field: impl Into<String>, text: &str) -> Self {
        Self::ilike(field, format!("%{}%", escape_like(text)))
    }

    /// `field IN (values...)` for strings
    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::StringList(values))
    }

    /// `field IN (values...)` for integers
    pub fn in_integers(field: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::IntegerList(values))
    }

    /// `field IS NULL`
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }
}

/// Escape LIKE wildcards so `text` matches itself
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_display() {
        assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
        assert_eq!(format!("{}", OrderDirection::Descending), "desc");
        assert_eq!(OrderDirection::Ascending.as_sql(), "ASC");
    }

    #[test]
    fn test_order_direction_default() {
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
    }

    #[test]
    fn test_pagination_page() {
        assert_eq!(Pagination::page(1, 20), Pagination::new(0, 20));
        assert_eq!(Pagination::page(3, 20), Pagination::new(40, 20));
    }

    #[test]
    fn test_pagination_page_zero_handling() {
        assert_eq!(Pagination::page(0, 20).offset, 0);
    }

    #[test]
    fn test_pagination_page_saturates() {
        assert_eq!(Pagination::page(u64::MAX, u64::MAX).offset, u64::MAX);
    }

    #[test]
    fn test_pagination_default() {
        assert_eq!(Pagination::default(), Pagination::first_page(20));
    }

    #[test]
    fn test_filter_operator_display() {
        assert_eq!(format!("{}", FilterOperator::Equal), "=");
        assert_eq!(format!("{}", FilterOperator::NotEqual), "!=");
        assert_eq!(format!("{}", FilterOperator::GreaterThanOrEqual), ">=");
        assert_eq!(format!("{}", FilterOperator::Like), "LIKE");
        assert_eq!(format!("{}", FilterOperator::ILike), "ILIKE");
        assert_eq!(format!("{}", FilterOperator::In), "IN");
        assert_eq!(format!("{}", FilterOperator::IsNotNull), "IS NOT NULL");
    }

    #[test]
    fn test_filter_value_conversions() {
        assert_eq!(FilterValue::from("a"), FilterValue::String("a".into()));
        assert_eq!(FilterValue::from(42_i32), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(42_u32), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(1.5_f64), FilterValue::Float(1.5));
        assert_eq!(FilterValue::from(true), FilterValue::Boolean(true));
        assert_eq!(
            FilterValue::from(vec![1_i64, 2]),
            FilterValue::IntegerList(vec![1, 2])
        );
    }

    #[test]
    fn test_filter_value_from_option() {
        assert_eq!(FilterValue::from(None::<i32>), FilterValue::Null);
        assert_eq!(FilterValue::from(Some("x")), FilterValue::String("x".into()));
        assert!(FilterValue::from(None::<String>).is_null());
    }

    #[test]
    fn test_filter_condition_constructors() {
        assert_eq!(FilterCondition::ne("a", 1_i64).operator, FilterOperator::NotEqual);
        assert_eq!(FilterCondition::gt("a", 1_i64).operator, FilterOperator::GreaterThan);
        assert_eq!(FilterCondition::lt("a", 1_i64).operator, FilterOperator::LessThan);
        assert_eq!(
            FilterCondition::lte("a", 1_i64).operator,
            FilterOperator::LessThanOrEqual
        );
        assert_eq!(
            FilterCondition::in_integers("a", vec![1]).value,
            FilterValue::IntegerList(vec![1])
        );
        assert_eq!(
            FilterCondition::in_strings("a", vec!["x".into()]).value,
            FilterValue::StringList(vec!["x".into()])
        );
        assert_eq!(FilterCondition::is_null("a").value, FilterValue::Null);
    }

    #[test]
    fn test_contains_ignore_case_escapes_wildcards() {
        let filter = FilterCondition::contains_ignore_case("name", "50%_off\\");
        assert_eq!(
            filter.value,
            FilterValue::String("%50\\%\\_off\\\\%".to_string())
        );
    }

    #[test]
    fn test_escape_like_plain_text_unchanged() {
        assert_eq!(escape_like("boots"), "boots");
    }
}
