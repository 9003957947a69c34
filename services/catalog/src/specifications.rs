//! Named product specifications
//!
//! Each function returns a ready [`Specification<Product>`]; callers never
//! touch the builder for the standard catalog reads.

use serde::Deserialize;
use spec_repository::config::QueryConfig;
use spec_repository::{
    Criteria, FilterCondition, Pagination, Specification, SpecificationBuilder,
};

use crate::entities::Product;

/// Every product with its type and brand, ordered by name
pub fn products_with_types_and_brands() -> Specification<Product> {
    with_types_and_brands(Specification::builder())
        .add_order_by("name")
        .build()
}

/// The product with identity `id`, with its type and brand
pub fn products_with_types_and_brands_by_id(id: i32) -> Specification<Product> {
    with_types_and_brands(Specification::by_id(id)).build()
}

fn with_types_and_brands(builder: SpecificationBuilder<Product>) -> SpecificationBuilder<Product> {
    builder
        .add_include(Product::TYPE_RELATION)
        .add_include(Product::BRAND_RELATION)
}

/// Sort orders offered for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
}

/// Filters and paging for a product listing
///
/// ```rust
/// use catalog::specifications::{ProductSort, ProductSpecParams};
///
/// let params: ProductSpecParams =
///     serde_json::from_str(r#"{"brand_id": 2, "sort": "priceDesc", "page_index": 2}"#)?;
/// assert_eq!(params.sort, Some(ProductSort::PriceDesc));
/// assert_eq!(params.page_size, None);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductSpecParams {
    pub brand_id: Option<i32>,
    pub type_id: Option<i32>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
    pub sort: Option<ProductSort>,
    /// 1-indexed
    pub page_index: u64,
    /// Falls back to `query.default_page_size`; capped at `query.max_page_size`
    pub page_size: Option<u64>,
}

impl Default for ProductSpecParams {
    fn default() -> Self {
        Self {
            brand_id: None,
            type_id: None,
            search: None,
            sort: None,
            page_index: 1,
            page_size: None,
        }
    }
}

impl ProductSpecParams {
    /// Effective paging window under `limits`
    pub fn pagination(&self, limits: &QueryConfig) -> Pagination {
        Pagination::page(self.page_index.max(1), limits.page_size(self.page_size))
    }

    fn criteria(&self) -> Option<Criteria> {
        let mut conditions = Vec::new();
        if let Some(brand_id) = self.brand_id {
            conditions.push(FilterCondition::eq("product_brand_id", brand_id));
        }
        if let Some(type_id) = self.type_id {
            conditions.push(FilterCondition::eq("product_type_id", type_id));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push(FilterCondition::contains_ignore_case("name", search));
        }

        match conditions.len() {
            0 => None,
            1 => conditions.pop().map(Criteria::from),
            _ => Some(Criteria::all(conditions)),
        }
    }
}

/// One page of products matching `params`, with types and brands
pub fn products_matching(
    params: &ProductSpecParams,
    limits: &QueryConfig,
) -> Specification<Product> {
    let mut builder = Specification::builder();
    if let Some(criteria) = params.criteria() {
        builder = builder.criteria(criteria);
    }

    builder = match params.sort.unwrap_or_default() {
        ProductSort::Name => builder.add_order_by("name"),
        ProductSort::PriceAsc => builder.add_order_by("price_cents"),
        ProductSort::PriceDesc => builder.add_order_by_descending("price_cents"),
    };

    with_types_and_brands(builder)
        .apply_pagination(params.pagination(limits))
        .build()
}

/// The filters of [`products_matching`] alone, for the listing total
pub fn products_matching_for_count(params: &ProductSpecParams) -> Specification<Product> {
    match params.criteria() {
        Some(criteria) => Specification::with_criteria(criteria).build(),
        None => Specification::all(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spec_repository::{FilterOperator, FilterValue, Include, OrderDirection};

    #[test]
    fn test_products_with_types_and_brands() {
        let spec = products_with_types_and_brands();
        assert!(spec.criteria().is_none());
        assert_eq!(
            spec.includes(),
            &[Include::new("product_type"), Include::new("product_brand")]
        );
        assert_eq!(spec.order_by().map(|k| k.field()), Some("name"));
        assert!(!spec.is_paging_enabled());
    }

    #[test]
    fn test_by_id() {
        let spec = products_with_types_and_brands_by_id(7);
        assert_eq!(
            spec.criteria(),
            Some(&Criteria::from(FilterCondition::eq("id", 7_i32)))
        );
        assert_eq!(spec.includes().len(), 2);
        assert!(spec.ordering().is_none());
    }

    #[test]
    fn test_default_params() {
        let spec = products_matching(&ProductSpecParams::default(), &QueryConfig::default());
        assert!(spec.criteria().is_none());
        assert_eq!(
            spec.ordering().map(|(k, d)| (k.field(), d)),
            Some(("name", OrderDirection::Ascending))
        );
        assert_eq!((spec.skip(), spec.take()), (0, 20));
    }

    #[test]
    fn test_filters_sort_and_paging() {
        let params = ProductSpecParams {
            brand_id: Some(2),
            type_id: Some(3),
            search: Some("  Board ".into()),
            sort: Some(ProductSort::PriceDesc),
            page_index: 3,
            page_size: Some(5),
        };
        let spec = products_matching(&params, &QueryConfig::default());

        let Some(Criteria::And(parts)) = spec.criteria() else {
            panic!("expected a conjunction, got {:?}", spec.criteria());
        };
        assert_eq!(parts.len(), 3);
        let Criteria::Condition(search) = &parts[2] else {
            panic!("expected a condition");
        };
        assert_eq!(search.operator, FilterOperator::ILike);
        assert_eq!(search.value, FilterValue::String("%Board%".into()));

        assert_eq!(spec.order_by_descending().map(|k| k.field()), Some("price_cents"));
        assert_eq!((spec.skip(), spec.take()), (10, 5));
    }

    #[test]
    fn test_page_size_is_capped() {
        let params = ProductSpecParams {
            page_size: Some(1_000),
            ..ProductSpecParams::default()
        };
        let limits = QueryConfig {
            default_page_size: 6,
            max_page_size: 25,
        };
        assert_eq!(params.pagination(&limits), Pagination::new(0, 25));
        assert_eq!(ProductSpecParams::default().pagination(&limits).limit, 6);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let params = ProductSpecParams {
            search: Some("   ".into()),
            ..ProductSpecParams::default()
        };
        assert!(products_matching_for_count(&params).criteria().is_none());
    }

    #[test]
    fn test_count_spec_keeps_only_filters() {
        let params = ProductSpecParams {
            type_id: Some(1),
            page_index: 4,
            ..ProductSpecParams::default()
        };
        let count = products_matching_for_count(&params);
        let full = products_matching(&params, &QueryConfig::default());
        assert_eq!(count, full.for_count());
        assert_eq!(
            count.criteria(),
            Some(&Criteria::from(FilterCondition::eq("product_type_id", 1_i32)))
        );
    }
}
