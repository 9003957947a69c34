//! Catalog read service
//!
//! The operations a storefront needs, each one a named specification handed to
//! the matching repository. Works with any repository implementation.

use serde::Serialize;
use spec_repository::config::QueryConfig;
use spec_repository::{GenericRepository, RepositoryResult};

use crate::entities::{Product, ProductBrand, ProductType};
use crate::specifications::{
    products_matching, products_matching_for_count, products_with_types_and_brands,
    products_with_types_and_brands_by_id, ProductSpecParams,
};

/// One page of a listing plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paged<T> {
    pub page_index: u64,
    pub page_size: u64,
    pub total: u64,
    pub items: Vec<T>,
}

/// Product catalog over three repositories
#[derive(Debug, Clone)]
pub struct CatalogService<P, B, T> {
    products: P,
    brands: B,
    types: T,
    limits: QueryConfig,
}

impl<P, B, T> CatalogService<P, B, T>
where
    P: GenericRepository<Product>,
    B: GenericRepository<ProductBrand>,
    T: GenericRepository<ProductType>,
{
    /// Create a service with default paging limits
    pub fn new(products: P, brands: B, types: T) -> Self {
        Self {
            products,
            brands,
            types,
            limits: QueryConfig::default(),
        }
    }

    /// Replace the paging limits
    #[must_use]
    pub fn with_limits(mut self, limits: QueryConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Every product with type and brand, ordered by name
    pub async fn products(&self) -> RepositoryResult<Vec<Product>> {
        self.products.list(&products_with_types_and_brands()).await
    }

    /// One product with type and brand; `None` if it does not exist
    pub async fn product(&self, id: i32) -> RepositoryResult<Option<Product>> {
        let product = self
            .products
            .get_entity_with_spec(&products_with_types_and_brands_by_id(id))
            .await?;
        if product.is_none() {
            tracing::debug!(product_id = id, "Product not found");
        }
        Ok(product)
    }

    /// A filtered, sorted page of products and the total matching count
    pub async fn products_page(
        &self,
        params: &ProductSpecParams,
    ) -> RepositoryResult<Paged<Product>> {
        let pagination = params.pagination(&self.limits);
        let spec = products_matching(params, &self.limits);
        let count_spec = products_matching_for_count(params);

        let (items, total) =
            futures::try_join!(self.products.list(&spec), self.products.count(&count_spec))?;

        Ok(Paged {
            page_index: params.page_index.max(1),
            page_size: pagination.limit,
            total,
            items,
        })
    }

    /// Every brand
    pub async fn brands(&self) -> RepositoryResult<Vec<ProductBrand>> {
        self.brands.list_all().await
    }

    /// Every product type
    pub async fn types(&self) -> RepositoryResult<Vec<ProductType>> {
        self.types.list_all().await
    }

    /// The product repository
    pub fn product_repository(&self) -> &P {
        &self.products
    }

    /// The brand repository
    pub fn brand_repository(&self) -> &B {
        &self.brands
    }

    /// The product type repository
    pub fn type_repository(&self) -> &T {
        &self.types
    }
}
