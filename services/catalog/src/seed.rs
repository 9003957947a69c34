//! Seed data and the in-memory catalog
//!
//! Seed files are JSON arrays with snake_case keys. Products refer to their
//! brand and type by id; the relations themselves are attached at query time by
//! the resolvers [`memory_catalog`] registers.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use spec_repository::store::MemoryStore;
use spec_repository::{
    Entity, RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult,
    StoreRepository,
};

use crate::entities::{Product, ProductBrand, ProductType};
use crate::error::{CatalogError, Result};
use crate::service::CatalogService;

const BRANDS_JSON: &str = include_str!("../seed/brands.json");
const TYPES_JSON: &str = include_str!("../seed/types.json");
const PRODUCTS_JSON: &str = include_str!("../seed/products.json");

/// Repository over an in-memory collection
pub type MemoryRepository<T> = StoreRepository<T, MemoryStore<T>>;

/// Catalog backed entirely by memory stores
pub type MemoryCatalog = CatalogService<
    MemoryRepository<Product>,
    MemoryRepository<ProductBrand>,
    MemoryRepository<ProductType>,
>;

/// Brands, types and products to populate a catalog with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedData {
    pub brands: Vec<ProductBrand>,
    pub types: Vec<ProductType>,
    pub products: Vec<Product>,
}

impl SeedData {
    /// Parse and validate seed JSON
    ///
    /// # Errors
    ///
    /// Malformed JSON, duplicate ids, or products referencing a missing brand
    /// or type.
    pub fn from_json(brands: &str, types: &str, products: &str) -> Result<Self> {
        let seed = Self {
            brands: parse("brand", brands)?,
            types: parse("type", types)?,
            products: parse("product", products)?,
        };
        seed.validate()?;

        tracing::debug!(
            brands = seed.brands.len(),
            types = seed.types.len(),
            products = seed.products.len(),
            "Seed data loaded"
        );
        Ok(seed)
    }

    /// The seed files bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BRANDS_JSON, TYPES_JSON, PRODUCTS_JSON)
    }

    fn validate(&self) -> Result<()> {
        let brand_ids = unique_ids("brand", self.brands.iter().map(|b| b.id))?;
        let type_ids = unique_ids("type", self.types.iter().map(|t| t.id))?;
        unique_ids("product", self.products.iter().map(|p| p.id))?;

        for product in &self.products {
            if !brand_ids.contains(&product.product_brand_id) {
                return Err(CatalogError::DanglingReference {
                    product: product.id,
                    relation: "brand",
                    id: product.product_brand_id,
                });
            }
            if !type_ids.contains(&product.product_type_id) {
                return Err(CatalogError::DanglingReference {
                    product: product.id,
                    relation: "type",
                    id: product.product_type_id,
                });
            }
        }
        Ok(())
    }
}

fn parse<T: DeserializeOwned>(kind: &'static str, json: &str) -> Result<Vec<T>> {
    serde_json::from_str(json).map_err(|source| CatalogError::SeedParse { kind, source })
}

fn unique_ids(kind: &'static str, ids: impl Iterator<Item = i32>) -> Result<HashSet<i32>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId { kind, id });
        }
    }
    Ok(seen)
}

/// Build a catalog over memory stores holding `seed`
///
/// Product includes resolve against the brand and type stores at query time.
pub fn memory_catalog(seed: &SeedData) -> MemoryCatalog {
    let brands = MemoryStore::new(seed.brands.clone());
    let types = MemoryStore::new(seed.types.clone());
    let products = MemoryStore::new(seed.products.clone())
        .with_relation(
            Product::BRAND_RELATION,
            resolver(
                brands.clone(),
                |product: &Product| product.product_brand_id,
                |product, brand| product.product_brand = Some(brand),
            ),
        )
        .with_relation(
            Product::TYPE_RELATION,
            resolver(
                types.clone(),
                |product: &Product| product.product_type_id,
                |product, kind| product.product_type = Some(kind),
            ),
        );

    CatalogService::new(
        StoreRepository::new(products),
        StoreRepository::new(brands),
        StoreRepository::new(types),
    )
}

fn resolver<R, K, A>(
    store: MemoryStore<R>,
    key: K,
    attach: A,
) -> impl Fn(&mut [Product]) -> RepositoryResult<()> + Send + Sync + 'static
where
    R: Entity<Id = i32>,
    K: Fn(&Product) -> i32 + Send + Sync + 'static,
    A: Fn(&mut Product, R) + Send + Sync + 'static,
{
    move |rows: &mut [Product]| {
        let related: HashMap<i32, R> = store
            .snapshot()
            .iter()
            .map(|entity| (*entity.id(), entity.clone()))
            .collect();

        for row in rows.iter_mut() {
            let id = key(row);
            let entity = related.get(&id).cloned().ok_or_else(|| {
                RepositoryError::new(
                    RepositoryOperation::LoadRelation,
                    RepositoryErrorKind::RelationLoad,
                    format!("{} {} not found", R::ENTITY_TYPE, id),
                )
                .with_entity(Product::ENTITY_TYPE, row.id.to_string())
            })?;
            attach(row, entity);
        }
        Ok(())
    }
}
