//! PostgreSQL bindings for the catalog
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE product_brands (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
//! CREATE TABLE product_types (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
//! CREATE TABLE products (
//!     id INTEGER PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     description TEXT NOT NULL,
//!     price_cents BIGINT NOT NULL,
//!     picture_url TEXT NOT NULL,
//!     product_type_id INTEGER NOT NULL REFERENCES product_types (id),
//!     product_brand_id INTEGER NOT NULL REFERENCES product_brands (id)
//! );
//! ```

use std::collections::{BTreeSet, HashMap};

use spec_repository::store::{PgEntity, PgStore};
use spec_repository::{
    Entity, Include, RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult,
    StoreRepository,
};
use sqlx::PgPool;

use crate::entities::{Product, ProductBrand, ProductType};
use crate::service::CatalogService;

/// Repository over a PostgreSQL table
pub type PgRepository<T> = StoreRepository<T, PgStore<T>>;

/// Catalog backed by PostgreSQL
pub type PgCatalog =
    CatalogService<PgRepository<Product>, PgRepository<ProductBrand>, PgRepository<ProductType>>;

/// Build a catalog whose three repositories share `pool`
pub fn pg_catalog(pool: PgPool) -> PgCatalog {
    CatalogService::new(
        StoreRepository::new(PgStore::new(pool.clone())),
        StoreRepository::new(PgStore::new(pool.clone())),
        StoreRepository::new(PgStore::new(pool)),
    )
}

impl PgEntity for ProductBrand {
    const TABLE: &'static str = "product_brands";
    const COLUMNS: &'static [&'static str] = &["id", "name"];
}

impl PgEntity for ProductType {
    const TABLE: &'static str = "product_types";
    const COLUMNS: &'static [&'static str] = &["id", "name"];
}

impl PgEntity for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "price_cents",
        "picture_url",
        "product_type_id",
        "product_brand_id",
    ];

    async fn load_relation(
        pool: &PgPool,
        include: &Include,
        rows: &mut [Self],
    ) -> RepositoryResult<()> {
        match include.path() {
            Self::BRAND_RELATION => {
                let brands = fetch_related::<ProductBrand>(
                    pool,
                    rows.iter().map(|p| p.product_brand_id),
                )
                .await?;
                for row in rows.iter_mut() {
                    row.product_brand = Some(lookup(&brands, row.id, row.product_brand_id)?);
                }
                Ok(())
            }
            Self::TYPE_RELATION => {
                let types =
                    fetch_related::<ProductType>(pool, rows.iter().map(|p| p.product_type_id))
                        .await?;
                for row in rows.iter_mut() {
                    row.product_type = Some(lookup(&types, row.id, row.product_type_id)?);
                }
                Ok(())
            }
            other => Err(RepositoryError::relation_load(Self::ENTITY_TYPE, other)),
        }
    }
}

/// Load every `R` whose id is in `ids` with one `= ANY($1)` query
async fn fetch_related<R>(
    pool: &PgPool,
    ids: impl Iterator<Item = i32>,
) -> RepositoryResult<HashMap<i32, R>>
where
    R: PgEntity<Id = i32>,
{
    let ids: Vec<i32> = ids.collect::<BTreeSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let columns: Vec<String> = R::COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
    let sql = format!(
        r#"SELECT {} FROM {} WHERE "{}" = ANY($1)"#,
        columns.join(", "),
        R::TABLE,
        R::ID_FIELD
    );
    let related: Vec<R> = sqlx::query_as(&sql)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::LoadRelation))?;

    Ok(related
        .into_iter()
        .map(|entity| (*entity.id(), entity))
        .collect())
}

fn lookup<R: Entity<Id = i32>>(
    related: &HashMap<i32, R>,
    product_id: i32,
    id: i32,
) -> RepositoryResult<R> {
    related.get(&id).cloned().ok_or_else(|| {
        RepositoryError::new(
            RepositoryOperation::LoadRelation,
            RepositoryErrorKind::RelationLoad,
            format!("{} {} not found", R::ENTITY_TYPE, id),
        )
        .with_entity(Product::ENTITY_TYPE, product_id.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specifications::{products_matching, ProductSpecParams};
    use spec_repository::config::QueryConfig;
    use spec_repository::{SpecificationEvaluator, Store};

    #[tokio::test]
    async fn test_listing_sql() {
        let pool = PgPool::connect_lazy("postgres://localhost/catalog").unwrap();
        let catalog = pg_catalog(pool);

        let params = ProductSpecParams {
            brand_id: Some(2),
            search: Some("board".into()),
            page_index: 2,
            page_size: Some(5),
            ..ProductSpecParams::default()
        };
        let spec = products_matching(&params, &QueryConfig::default());
        let store = catalog.product_repository().store();
        let query = SpecificationEvaluator::get_query(store.query(), &spec);

        assert_eq!(
            query.select().to_sql().unwrap(),
            r#"SELECT "id", "name", "description", "price_cents", "picture_url", "product_type_id", "product_brand_id" FROM products WHERE ("product_brand_id" = $1 AND "name" ILIKE $2) ORDER BY "name" ASC OFFSET $3 LIMIT $4"#
        );
        assert_eq!(query.select().includes().len(), 2);
    }

    #[test]
    fn test_lookup_reports_missing_relation() {
        let brands = HashMap::from([(
            1,
            ProductBrand {
                id: 1,
                name: "Northwind".into(),
            },
        )]);
        assert_eq!(lookup(&brands, 7, 1).unwrap().name, "Northwind");

        let err = lookup(&brands, 7, 3).unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::RelationLoad);
        assert_eq!(err.entity_id.as_deref(), Some("7"));
    }
}
