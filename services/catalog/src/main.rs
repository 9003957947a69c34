//! Catalog service binary
//!
//! Loads configuration, then prints the catalog listing as JSON. Uses
//! PostgreSQL when built with the `database` feature and `database.url` is
//! configured; otherwise serves the bundled seed data from memory.

use catalog::{
    memory_catalog, CatalogService, Product, ProductBrand, ProductSpecParams, ProductType,
    Result, SeedData,
};
use spec_repository::config::Config;
use spec_repository::observability::{init_tracing, shutdown_tracing};
use spec_repository::GenericRepository;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_for_service("catalog")?;
    init_tracing(&config)?;

    let outcome = run(&config).await;
    if let Err(ref e) = outcome {
        tracing::error!(error = %e, "Catalog run failed");
    }

    shutdown_tracing();
    outcome
}

async fn run(config: &Config) -> Result<()> {
    #[cfg(feature = "database")]
    {
        if let Some(database) = &config.database {
            let pool = spec_repository::database::create_pool(database).await?;
            let service = catalog::postgres::pg_catalog(pool).with_limits(config.query);
            return report(&service).await;
        }
    }

    let catalog = memory_catalog(&SeedData::builtin()?).with_limits(config.query);
    report(&catalog).await
}

async fn report<P, B, T>(catalog: &CatalogService<P, B, T>) -> Result<()>
where
    P: GenericRepository<Product>,
    B: GenericRepository<ProductBrand>,
    T: GenericRepository<ProductType>,
{
    let (brands, types) = futures::try_join!(catalog.brands(), catalog.types())?;
    let page = catalog.products_page(&ProductSpecParams::default()).await?;

    tracing::info!(
        brands = brands.len(),
        types = types.len(),
        products = page.total,
        "Catalog loaded"
    );

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
