#![cfg(test)]
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use configs::ProductServiceOptions;
use migration::MigratorTrait;
use models::db::connect_sqlite_memory;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use crate::cache::mock::RecordingCache;
use crate::product::domain::Product;
use crate::product::repository::mock::InMemoryProductRepository;
use crate::product::ProductService;

/// Private in-memory database with the schema applied; each call gets its own.
pub async fn memory_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = connect_sqlite_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// A stored product created `minutes` after `base_time()`.
pub fn stored_product(id: &str, sku: &str, name: &str, cents: i64, minutes: i64) -> Product {
    Product {
        id: id.into(),
        sku: sku.into(),
        name: name.into(),
        description: None,
        price: Decimal::new(cents, 2),
        category_id: 1,
        created_at: base_time() + Duration::minutes(minutes),
        updated_at: None,
    }
}

pub type MockService = ProductService<InMemoryProductRepository, RecordingCache<Product>>;

/// Service wired to the in-memory repository and recording cache, with handles to both.
pub fn mock_service(
    options: ProductServiceOptions,
) -> (MockService, Arc<InMemoryProductRepository>, Arc<RecordingCache<Product>>) {
    let repo = Arc::new(InMemoryProductRepository::default());
    let cache = Arc::new(RecordingCache::default());
    let svc = ProductService::new(repo.clone(), cache.clone(), options);
    (svc, repo, cache)
}
