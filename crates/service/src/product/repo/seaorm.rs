use async_trait::async_trait;
use common::pagination::PageWindow;
use models::product::{self as rows, ProductQuery};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::cancel::with_cancel;
use crate::errors::ServiceError;
use crate::product::domain::{Product, ProductFilter};
use crate::product::repository::ProductRepository;

/// SeaORM-backed repository implementation.
pub struct SeaOrmProductRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmProductRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// Prices are stored as integer cents.
fn to_minor(price: Decimal) -> Result<i64, ServiceError> {
    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.round().to_i64())
        .ok_or_else(|| ServiceError::Validation(format!("price {price} out of range")))
}

/// Which side of a price range a filter bound sits on.
#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

/// Convert a filter bound to cents without widening the range: lower bounds
/// round up, upper bounds round down, and bounds beyond `i64` saturate.
fn bound_to_minor(price: Decimal, bound: Bound) -> i64 {
    let saturated = if price.is_sign_negative() { i64::MIN } else { i64::MAX };
    let Some(cents) = price.checked_mul(Decimal::ONE_HUNDRED) else {
        return saturated;
    };
    let cents = match bound {
        Bound::Lower => cents.ceil(),
        Bound::Upper => cents.floor(),
    };
    cents.to_i64().unwrap_or(saturated)
}

fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

fn to_domain(m: rows::Model) -> Product {
    Product {
        id: m.id,
        sku: m.sku,
        name: m.name,
        description: m.description,
        price: from_minor(m.price_minor),
        category_id: m.category_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn to_row(p: Product) -> Result<rows::Model, ServiceError> {
    Ok(rows::Model {
        price_minor: to_minor(p.price)?,
        id: p.id,
        sku: p.sku,
        name: p.name,
        description: p.description,
        category_id: p.category_id,
        created_at: p.created_at,
        updated_at: p.updated_at,
        deleted_at: None,
    })
}

fn to_query(filter: &ProductFilter) -> ProductQuery {
    ProductQuery {
        term: filter.search_term.clone(),
        category_id: filter.category_id,
        min_price_minor: filter.min_price.map(|p| bound_to_minor(p, Bound::Lower)),
        max_price_minor: filter.max_price.map(|p| bound_to_minor(p, Bound::Upper)),
    }
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn get_by_id(&self, id: &str, ct: &CancellationToken) -> Result<Option<Product>, ServiceError> {
        let found = with_cancel(ct, async { rows::find_live(&self.db, id).await.map_err(ServiceError::from) }).await?;
        Ok(found.map(to_domain))
    }

    async fn get_by_sku(&self, sku: &str, ct: &CancellationToken) -> Result<Option<Product>, ServiceError> {
        let found = with_cancel(ct, async { rows::find_live_by_sku(&self.db, sku).await.map_err(ServiceError::from) }).await?;
        Ok(found.map(to_domain))
    }

    async fn create(&self, product: Product, ct: &CancellationToken) -> Result<Product, ServiceError> {
        let row = to_row(product)?;
        let created = with_cancel(ct, async { rows::insert(&self.db, row).await.map_err(ServiceError::from) }).await?;
        Ok(to_domain(created))
    }

    async fn update(&self, product: Product, ct: &CancellationToken) -> Result<Product, ServiceError> {
        let row = to_row(product)?;
        let updated = with_cancel(ct, async { rows::update(&self.db, row).await.map_err(ServiceError::from) }).await?;
        Ok(to_domain(updated))
    }

    async fn soft_delete(&self, id: &str, ct: &CancellationToken) -> Result<(), ServiceError> {
        with_cancel(ct, async { rows::soft_delete(&self.db, id).await.map_err(ServiceError::from) }).await?;
        Ok(())
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        window: PageWindow,
        ct: &CancellationToken,
    ) -> Result<(Vec<Product>, u64), ServiceError> {
        let query = to_query(filter);
        let (found, total) = with_cancel(
            ct,
            async { rows::search(&self.db, &query, window.offset(), window.page_size).await.map_err(ServiceError::from) },
        )
        .await?;
        Ok((found.into_iter().map(to_domain).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::repository::mock::InMemoryProductRepository;
    use crate::test_support::memory_db;
    use common::pagination::PageLimits;
    use chrono::{Duration, TimeZone, Utc};

    fn product(id: &str, sku: &str, name: &str, cents: i64, minutes: i64) -> Product {
        Product {
            id: id.into(),
            sku: sku.into(),
            name: name.into(),
            description: None,
            price: Decimal::new(cents, 2),
            category_id: 1,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes),
            updated_at: None,
        }
    }

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(to_minor(Decimal::new(999, 2)).unwrap(), 999);
        assert_eq!(to_minor(Decimal::new(10, 0)).unwrap(), 1000);
        assert_eq!(from_minor(999), Decimal::new(999, 2));
        assert!(to_minor(Decimal::MAX).is_err());
    }

    #[test]
    fn filter_bounds_never_widen_the_range() {
        let p = Decimal::new(10005, 3);
        assert_eq!(bound_to_minor(p, Bound::Lower), 1001);
        assert_eq!(bound_to_minor(p, Bound::Upper), 1000);
        assert_eq!(bound_to_minor(Decimal::MAX, Bound::Upper), i64::MAX);
        assert_eq!(bound_to_minor(Decimal::MIN, Bound::Lower), i64::MIN);
        assert_eq!(bound_to_minor(Decimal::new(i64::MAX, 0), Bound::Upper), i64::MAX);
    }

    #[tokio::test]
    async fn product_repository_crud() -> Result<(), anyhow::Error> {
        let repo = SeaOrmProductRepository::new(memory_db().await?);
        let ct = CancellationToken::new();

        let created = repo.create(product("p1", "ABC-1", "Widget", 1999, 0), &ct).await?;
        assert_eq!(created.price, Decimal::new(1999, 2));

        let found = repo.get_by_id("p1", &ct).await?.unwrap();
        assert_eq!(found, created);
        assert_eq!(repo.get_by_sku("ABC-1", &ct).await?.unwrap().id, "p1");

        let mut changed = found.clone();
        changed.price = Decimal::new(999, 2);
        changed.updated_at = Some(changed.created_at + Duration::minutes(1));
        let updated = repo.update(changed, &ct).await?;
        assert_eq!(updated.price, Decimal::new(999, 2));
        assert_eq!(updated.name, "Widget");

        repo.soft_delete("p1", &ct).await?;
        assert!(repo.get_by_id("p1", &ct).await?.is_none());
        assert!(repo.get_by_sku("ABC-1", &ct).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_live_sku_is_a_conflict() -> Result<(), anyhow::Error> {
        let repo = SeaOrmProductRepository::new(memory_db().await?);
        let ct = CancellationToken::new();
        repo.create(product("p1", "ABC-1", "Widget", 1999, 0), &ct).await?;
        let dup = repo.create(product("p2", "ABC-1", "Copy", 100, 1), &ct).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn search_pages_with_total() -> Result<(), anyhow::Error> {
        let repo = SeaOrmProductRepository::new(memory_db().await?);
        let ct = CancellationToken::new();
        for i in 0..5 {
            repo.create(product(&format!("p{i}"), &format!("SKU-{i}"), "Widget", 1000 + i, i), &ct).await?;
        }

        let (items, total) = repo.search(&ProductFilter::default(), PageWindow { page: 2, page_size: 2 }, &ct).await?;
        assert_eq!(total, 5);
        let ids: Vec<_> = items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p2", "p1"]);

        let filter = ProductFilter { min_price: Some(Decimal::new(1003, 2)), ..Default::default() };
        let (items, total) = repo.search(&filter, PageWindow { page: 1, page_size: 10 }, &ct).await?;
        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn far_page_returns_empty_slice_with_total() -> Result<(), anyhow::Error> {
        let repo = SeaOrmProductRepository::new(memory_db().await?);
        let ct = CancellationToken::new();
        repo.create(product("p1", "ABC-1", "Widget", 1000, 0), &ct).await?;

        let window = PageWindow::clamp(Some(i64::MAX / 10), None, PageLimits::default());
        let (items, total) = repo.search(&ProductFilter::default(), window, &ct).await?;
        assert!(items.is_empty());
        assert_eq!(total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn search_agrees_with_in_memory_filter() -> Result<(), anyhow::Error> {
        let repo = SeaOrmProductRepository::new(memory_db().await?);
        let mem = InMemoryProductRepository::default();
        let ct = CancellationToken::new();
        let plain = product("p1", "ABC-1", "Plain widget", 1000, 0);
        repo.create(plain.clone(), &ct).await?;
        mem.seed(plain);

        let cases = [
            (ProductFilter { search_term: Some("%".into()), ..Default::default() }, 0),
            (ProductFilter { search_term: Some("_".into()), ..Default::default() }, 0),
            (ProductFilter { search_term: Some("PLAIN".into()), ..Default::default() }, 1),
            (ProductFilter { min_price: Some(Decimal::new(10005, 3)), ..Default::default() }, 0),
            (ProductFilter { max_price: Some(Decimal::new(9995, 3)), ..Default::default() }, 0),
            (ProductFilter { max_price: Some(Decimal::MAX), ..Default::default() }, 1),
            (ProductFilter { min_price: Some(Decimal::MIN), ..Default::default() }, 1),
        ];
        let window = PageWindow { page: 1, page_size: 10 };
        for (filter, expected) in cases {
            let (_, sea_total) = repo.search(&filter, window, &ct).await?;
            let (_, mem_total) = mem.search(&filter, window, &ct).await?;
            assert_eq!(sea_total, expected, "{filter:?}");
            assert_eq!(mem_total, expected, "{filter:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() -> Result<(), anyhow::Error> {
        let repo = SeaOrmProductRepository::new(memory_db().await?);
        let ct = CancellationToken::new();
        ct.cancel();
        assert!(matches!(repo.get_by_id("p1", &ct).await, Err(ServiceError::Cancelled)));
        Ok(())
    }
}
