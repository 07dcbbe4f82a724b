use async_trait::async_trait;
use common::pagination::PageWindow;
use tokio_util::sync::CancellationToken;

use super::domain::{Product, ProductFilter};
use crate::errors::ServiceError;

/// Repository abstraction for product persistence.
///
/// Implementations own the soft-delete mechanics: deleted products must be
/// invisible to every lookup and to `search`, but are not physically removed.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_by_id(&self, id: &str, ct: &CancellationToken) -> Result<Option<Product>, ServiceError>;
    async fn get_by_sku(&self, sku: &str, ct: &CancellationToken) -> Result<Option<Product>, ServiceError>;
    /// Persist a new product. A live product with the same SKU yields `ServiceError::Conflict`.
    async fn create(&self, product: Product, ct: &CancellationToken) -> Result<Product, ServiceError>;
    async fn update(&self, product: Product, ct: &CancellationToken) -> Result<Product, ServiceError>;
    async fn soft_delete(&self, id: &str, ct: &CancellationToken) -> Result<(), ServiceError>;
    /// Items of the requested page plus the total number of matches across all pages.
    async fn search(
        &self,
        filter: &ProductFilter,
        window: PageWindow,
        ct: &CancellationToken,
    ) -> Result<(Vec<Product>, u64), ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Stored {
        product: Product,
        deleted: bool,
    }

    /// Snapshot of how often each repository method was called.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct RepoCalls {
        pub get_by_id: usize,
        pub get_by_sku: usize,
        pub create: usize,
        pub update: usize,
        pub soft_delete: usize,
        pub search: usize,
    }

    impl RepoCalls {
        pub fn total(&self) -> usize {
            self.get_by_id + self.get_by_sku + self.create + self.update + self.soft_delete + self.search
        }
    }

    #[derive(Default)]
    struct Counters {
        get_by_id: AtomicUsize,
        get_by_sku: AtomicUsize,
        create: AtomicUsize,
        update: AtomicUsize,
        soft_delete: AtomicUsize,
        search: AtomicUsize,
    }

    #[derive(Default)]
    pub struct InMemoryProductRepository {
        rows: DashMap<String, Stored>, // key: product id
        counters: Counters,
        failing: AtomicBool,
    }

    impl InMemoryProductRepository {
        /// Insert a product directly, bypassing call counters and SKU checks.
        pub fn seed(&self, product: Product) {
            self.rows.insert(product.id.clone(), Stored { product, deleted: false });
        }

        /// Stored state including soft-deleted rows.
        pub fn stored(&self, id: &str) -> Option<Product> {
            self.rows.get(id).map(|r| r.product.clone())
        }

        pub fn is_soft_deleted(&self, id: &str) -> bool {
            self.rows.get(id).is_some_and(|r| r.deleted)
        }

        pub fn calls(&self) -> RepoCalls {
            let c = &self.counters;
            RepoCalls {
                get_by_id: c.get_by_id.load(Ordering::SeqCst),
                get_by_sku: c.get_by_sku.load(Ordering::SeqCst),
                create: c.create.load(Ordering::SeqCst),
                update: c.update.load(Ordering::SeqCst),
                soft_delete: c.soft_delete.load(Ordering::SeqCst),
                search: c.search.load(Ordering::SeqCst),
            }
        }

        /// Make every subsequent call fail with `ServiceError::Db`.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn enter(&self, counter: &AtomicUsize) -> Result<(), ServiceError> {
            counter.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::Db("simulated database outage".into()));
            }
            Ok(())
        }

        fn live(&self, id: &str) -> Option<Product> {
            self.rows.get(id).filter(|r| !r.deleted).map(|r| r.product.clone())
        }
    }

    #[async_trait]
    impl ProductRepository for InMemoryProductRepository {
        async fn get_by_id(&self, id: &str, _ct: &CancellationToken) -> Result<Option<Product>, ServiceError> {
            self.enter(&self.counters.get_by_id)?;
            Ok(self.live(id))
        }

        async fn get_by_sku(&self, sku: &str, _ct: &CancellationToken) -> Result<Option<Product>, ServiceError> {
            self.enter(&self.counters.get_by_sku)?;
            Ok(self
                .rows
                .iter()
                .find(|r| !r.deleted && r.product.sku == sku)
                .map(|r| r.product.clone()))
        }

        async fn create(&self, product: Product, _ct: &CancellationToken) -> Result<Product, ServiceError> {
            self.enter(&self.counters.create)?;
            if self.rows.iter().any(|r| !r.deleted && r.product.sku == product.sku) {
                return Err(ServiceError::Conflict(format!("sku {} already in use", product.sku)));
            }
            if self.rows.contains_key(&product.id) {
                return Err(ServiceError::Conflict(format!("id {} already in use", product.id)));
            }
            self.rows.insert(product.id.clone(), Stored { product: product.clone(), deleted: false });
            Ok(product)
        }

        async fn update(&self, product: Product, _ct: &CancellationToken) -> Result<Product, ServiceError> {
            self.enter(&self.counters.update)?;
            match self.rows.get_mut(&product.id) {
                Some(mut row) if !row.deleted => {
                    row.product = product.clone();
                    Ok(product)
                }
                _ => Err(ServiceError::Db(format!("product {} not updated", product.id))),
            }
        }

        async fn soft_delete(&self, id: &str, _ct: &CancellationToken) -> Result<(), ServiceError> {
            self.enter(&self.counters.soft_delete)?;
            if let Some(mut row) = self.rows.get_mut(id) {
                row.deleted = true;
            }
            Ok(())
        }

        async fn search(
            &self,
            filter: &ProductFilter,
            window: PageWindow,
            _ct: &CancellationToken,
        ) -> Result<(Vec<Product>, u64), ServiceError> {
            self.enter(&self.counters.search)?;
            let mut matched: Vec<Product> = self
                .rows
                .iter()
                .filter(|r| !r.deleted && filter.matches(&r.product))
                .map(|r| r.product.clone())
                .collect();
            // newest first, id as tie-breaker; same order as the sea-orm adapter
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
            let total = matched.len() as u64;
            let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
            let limit = usize::try_from(window.page_size).unwrap_or(usize::MAX);
            let items = matched.into_iter().skip(offset).take(limit).collect();
            Ok((items, total))
        }
    }
}
