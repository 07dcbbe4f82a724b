use std::sync::Arc;

use chrono::Utc;
use common::pagination::{PageLimits, PageWindow, PagedResult};
use configs::ProductServiceOptions;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::domain::{cache_key, CreateProductRequest, Product, ProductSearchRequest, UpdateProductRequest};
use super::repository::ProductRepository;
use super::validation::{join_violations, CreateProductValidator, UpdateProductValidator, Validator};
use crate::cache::Cache;
use crate::cancel::with_cancel;
use crate::errors::{Cancelled, ErrorCode, ServiceCall, ServiceError};
use crate::outcome::Outcome;

/// Product catalog service: cache-aside reads, paged search and validated writes.
///
/// Every operation resolves to an `Outcome`; collaborator faults are logged and
/// reported as `INTERNAL_ERROR`. Only cancellation surfaces as `Err(Cancelled)`.
pub struct ProductService<R, C>
where
    R: ProductRepository,
    C: Cache<Product>,
{
    repo: Arc<R>,
    cache: Arc<C>,
    create_validator: Arc<dyn Validator<CreateProductRequest>>,
    update_validator: Arc<dyn Validator<UpdateProductRequest>>,
    options: ProductServiceOptions,
}

impl<R, C> Clone for ProductService<R, C>
where
    R: ProductRepository,
    C: Cache<Product>,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            cache: self.cache.clone(),
            create_validator: self.create_validator.clone(),
            update_validator: self.update_validator.clone(),
            options: self.options.clone(),
        }
    }
}

impl<R, C> ProductService<R, C>
where
    R: ProductRepository,
    C: Cache<Product>,
{
    /// Service with the default create/update rules.
    pub fn new(repo: Arc<R>, cache: Arc<C>, options: ProductServiceOptions) -> Self {
        Self::with_validators(
            repo,
            cache,
            Arc::new(CreateProductValidator),
            Arc::new(UpdateProductValidator),
            options,
        )
    }

    pub fn with_validators(
        repo: Arc<R>,
        cache: Arc<C>,
        create_validator: Arc<dyn Validator<CreateProductRequest>>,
        update_validator: Arc<dyn Validator<UpdateProductRequest>>,
        options: ProductServiceOptions,
    ) -> Self {
        debug!(
            cache_duration_secs = options.cache_duration_secs,
            default_page_size = options.default_page_size,
            max_page_size = options.max_page_size,
            enable_enrichment = options.enable_enrichment,
            "product_service_configured"
        );
        Self { repo, cache, create_validator, update_validator, options }
    }

    /// Fetch a live product, serving from cache when possible.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use rust_decimal::Decimal;
    /// use tokio_util::sync::CancellationToken;
    /// use service::cache::mock::RecordingCache;
    /// use service::product::{CreateProductRequest, Product, ProductService};
    /// use service::product::repository::mock::InMemoryProductRepository;
    /// use service::ErrorCode;
    ///
    /// let svc = ProductService::new(
    ///     Arc::new(InMemoryProductRepository::default()),
    ///     Arc::new(RecordingCache::<Product>::default()),
    ///     configs::ProductServiceOptions::default(),
    /// );
    /// let ct = CancellationToken::new();
    /// let req = CreateProductRequest {
    ///     name: "Widget".into(),
    ///     sku: "ABC-1".into(),
    ///     description: None,
    ///     price: Decimal::new(1999, 2),
    ///     category_id: 3,
    /// };
    /// let created = tokio_test::block_on(svc.create(&req, &ct)).unwrap().into_value().unwrap();
    /// let found = tokio_test::block_on(svc.get_by_id(&created.id, &ct)).unwrap();
    /// assert_eq!(found.value().map(|p| p.sku.as_str()), Some("ABC-1"));
    ///
    /// let missing = tokio_test::block_on(svc.get_by_id("nope", &ct)).unwrap();
    /// assert_eq!(missing.error_code(), Some(ErrorCode::NotFound));
    /// ```
    #[instrument(skip(self, id, ct), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: &str, ct: &CancellationToken) -> ServiceCall<Product> {
        if id.trim().is_empty() {
            return Ok(blank_id());
        }
        settle(self.load(id, ct).await, "retrieving the product")
    }

    async fn load(&self, id: &str, ct: &CancellationToken) -> Result<Outcome<Product>, ServiceError> {
        let key = cache_key(id);
        if let Some(hit) = with_cancel(ct, self.cache.get(&key, ct)).await? {
            debug!(%key, "cache_hit");
            return Ok(Outcome::success(hit));
        }
        debug!(%key, "cache_miss");

        let Some(product) = with_cancel(ct, self.repo.get_by_id(id, ct)).await? else {
            warn!("product_not_found");
            return Ok(not_found(id));
        };
        with_cancel(ct, self.cache.set(&key, product.clone(), self.options.cache_duration(), ct)).await?;
        Ok(Outcome::success(product))
    }

    /// Page through live products matching the request filters. Results are never cached.
    #[instrument(skip(self, request, ct), fields(page = ?request.page, page_size = ?request.page_size))]
    pub async fn search(&self, request: &ProductSearchRequest, ct: &CancellationToken) -> ServiceCall<PagedResult<Product>> {
        let limits = PageLimits {
            default_page_size: self.options.default_page_size,
            max_page_size: self.options.max_page_size,
        };
        let window = PageWindow::clamp(request.page, request.page_size, limits);
        let filter = request.filter();
        let res = with_cancel(ct, self.repo.search(&filter, window, ct))
            .await
            .map(|(items, total)| {
                debug!(total, returned = items.len(), page = window.page, "search_done");
                Outcome::success(PagedResult::new(items, total, window))
            });
        settle(res, "searching products")
    }

    /// Validate and persist a new product. SKUs are unique among live products.
    #[instrument(skip(self, request, ct), fields(sku = %request.sku))]
    pub async fn create(&self, request: &CreateProductRequest, ct: &CancellationToken) -> ServiceCall<Product> {
        settle(self.create_inner(request, ct).await, "creating the product")
    }

    async fn create_inner(&self, request: &CreateProductRequest, ct: &CancellationToken) -> Result<Outcome<Product>, ServiceError> {
        if let Some(message) = check(self.create_validator.as_ref(), request, ct).await? {
            return Ok(Outcome::coded(ErrorCode::ValidationError, message));
        }
        if with_cancel(ct, self.repo.get_by_sku(&request.sku, ct)).await?.is_some() {
            warn!("duplicate_sku");
            return Ok(duplicate_sku(&request.sku));
        }

        let product = Product::from_request(request, Utc::now());
        match with_cancel(ct, self.repo.create(product, ct)).await {
            Ok(created) => {
                info!(product_id = %created.id, "product_created");
                Ok(Outcome::success(created))
            }
            // lost a race against a concurrent create; storage still holds the key unique
            Err(ServiceError::Conflict(detail)) => {
                warn!(%detail, "duplicate_sku");
                Ok(duplicate_sku(&request.sku))
            }
            Err(e) => Err(e),
        }
    }

    /// Merge the present fields of `request` into the stored product and drop its cache entry.
    #[instrument(skip(self, id, request, ct), fields(product_id = %id))]
    pub async fn update(&self, id: &str, request: &UpdateProductRequest, ct: &CancellationToken) -> ServiceCall<Product> {
        if id.trim().is_empty() {
            return Ok(blank_id());
        }
        settle(self.update_inner(id, request, ct).await, "updating the product")
    }

    async fn update_inner(
        &self,
        id: &str,
        request: &UpdateProductRequest,
        ct: &CancellationToken,
    ) -> Result<Outcome<Product>, ServiceError> {
        if let Some(message) = check(self.update_validator.as_ref(), request, ct).await? {
            return Ok(Outcome::coded(ErrorCode::ValidationError, message));
        }
        let Some(mut product) = with_cancel(ct, self.repo.get_by_id(id, ct)).await? else {
            warn!("product_not_found");
            return Ok(not_found(id));
        };

        product.apply(request, Utc::now());
        let updated = with_cancel(ct, self.repo.update(product, ct)).await?;
        with_cancel(ct, self.cache.remove(&cache_key(id), ct)).await?;
        info!("product_updated");
        Ok(Outcome::success(updated))
    }

    /// Soft-delete a live product and drop its cache entry.
    #[instrument(skip(self, id, ct), fields(product_id = %id))]
    pub async fn delete(&self, id: &str, ct: &CancellationToken) -> ServiceCall<bool> {
        if id.trim().is_empty() {
            return Ok(blank_id());
        }
        settle(self.delete_inner(id, ct).await, "deleting the product")
    }

    async fn delete_inner(&self, id: &str, ct: &CancellationToken) -> Result<Outcome<bool>, ServiceError> {
        if with_cancel(ct, self.repo.get_by_id(id, ct)).await?.is_none() {
            warn!("product_not_found");
            return Ok(not_found(id));
        }
        with_cancel(ct, self.repo.soft_delete(id, ct)).await?;
        with_cancel(ct, self.cache.remove(&cache_key(id), ct)).await?;
        info!("product_deleted");
        Ok(Outcome::success(true))
    }
}

/// Run a validator under the token; `Some(message)` when the input is rejected.
async fn check<T>(validator: &dyn Validator<T>, input: &T, ct: &CancellationToken) -> Result<Option<String>, ServiceError>
where
    T: Send + Sync,
{
    let violations = with_cancel(ct, async { Ok::<_, ServiceError>(validator.validate(input).await) }).await?;
    if violations.is_empty() {
        return Ok(None);
    }
    debug!(count = violations.len(), "validation_failed");
    Ok(Some(join_violations(&violations)))
}

/// Map a collaborator fault onto the caller-facing result.
fn settle<T>(res: Result<Outcome<T>, ServiceError>, action: &str) -> ServiceCall<T> {
    match res {
        Ok(outcome) => Ok(outcome),
        Err(ServiceError::Cancelled) => {
            debug!(action, "operation_cancelled");
            Err(Cancelled)
        }
        Err(e) => {
            error!(error = %e, action, "product_service_fault");
            Ok(Outcome::coded(ErrorCode::InternalError, format!("an error occurred while {action}")))
        }
    }
}

fn blank_id<T>() -> Outcome<T> {
    Outcome::coded(ErrorCode::InvalidInput, "product id is required")
}

fn not_found<T>(id: &str) -> Outcome<T> {
    Outcome::coded(ErrorCode::NotFound, format!("product '{id}' not found"))
}

fn duplicate_sku<T>(sku: &str) -> Outcome<T> {
    Outcome::coded(ErrorCode::DuplicateKey, format!("a product with sku '{sku}' already exists"))
}
