use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cache key namespace for single products.
pub const CACHE_PREFIX: &str = "product";

/// `"product:<id>"`
pub fn cache_key(id: &str) -> String {
    format!("{CACHE_PREFIX}:{id}")
}

/// Domain product (business view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// opaque id, assigned once at creation
    pub id: String,
    /// unique among live products
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Build a new product from a create request with a freshly generated id.
    pub fn from_request(request: &CreateProductRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            sku: request.sku.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            price: request.price,
            category_id: request.category_id,
            created_at: now,
            updated_at: None,
        }
    }

    /// Merge-patch: only fields present in `patch` overwrite; `updated_at` is always stamped.
    pub fn apply(&mut self, patch: &UpdateProductRequest, now: DateTime<Utc>) {
        if let Some(name) = &patch.name { self.name = name.clone(); }
        if let Some(description) = &patch.description { self.description = Some(description.clone()); }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(category_id) = patch.category_id { self.category_id = category_id; }
        self.updated_at = Some(now);
    }
}

/// Create input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: i32,
}

/// Update input; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category_id: Option<i32>,
}

/// Search input; absent filters match everything, absent paging uses configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSearchRequest {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl ProductSearchRequest {
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            search_term: self.search_term.clone(),
            category_id: self.category_id,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

/// Filters handed to the repository; paging travels separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search_term: Option<String>,
    pub category_id: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// In-memory predicate mirroring the storage query; used by the mock repository.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            if !product.name.to_lowercase().contains(&term) && !product.sku.to_lowercase().contains(&term) {
                return false;
            }
        }
        if self.category_id.is_some_and(|c| c != product.category_id) { return false; }
        if self.min_price.is_some_and(|min| product.price < min) { return false; }
        if self.max_price.is_some_and(|max| product.price > max) { return false; }
        true
    }
}
