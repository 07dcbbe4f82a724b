//! Field rules for product create/update requests.
//!
//! Fields are checked in declaration order and every failing rule of a field is
//! reported in rule order, so the violation list is stable for a given input.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::domain::{CreateProductRequest, UpdateProductRequest};

pub const NAME_MAX_LEN: usize = 200;
pub const SKU_MAX_LEN: usize = 50;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const PRICE_MAX_SCALE: u32 = 2;

/// Rule-based validation of a request; an empty list means valid.
#[async_trait]
pub trait Validator<T>: Send + Sync
where
    T: Send + Sync,
{
    async fn validate(&self, input: &T) -> Vec<String>;
}

/// Join violations into the single message carried by a `VALIDATION_ERROR`.
pub fn join_violations(violations: &[String]) -> String {
    violations.join("; ")
}

fn check_name(name: &str, out: &mut Vec<String>) {
    if name.trim().is_empty() {
        out.push("name is required".into());
    }
    if name.chars().count() > NAME_MAX_LEN {
        out.push(format!("name must not exceed {NAME_MAX_LEN} characters"));
    }
}

fn check_sku(sku: &str, out: &mut Vec<String>) {
    if sku.trim().is_empty() {
        out.push("sku is required".into());
    }
    if sku.chars().count() > SKU_MAX_LEN {
        out.push(format!("sku must not exceed {SKU_MAX_LEN} characters"));
    }
    // an empty sku does not match the pattern either
    if sku.is_empty() || !sku.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-') {
        out.push("sku may only contain upper-case letters, digits and hyphens".into());
    }
}

fn check_description(description: &str, out: &mut Vec<String>) {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        out.push(format!("description must not exceed {DESCRIPTION_MAX_LEN} characters"));
    }
}

fn check_price(price: Decimal, out: &mut Vec<String>) {
    if price <= Decimal::ZERO {
        out.push("price must be greater than 0".into());
    }
    if price.normalize().scale() > PRICE_MAX_SCALE {
        out.push(format!("price must have at most {PRICE_MAX_SCALE} decimal places"));
    }
}

fn check_category(category_id: i32, out: &mut Vec<String>) {
    if category_id <= 0 {
        out.push("category is required".into());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateProductValidator;

#[async_trait]
impl Validator<CreateProductRequest> for CreateProductValidator {
    async fn validate(&self, input: &CreateProductRequest) -> Vec<String> {
        let mut violations = Vec::new();
        check_name(&input.name, &mut violations);
        check_sku(&input.sku, &mut violations);
        if let Some(description) = input.description.as_deref() {
            check_description(description, &mut violations);
        }
        check_price(input.price, &mut violations);
        check_category(input.category_id, &mut violations);
        violations
    }
}

/// Same rules as create, applied only to the fields present in the patch.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateProductValidator;

#[async_trait]
impl Validator<UpdateProductRequest> for UpdateProductValidator {
    async fn validate(&self, input: &UpdateProductRequest) -> Vec<String> {
        let mut violations = Vec::new();
        if let Some(name) = input.name.as_deref() {
            check_name(name, &mut violations);
        }
        if let Some(description) = input.description.as_deref() {
            check_description(description, &mut violations);
        }
        if let Some(price) = input.price {
            check_price(price, &mut violations);
        }
        if let Some(category_id) = input.category_id {
            check_category(category_id, &mut violations);
        }
        violations
    }
}
