use chrono::Utc;
use sea_orm::{
    entity::prelude::*, sea_query::{Expr, Func, LikeExpr}, ActiveValue::{NotSet, Unchanged}, Condition, DatabaseConnection,
    PaginatorTrait, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    /// price in minor currency units (cents)
    pub price_minor: i64,
    pub category_id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Search filters expressed in storage units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// substring matched against name or sku
    pub term: Option<String>,
    pub category_id: Option<i32>,
    pub min_price_minor: Option<i64>,
    pub max_price_minor: Option<i64>,
}

fn live() -> Select<Entity> {
    Entity::find().filter(Column::DeletedAt.is_null())
}

fn validate_row(model: &Model) -> Result<(), ModelError> {
    if model.id.trim().is_empty() { return Err(ModelError::Validation("product id required".into())); }
    if model.sku.trim().is_empty() { return Err(ModelError::Validation("sku required".into())); }
    if model.price_minor < 0 { return Err(ModelError::Validation("price must not be negative".into())); }
    Ok(())
}

/// Find a product that has not been soft-deleted.
pub async fn find_live(db: &DatabaseConnection, id: &str) -> Result<Option<Model>, ModelError> {
    Ok(live().filter(Column::Id.eq(id)).one(db).await?)
}

/// Find a live product by SKU.
pub async fn find_live_by_sku(db: &DatabaseConnection, sku: &str) -> Result<Option<Model>, ModelError> {
    Ok(live().filter(Column::Sku.eq(sku)).one(db).await?)
}

/// Insert a fully-formed row. A live row with the same SKU yields `ModelError::Conflict`.
pub async fn insert(db: &DatabaseConnection, model: Model) -> Result<Model, ModelError> {
    validate_row(&model)?;
    let am = ActiveModel {
        id: Set(model.id),
        sku: Set(model.sku),
        name: Set(model.name),
        description: Set(model.description),
        price_minor: Set(model.price_minor),
        category_id: Set(model.category_id),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
        deleted_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

/// Persist the mutable columns of an existing row. `id`, `sku`, `created_at`
/// and `deleted_at` are never written here.
pub async fn update(db: &DatabaseConnection, model: Model) -> Result<Model, ModelError> {
    validate_row(&model)?;
    let am = ActiveModel {
        id: Unchanged(model.id),
        sku: NotSet,
        name: Set(model.name),
        description: Set(model.description),
        price_minor: Set(model.price_minor),
        category_id: Set(model.category_id),
        created_at: NotSet,
        updated_at: Set(model.updated_at),
        deleted_at: NotSet,
    };
    Ok(am.update(db).await?)
}

/// Soft-delete a product (marks deleted_at). Returns whether a live row was marked.
pub async fn soft_delete(db: &DatabaseConnection, id: &str) -> Result<bool, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::DeletedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .filter(Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Escape `LIKE` wildcards so they match themselves (escape character `\`).
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Search live products; returns the requested slice and the total match count.
pub async fn search(
    db: &DatabaseConnection,
    query: &ProductQuery,
    offset: u64,
    limit: u64,
) -> Result<(Vec<Model>, u64), ModelError> {
    let mut select = live();
    if let Some(term) = query.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        // case-insensitive on every backend; the term is matched literally
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        select = select.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(LikeExpr::new(pattern.clone()).escape('\\')))
                .add(Expr::expr(Func::lower(Expr::col(Column::Sku))).like(LikeExpr::new(pattern).escape('\\'))),
        );
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(Column::CategoryId.eq(category_id));
    }
    if let Some(min) = query.min_price_minor {
        select = select.filter(Column::PriceMinor.gte(min));
    }
    if let Some(max) = query.max_price_minor {
        select = select.filter(Column::PriceMinor.lte(max));
    }

    let total = select.clone().count(db).await?;
    // past the last row; also keeps the bound offset inside the driver's i64 range
    if offset >= total {
        return Ok((Vec::new(), total));
    }
    let rows = select
        .order_by_desc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .offset(offset)
        .limit(limit.min(i64::MAX as u64))
        .all(db)
        .await?;
    Ok((rows, total))
}
