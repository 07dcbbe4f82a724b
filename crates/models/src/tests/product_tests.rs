use crate::db::connect_sqlite_memory;
use crate::errors::ModelError;
use crate::product::{self, ProductQuery};
use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use migration::MigratorTrait;
use sea_orm::{DatabaseConnection, EntityTrait};

/// Setup a private in-memory database with migrations applied
async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = connect_sqlite_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

fn row(id: &str, sku: &str, name: &str, price_minor: i64, category_id: i32, minutes: i64) -> product::Model {
    product::Model {
        id: id.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        price_minor,
        category_id,
        created_at: base_time() + Duration::minutes(minutes),
        updated_at: None,
        deleted_at: None,
    }
}

#[tokio::test]
async fn insert_find_and_update_roundtrip() -> Result<()> {
    let db = setup_test_db().await?;

    let created = product::insert(&db, row("p1", "ABC-1", "Widget", 1999, 3, 0)).await?;
    assert_eq!(created.sku, "ABC-1");

    let found = product::find_live(&db, "p1").await?.unwrap();
    assert_eq!(found.name, "Widget");
    assert_eq!(found.price_minor, 1999);
    assert_eq!(found.created_at, base_time());

    let by_sku = product::find_live_by_sku(&db, "ABC-1").await?.unwrap();
    assert_eq!(by_sku.id, "p1");

    let mut changed = found.clone();
    changed.name = "Widget Pro".into();
    changed.description = Some("now with more widget".into());
    changed.updated_at = Some(base_time() + Duration::hours(1));
    let updated = product::update(&db, changed).await?;
    assert_eq!(updated.name, "Widget Pro");
    assert_eq!(updated.sku, "ABC-1");
    assert_eq!(updated.created_at, base_time());
    assert_eq!(updated.updated_at, Some(base_time() + Duration::hours(1)));
    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_row_but_keeps_it() -> Result<()> {
    let db = setup_test_db().await?;
    product::insert(&db, row("p1", "ABC-1", "Widget", 1999, 3, 0)).await?;

    assert!(product::soft_delete(&db, "p1").await?);
    assert!(product::find_live(&db, "p1").await?.is_none());
    assert!(product::find_live_by_sku(&db, "ABC-1").await?.is_none());

    // the row is still physically present
    let raw = product::Entity::find_by_id("p1".to_string()).one(&db).await?.unwrap();
    assert!(raw.deleted_at.is_some());

    // deleting again marks nothing
    assert!(!product::soft_delete(&db, "p1").await?);
    Ok(())
}

#[tokio::test]
async fn live_sku_is_unique_but_deleted_sku_can_be_reused() -> Result<()> {
    let db = setup_test_db().await?;
    product::insert(&db, row("p1", "ABC-1", "Widget", 1999, 3, 0)).await?;

    let dup = product::insert(&db, row("p2", "ABC-1", "Other", 500, 3, 1)).await;
    assert!(matches!(dup, Err(ModelError::Conflict(_))), "got {dup:?}");

    product::soft_delete(&db, "p1").await?;
    let reused = product::insert(&db, row("p3", "ABC-1", "Widget again", 2999, 3, 2)).await?;
    assert_eq!(reused.id, "p3");
    Ok(())
}

#[tokio::test]
async fn insert_rejects_blank_identity() -> Result<()> {
    let db = setup_test_db().await?;
    let res = product::insert(&db, row(" ", "ABC-1", "Widget", 1999, 3, 0)).await;
    assert!(matches!(res, Err(ModelError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn search_filters_orders_and_pages() -> Result<()> {
    let db = setup_test_db().await?;
    product::insert(&db, row("p1", "ABC-1", "Red widget", 1000, 1, 0)).await?;
    product::insert(&db, row("p2", "ABC-2", "Blue widget", 2000, 1, 1)).await?;
    product::insert(&db, row("p3", "XYZ-1", "Gadget", 3000, 2, 2)).await?;
    product::insert(&db, row("p4", "ABC-3", "Green widget", 4000, 1, 3)).await?;
    product::soft_delete(&db, "p4").await?;

    // everything live, newest first
    let (rows, total) = product::search(&db, &ProductQuery::default(), 0, 10).await?;
    assert_eq!(total, 3);
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["p3", "p2", "p1"]);

    // term matches name
    let q = ProductQuery { term: Some("widget".into()), ..Default::default() };
    let (rows, total) = product::search(&db, &q, 0, 10).await?;
    assert_eq!(total, 2);
    assert!(rows.iter().all(|r| r.name.contains("widget")));

    // term matches sku
    let q = ProductQuery { term: Some("XYZ".into()), ..Default::default() };
    let (rows, total) = product::search(&db, &q, 0, 10).await?;
    assert_eq!(total, 1);
    assert_eq!(rows[0].id, "p3");

    // category + price bounds
    let q = ProductQuery { category_id: Some(1), min_price_minor: Some(1500), max_price_minor: Some(2500), ..Default::default() };
    let (rows, total) = product::search(&db, &q, 0, 10).await?;
    assert_eq!(total, 1);
    assert_eq!(rows[0].id, "p2");

    // paging keeps the total
    let (rows, total) = product::search(&db, &ProductQuery::default(), 2, 2).await?;
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "p1");
    Ok(())
}

#[tokio::test]
async fn search_term_wildcards_match_literally() -> Result<()> {
    let db = setup_test_db().await?;
    product::insert(&db, row("p1", "ABC-1", "Plain widget", 1000, 1, 0)).await?;
    product::insert(&db, row("p2", "ABC-2", "50% off widget", 1000, 1, 1)).await?;

    for (term, expected) in [("%", 1), ("_", 0), ("50%", 1), ("plain", 1)] {
        let q = ProductQuery { term: Some(term.into()), ..Default::default() };
        let (_, total) = product::search(&db, &q, 0, 10).await?;
        assert_eq!(total, expected, "term {term:?}");
    }
    Ok(())
}

#[tokio::test]
async fn search_offset_beyond_rows_is_empty() -> Result<()> {
    let db = setup_test_db().await?;
    product::insert(&db, row("p1", "ABC-1", "Widget", 1000, 1, 0)).await?;

    let (rows, total) = product::search(&db, &ProductQuery::default(), u64::MAX, 50).await?;
    assert!(rows.is_empty());
    assert_eq!(total, 1);
    Ok(())
}
