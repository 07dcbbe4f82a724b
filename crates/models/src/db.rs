use std::env;
use std::time::Duration;

use configs::{DatabaseConfig, IN_MEMORY_SQLITE_URL};
use once_cell::sync::Lazy;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

pub static DATABASE_URL: Lazy<String> = Lazy::new(|| {
    // Load .env if present
    let _ = dotenvy::dotenv();
    env::var("DATABASE_URL").unwrap_or_else(|_| IN_MEMORY_SQLITE_URL.to_string())
});

/// Connect using `DATABASE_URL` (or in-memory SQLite when unset) with default pool settings.
pub async fn connect() -> anyhow::Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: DATABASE_URL.clone(), ..Default::default() };
    connect_with_config(&cfg).await
}

/// Connect with pool settings taken from `DatabaseConfig`.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    if cfg.is_in_memory() {
        return connect_sqlite_memory().await;
    }
    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opts).await?;
    info!(max_connections = cfg.max_connections, "database_connected");
    Ok(db)
}

/// Open a private in-memory SQLite database.
///
/// Every pooled connection would see its own empty database, so the pool is
/// pinned to a single connection that is never recycled.
pub async fn connect_sqlite_memory() -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(IN_MEMORY_SQLITE_URL.to_string());
    opts.max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(24 * 60 * 60))
        .max_lifetime(Duration::from_secs(24 * 60 * 60))
        .sqlx_logging(false);
    let db = Database::connect(opts).await?;
    Ok(db)
}
