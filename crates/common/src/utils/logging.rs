use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Human-readable subscriber used by the catalog binary.
/// - `RUST_LOG` wins when set
/// - Otherwise `info`, with sqlx statement logs and sea-orm internals held at `warn`
///   so the service's `product_created` / `product_deleted` events stay readable
/// - Compact single-line format without targets, written to stdout
/// - Later calls are ignored (`try_init`)
pub fn init_logging_default() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,sea_orm=warn"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// JSON subscriber selected by `LOG_FORMAT=json`.
/// - `RUST_LOG` wins when set
/// - Otherwise `info`, plus `debug` for `service::product` so cache hits/misses,
///   validation failures and cancellations are recorded; sqlx stays at `warn`
/// - One JSON object per event, with span fields such as `product_id` and `sku`
pub fn init_logging_json() {
    // 默认 info；service::product 下的缓存命中/未命中使用 debug 级别
    // 可通过 RUST_LOG 覆盖，例如 RUST_LOG=info,service::product=trace
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,service::product=debug,sqlx=warn"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Subscriber for unit tests: `debug` by default, output captured per test by libtest.
pub fn init_logging_for_tests() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}
