use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use migration::MigratorTrait;
use rust_decimal::Decimal;
use service::cache::MokaCache;
use service::product::repo::seaorm::SeaOrmProductRepository;
use service::product::{CreateProductRequest, Product, ProductSearchRequest, ProductService, UpdateProductRequest};
use service::Outcome;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

type CatalogService = ProductService<SeaOrmProductRepository, MokaCache<Product>>;

fn init_logging() {
    // 提前加载 .env，使得 RUST_LOG / DATABASE_URL 等环境变量生效
    dotenv().ok();
    // LOG_FORMAT=json 输出结构化 JSON 日志
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => common::utils::logging::init_logging_json(),
        _ => common::utils::logging::init_logging_default(),
    }
    info!(service = "catalog", event = "logger_init", "tracing subscriber initialized");
}

fn load_config() -> configs::AppConfig {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            // 找不到或无法解析 config.toml 时使用默认配置
            warn!(service = "catalog", event = "config_fallback", error = %e, "using default configuration");
            let mut cfg = configs::AppConfig::default();
            cfg.database.normalize_from_env();
            cfg
        }
    }
}

fn log_outcome<T: std::fmt::Debug>(step: &str, outcome: &Outcome<T>) {
    match outcome {
        Outcome::Success(value) => info!(service = "catalog", step, ?value, "step_succeeded"),
        Outcome::Failure(f) => warn!(service = "catalog", step, code = ?f.code, error = %f.message, "step_failed"),
    }
}

async fn build_service(cfg: &configs::AppConfig) -> Result<CatalogService> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!(service = "catalog", event = "migrated", in_memory = cfg.database.is_in_memory(), "schema up to date");

    let options = cfg.product_service.clone();
    info!(
        service = "catalog",
        event = "options",
        cache_duration_secs = options.cache_duration_secs,
        cache_capacity = options.cache_capacity,
        enable_enrichment = options.enable_enrichment,
        "product service options"
    );
    let repo = Arc::new(SeaOrmProductRepository::new(db));
    let cache = Arc::new(MokaCache::new(options.cache_capacity));
    Ok(ProductService::new(repo, cache, options))
}

/// Scripted walk through every operation; stops early when cancelled.
async fn run(svc: CatalogService, ct: CancellationToken) -> Result<()> {
    let sku = format!("DEMO-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase());
    let request = CreateProductRequest {
        name: "Demo widget".into(),
        sku,
        description: Some("created by the catalog demo".into()),
        price: Decimal::new(1999, 2),
        category_id: 1,
    };

    let created = svc.create(&request, &ct).await?;
    log_outcome("create", &created);
    let Some(product) = created.into_value() else {
        return Ok(());
    };

    // first read misses the cache, second one hits it
    log_outcome("get_miss", &svc.get_by_id(&product.id, &ct).await?);
    log_outcome("get_hit", &svc.get_by_id(&product.id, &ct).await?);

    let search = ProductSearchRequest { search_term: Some("demo".into()), page_size: Some(10), ..Default::default() };
    let page = svc.search(&search, &ct).await?;
    if let Some(p) = page.value() {
        info!(service = "catalog", step = "search", total = p.total_count, pages = p.total_pages, "step_succeeded");
    } else {
        log_outcome("search", &page);
    }

    let patch = UpdateProductRequest { price: Some(Decimal::new(999, 2)), ..Default::default() };
    log_outcome("update", &svc.update(&product.id, &patch, &ct).await?);
    log_outcome("delete", &svc.delete(&product.id, &ct).await?);
    log_outcome("get_after_delete", &svc.get_by_id(&product.id, &ct).await?);
    Ok(())
}

fn main() -> std::process::ExitCode {
    init_logging();

    let run_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "catalog", event = "panic", %run_id, pid, message = %info, "unhandled panic occurred");
    }));

    let cfg = load_config();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "catalog", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "catalog", event = "start", %run_id, pid, version, "catalog demo starting");

    rt.block_on(async move {
        let svc = match build_service(&cfg).await {
            Ok(svc) => svc,
            Err(e) => {
                error!(service = "catalog", event = "setup_failed", error = %e, "database setup failed");
                return std::process::ExitCode::FAILURE;
            }
        };

        // Ctrl+C 取消所有进行中的操作
        let ct = CancellationToken::new();
        let trigger = ct.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(service = "catalog", event = "shutdown_signal", "received Ctrl+C, cancelling");
                trigger.cancel();
            }
        });

        match run(svc, ct).await {
            Ok(()) => {
                info!(service = "catalog", event = "stop", %run_id, pid, "catalog demo finished");
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                warn!(service = "catalog", event = "cancelled", error = %e, "catalog demo interrupted");
                std::process::ExitCode::FAILURE
            }
        }
    })
}
