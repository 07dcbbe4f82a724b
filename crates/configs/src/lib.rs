use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

/// URL used when neither `config.toml` nor `DATABASE_URL` names a database.
pub const IN_MEMORY_SQLITE_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub product_service: ProductServiceOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Options consumed by the product service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProductServiceOptions {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_cache_duration")]
    pub cache_duration_secs: u64,
    /// Kept as a deployment knob; no code path branches on it yet.
    #[serde(default = "default_enable_enrichment")]
    pub enable_enrichment: bool,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for ProductServiceOptions {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cache_duration_secs: default_cache_duration(),
            enable_enrichment: default_enable_enrichment(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_page_size() -> u64 { 50 }
fn default_max_page_size() -> u64 { 200 }
fn default_cache_duration() -> u64 { 15 * 60 }
fn default_enable_enrichment() -> bool { true }
fn default_cache_capacity() -> u64 { 10_000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    AppConfig::from_toml_str(&content)
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(content)?;
        Ok(cfg)
    }

    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.product_service.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充；仍为空时退回内存 SQLite
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
        if self.url.trim().is_empty() {
            self.url = IN_MEMORY_SQLITE_URL.to_string();
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.trim().eq_ignore_ascii_case(IN_MEMORY_SQLITE_URL)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgresql://, postgres:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl ProductServiceOptions {
    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.cache_duration_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(anyhow!("product_service.default_page_size must be >= 1"));
        }
        if self.max_page_size < self.default_page_size {
            return Err(anyhow!("product_service.max_page_size must be >= default_page_size"));
        }
        if self.cache_duration_secs == 0 {
            return Err(anyhow!("product_service.cache_duration_secs must be > 0"));
        }
        if self.cache_capacity == 0 {
            return Err(anyhow!("product_service.cache_capacity must be > 0"));
        }
        Ok(())
    }
}
