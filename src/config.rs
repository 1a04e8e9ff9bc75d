//! Runtime configuration.
//! Defaults suit a single-node deployment; every field can be overridden
//! through a `MAMMALS_*` environment variable.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::translate::google;

/// Provider request limit is 5000 chars; keep a margin for encoding overhead.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4500;
/// Translations are practically permanent: 30 days.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 3600);
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PAGE_SIZE: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Language all stored content is authored in.
    pub content_lang: String,
    pub max_chunk_chars: usize,
    pub cache_ttl: Duration,
    pub provider_enabled: bool,
    pub provider_base_url: String,
    pub provider_timeout: Duration,
    pub memory_cache_capacity: usize,
    /// When set, translations are cached in SQLite instead of memory.
    pub cache_db_path: Option<PathBuf>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            content_lang: "pt".into(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            cache_ttl: DEFAULT_CACHE_TTL,
            provider_enabled: true,
            provider_base_url: google::DEFAULT_BASE_URL.into(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            memory_cache_capacity: 4096,
            cache_db_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub translation: TranslationConfig,
    /// Language used when a request does not name one.
    pub default_lang: String,
    pub page_size: usize,
    pub catalog_db_path: PathBuf,
    /// Seed document imported into an empty catalogue on start-up.
    pub seed_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            translation: TranslationConfig::default(),
            default_lang: "pt-br".into(),
            page_size: DEFAULT_PAGE_SIZE,
            catalog_db_path: PathBuf::from("mammals.db"),
            seed_path: None,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `MAMMALS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let t = &mut cfg.translation;

        if let Some(v) = lookup("MAMMALS_CONTENT_LANG") {
            t.content_lang = v;
        }
        if let Some(v) = lookup("MAMMALS_MAX_CHUNK_CHARS") {
            t.max_chunk_chars = parse("MAMMALS_MAX_CHUNK_CHARS", &v)?;
            if t.max_chunk_chars == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "MAMMALS_MAX_CHUNK_CHARS",
                    value: v,
                });
            }
        }
        if let Some(v) = lookup("MAMMALS_CACHE_TTL_SECS") {
            t.cache_ttl = Duration::from_secs(parse("MAMMALS_CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("MAMMALS_PROVIDER_ENABLED") {
            t.provider_enabled = parse_bool("MAMMALS_PROVIDER_ENABLED", &v)?;
        }
        if let Some(v) = lookup("MAMMALS_PROVIDER_URL") {
            t.provider_base_url = v;
        }
        if let Some(v) = lookup("MAMMALS_PROVIDER_TIMEOUT_MS") {
            t.provider_timeout = Duration::from_millis(parse("MAMMALS_PROVIDER_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("MAMMALS_MEMORY_CACHE_CAPACITY") {
            t.memory_cache_capacity = parse("MAMMALS_MEMORY_CACHE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("MAMMALS_CACHE_DB") {
            t.cache_db_path = Some(PathBuf::from(v));
        }

        if let Some(v) = lookup("MAMMALS_DEFAULT_LANG") {
            cfg.default_lang = v;
        }
        if let Some(v) = lookup("MAMMALS_PAGE_SIZE") {
            cfg.page_size = parse("MAMMALS_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("MAMMALS_CATALOG_DB") {
            cfg.catalog_db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MAMMALS_SEED_FILE") {
            cfg.seed_path = Some(PathBuf::from(v));
        }

        Ok(cfg)
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
