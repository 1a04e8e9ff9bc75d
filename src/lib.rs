//! Extinct mammals catalogue core.
//! Catalogue storage, cached on-demand translation of species texts, and
//! the application context the web layer is built on.

pub mod catalog;
pub mod config;
pub mod metrics;
pub mod translate;

use std::sync::Arc;

use tracing::{info, warn};

use catalog::{GeocodingData, MammalStore, MapData, Page, StoreError, TranslatedMammal};
use config::AppConfig;
use metrics::MetricsRegistry;
use translate::google::GoogleProvider;
use translate::language::{is_content_language, resolve_language};
use translate::{CacheStore, MemoryCache, SqliteCache, TranslationProvider, Translator};

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("extinct_mammals=info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}

/// Shared application state, built once at process start.
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<MammalStore>,
    pub translator: Arc<Translator>,
    pub metrics: Arc<MetricsRegistry>,
    /// Per-species coordinates for the global map, read from the seed file.
    pub geocoding: GeocodingData,
}

impl AppContext {
    pub fn from_config(config: AppConfig) -> Result<Self, StoreError> {
        let store = Arc::new(MammalStore::open(&config.catalog_db_path)?);
        if let Some(seed) = &config.seed_path {
            let inserted = store.seed_if_empty(seed)?;
            if inserted > 0 {
                info!(inserted, "catalogue initialised from seed");
            }
        }

        let geocoding = load_geocoding(&config);
        let cache = build_cache(&config);
        let provider = build_provider(&config);
        let mut ctx = Self::with_parts(config, store, cache, provider);
        ctx.geocoding = geocoding;
        Ok(ctx)
    }

    /// Assemble a context from already-built parts.
    pub fn with_parts(
        config: AppConfig,
        store: Arc<MammalStore>,
        cache: Arc<dyn CacheStore>,
        provider: Option<Arc<dyn TranslationProvider>>,
    ) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let translator = Arc::new(
            Translator::new(cache, provider, &config.translation)
                .with_metrics(Arc::clone(&metrics)),
        );
        Self {
            config,
            store,
            translator,
            metrics,
            geocoding: GeocodingData::default(),
        }
    }

    /// Language for a request, falling back to the configured default.
    pub fn request_language<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        resolve_language(requested, &self.config.default_lang)
    }

    /// Whether pages in `lang` go through the translator at all.
    pub fn needs_translation(&self, lang: &str) -> bool {
        !is_content_language(lang, &self.config.translation.content_lang)
    }

    /// Data for the global map page.
    pub fn map_data(&self) -> Result<MapData, StoreError> {
        self.store.map_locations(&self.geocoding)
    }

    /// One listing page with its items as translated views.
    pub fn localized_page<'a>(
        &'a self,
        page: &'a Page,
        lang: &str,
    ) -> Vec<TranslatedMammal<'a>> {
        self.translator.wrap_all(&page.items, lang)
    }
}

fn load_geocoding(config: &AppConfig) -> GeocodingData {
    let Some(path) = &config.seed_path else {
        return GeocodingData::default();
    };
    match GeocodingData::load(path) {
        Ok(geo) => {
            info!(species = geo.len(), "geocoding data loaded");
            geo
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "geocoding data unavailable, map is empty");
            GeocodingData::default()
        }
    }
}

fn build_cache(config: &AppConfig) -> Arc<dyn CacheStore> {
    if let Some(path) = &config.translation.cache_db_path {
        match SqliteCache::open(path) {
            Ok(cache) => return Arc::new(cache),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %path.display(),
                    "SQLite cache unavailable, using memory cache"
                );
            }
        }
    }
    Arc::new(MemoryCache::new(config.translation.memory_cache_capacity))
}

fn build_provider(config: &AppConfig) -> Option<Arc<dyn TranslationProvider>> {
    let t = &config.translation;
    if !t.provider_enabled {
        info!("translation provider disabled, content served untranslated");
        return None;
    }
    match GoogleProvider::new(&t.provider_base_url, t.provider_timeout) {
        Ok(provider) => {
            info!(base_url = %t.provider_base_url, "translation provider initialized");
            let provider: Arc<dyn TranslationProvider> = Arc::new(provider);
            Some(provider)
        }
        Err(e) => {
            warn!(error = %e, "translation provider init failed, translation disabled");
            None
        }
    }
}
