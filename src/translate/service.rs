//! Read-through translation service.
//! cache lookup -> (miss) chunked provider calls -> cache fill.
//!
//! Never fails: provider or cache trouble is logged and the caller gets
//! the original text. Concurrent misses on the same key may both reach the
//! provider; both write the same value, last write wins.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::cache::{cache_key, CacheStore};
use super::chunker::{split_into_chunks, PARAGRAPH_SEPARATOR};
use super::language::normalize_lang;
use super::{TranslateError, TranslationProvider};
use crate::catalog::{Mammal, TranslatedMammal};
use crate::config::TranslationConfig;
use crate::metrics::{metric_names, MetricsRegistry};

pub struct Translator {
    cache: Arc<dyn CacheStore>,
    /// None when no provider is configured; every miss then serves the original.
    provider: Option<Arc<dyn TranslationProvider>>,
    metrics: Arc<MetricsRegistry>,
    content_lang: String,
    max_chunk_chars: usize,
    cache_ttl: Duration,
}

impl Translator {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        provider: Option<Arc<dyn TranslationProvider>>,
        config: &TranslationConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            metrics: Arc::new(MetricsRegistry::new()),
            content_lang: normalize_lang(&config.content_lang),
            max_chunk_chars: config.max_chunk_chars.max(1),
            cache_ttl: config.cache_ttl,
        }
    }

    /// Share an existing registry instead of the translator's own.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Normalized language the catalogue content is written in.
    pub fn content_lang(&self) -> &str {
        &self.content_lang
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Translate `text`, serving from cache when possible.
    ///
    /// Blank text and same-language requests return the input untouched
    /// without touching the cache or the provider.
    pub fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let source_lang = normalize_lang(source_lang);
        let target_lang = normalize_lang(target_lang);
        if source_lang == target_lang {
            self.metrics.incr(metric_names::SHORT_CIRCUIT);
            return text.to_string();
        }

        let span = self.metrics.span(metric_names::TRANSLATE_DONE);
        let key = cache_key(text, &source_lang, &target_lang);

        match self.cache.get(&key) {
            Ok(Some(cached)) => {
                self.metrics.incr(metric_names::CACHE_HIT);
                debug!(key = %key, "translation cache hit");
                span.finish();
                return cached;
            }
            Ok(None) => self.metrics.incr(metric_names::CACHE_MISS),
            Err(e) => {
                self.metrics.incr(metric_names::CACHE_ERROR);
                warn!(error = %e, "translation cache read failed, treating as miss");
            }
        }

        let Some(provider) = self.provider.as_deref() else {
            debug!("no translation provider configured, serving original text");
            return text.to_string();
        };

        match self.translate_uncached(provider, text, &source_lang, &target_lang) {
            Ok(translated) => {
                if let Err(e) = self.cache.set(&key, &translated, self.cache_ttl) {
                    self.metrics.incr(metric_names::CACHE_ERROR);
                    warn!(error = %e, "translation cache write failed");
                }
                span.finish();
                translated
            }
            Err(e) => {
                self.metrics.incr(metric_names::PROVIDER_FAILURE);
                warn!(
                    provider = provider.name(),
                    source_lang = %source_lang,
                    target_lang = %target_lang,
                    error = %e,
                    "translation failed, serving original text"
                );
                text.to_string()
            }
        }
    }

    /// One provider call per chunk, in order. The first failure aborts
    /// the whole text.
    fn translate_uncached(
        &self,
        provider: &dyn TranslationProvider,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let chunks = split_into_chunks(text, self.max_chunk_chars);
        if chunks.len() > 1 {
            debug!(chunks = chunks.len(), chars = text.chars().count(), "translating in chunks");
        }

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            // Blank chunks only come from runs of empty paragraphs.
            if chunk.trim().is_empty() {
                translated.push(chunk.to_string());
                continue;
            }
            let span = self.metrics.span(metric_names::PROVIDER_CALL);
            translated.push(provider.translate(chunk, source_lang, target_lang)?);
            span.finish();
        }
        Ok(translated.join(PARAGRAPH_SEPARATOR))
    }

    /// Language-specific view over `mammal`.
    pub fn wrap<'a>(&'a self, mammal: &'a Mammal, target_lang: &str) -> TranslatedMammal<'a> {
        TranslatedMammal::new(self, mammal, target_lang)
    }

    /// Wrap a page of entities for the same target language.
    pub fn wrap_all<'a>(
        &'a self,
        mammals: &'a [Mammal],
        target_lang: &str,
    ) -> Vec<TranslatedMammal<'a>> {
        mammals
            .iter()
            .map(|mammal| self.wrap(mammal, target_lang))
            .collect()
    }
}
