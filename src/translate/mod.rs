//! Translation module.
//! Provider adapters, content-keyed caching, paragraph chunking and the
//! read-through `Translator` used by the catalogue views.

pub mod cache;
pub mod chunker;
pub mod google;
pub mod language;
pub mod service;
pub mod sqlite_cache;

pub use cache::{cache_key, CacheError, CacheStore, MemoryCache};
pub use service::Translator;
pub use sqlite_cache::SqliteCache;

/// Translation provider (adapter for different backends).
///
/// Calls are synchronous and happen on the request path, so implementations
/// must bound their own latency (see `TranslationConfig::provider_timeout`).
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`.
    /// Both codes are already normalized to their primary subtag.
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("unexpected status {status}")]
    Status { status: u16 },
    #[error("rate limited")]
    RateLimited,
    #[error("translation timeout")]
    Timeout,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
