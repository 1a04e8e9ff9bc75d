//! Language code normalization.
//! Every code is reduced to its lowercase primary subtag before it is
//! compared, used in a cache key, or sent to a provider.

/// Languages offered by the site, as (code, display name).
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("pt-br", "Português"),
    ("en", "English"),
    ("es", "Español"),
];

/// Returns the primary subtag of `lang`, lowercased ("pt-BR" -> "pt").
///
/// Best effort: input without a hyphen is only lowercased, and an empty
/// string comes back empty.
pub fn normalize_lang(lang: &str) -> String {
    let primary = lang.split('-').next().unwrap_or(lang);
    primary.trim().to_lowercase()
}

/// True when both codes share the same primary subtag.
pub fn same_language(a: &str, b: &str) -> bool {
    normalize_lang(a) == normalize_lang(b)
}

/// True when `lang` is the language the stored content is written in, so
/// a view in `lang` needs no translation.
pub fn is_content_language(lang: &str, content_lang: &str) -> bool {
    same_language(lang, content_lang)
}

/// Pick the language for a request: the requested code when it is present
/// and supported, otherwise `default_lang`.
pub fn resolve_language<'a>(requested: Option<&'a str>, default_lang: &'a str) -> &'a str {
    match requested.map(str::trim) {
        Some(code) if !code.is_empty() && is_supported(code) => code,
        _ => default_lang,
    }
}

/// Whether `lang` is one of `SUPPORTED_LANGUAGES` (compared by primary subtag).
pub fn is_supported(lang: &str) -> bool {
    SUPPORTED_LANGUAGES
        .iter()
        .any(|(code, _)| same_language(code, lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_region_and_lowercases() {
        assert_eq!(normalize_lang("pt-BR"), "pt");
        assert_eq!(normalize_lang("en-US"), "en");
        assert_eq!(normalize_lang("EN"), "en");
        assert_eq!(normalize_lang("zh-Hant-TW"), "zh");
    }

    #[test]
    fn malformed_input_passes_through() {
        assert_eq!(normalize_lang(""), "");
        assert_eq!(normalize_lang("pt_BR"), "pt_br");
        assert_eq!(normalize_lang("-en"), "");
    }

    #[test]
    fn same_language_compares_primary_subtags() {
        assert!(same_language("pt-br", "PT"));
        assert!(!same_language("pt", "es"));
    }

    #[test]
    fn resolve_falls_back_on_blank() {
        assert_eq!(resolve_language(Some("en-US"), "pt-br"), "en-US");
        assert_eq!(resolve_language(Some("  "), "pt-br"), "pt-br");
        assert_eq!(resolve_language(None, "pt-br"), "pt-br");
    }

    #[test]
    fn resolve_rejects_unsupported_codes() {
        assert_eq!(resolve_language(Some("de-DE"), "pt-br"), "pt-br");
        assert_eq!(resolve_language(Some(" es "), "pt-br"), "es");
    }

    #[test]
    fn content_language_matches_by_primary_subtag() {
        assert!(is_content_language("pt-BR", "pt"));
        assert!(is_content_language("PT", "pt-br"));
        assert!(!is_content_language("en-US", "pt"));
        assert!(!is_content_language("", "pt"));
    }

    #[test]
    fn supported_table() {
        assert!(is_supported("pt"));
        assert!(is_supported("en-GB"));
        assert!(!is_supported("de"));
    }
}
