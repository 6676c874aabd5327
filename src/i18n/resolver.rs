//! Locale resolution: pick exactly one supported language for a page view.
//!
//! Candidate sources are consulted in strict priority order and the first
//! supported one wins:
//!
//! 1. the `lang` parameter of the page URL query,
//! 2. the persisted preference,
//! 3. the first browser locale (matched literally, `en-US` is not `en`),
//! 4. the registry default.
//!
//! Unsupported or malformed values at any tier simply fall through, so
//! resolution never fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::i18n::{Language, LanguageRegistry, PreferenceStore};

/// Name of the URL query parameter that overrides the language.
pub const QUERY_PARAM: &str = "lang";

/// Which tier produced a resolved language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSource {
    Query,
    Stored,
    Browser,
    Default,
}

/// Outcome of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub language: Language,
    pub source: LanguageSource,
}

/// Read a parameter from a raw URL query string.
///
/// The leading `?` is optional. Pairs are split on `&` and then on `=`; the
/// value is the text between the first and second `=`. When the name occurs
/// several times the last occurrence wins, even if it carries no value.
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut value = None;
    for pair in query.split('&') {
        let mut parts = pair.split('=');
        if parts.next() == Some(name) {
            value = parts.next();
        }
    }
    value
}

/// Resolve the active language from the four preference tiers.
pub fn resolve_language<S: AsRef<str>>(
    url_query: &str,
    stored_preference: Option<&str>,
    browser_locales: &[S],
    registry: &LanguageRegistry,
) -> Resolution {
    let candidates = [
        (query_param(url_query, QUERY_PARAM), LanguageSource::Query),
        (stored_preference, LanguageSource::Stored),
        (
            browser_locales.first().map(|locale| locale.as_ref()),
            LanguageSource::Browser,
        ),
    ];

    candidates
        .into_iter()
        .find_map(|(code, source)| {
            code.and_then(|code| registry.language(code))
                .map(|language| Resolution { language, source })
        })
        .unwrap_or_else(|| Resolution {
            language: registry.default_language(),
            source: LanguageSource::Default,
        })
}

/// Resolve the language and write it back to the preference store.
///
/// The stored preference is read once. The result is saved on every call,
/// which refreshes the expiry when it came from the store itself. A failed
/// write is logged and otherwise ignored.
pub fn resolve_and_persist<S: AsRef<str>, P: PreferenceStore + ?Sized>(
    url_query: &str,
    browser_locales: &[S],
    registry: &LanguageRegistry,
    store: &mut P,
) -> Resolution {
    let stored = store.load();
    let resolution = resolve_language(url_query, stored.as_deref(), browser_locales, registry);

    debug!(
        "Resolved language {} from {:?} (stored: {:?})",
        resolution.language, resolution.source, stored
    );

    if let Err(e) = store.save(resolution.language) {
        warn!("Could not persist language preference: {}", e);
    }

    resolution
}

/// Turn an `Accept-Language` header into an ordered locale list.
///
/// Entries are ordered by descending quality, keeping header order between
/// equal qualities. Tags are returned as written (no case or region folding).
pub fn browser_locales_from_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((tag.to_string(), quality))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::MemoryStore;
    use proptest::prelude::*;

    const NO_LOCALES: [&str; 0] = [];

    fn registry() -> &'static LanguageRegistry {
        LanguageRegistry::get()
    }

    // ==================== query_param Tests ====================

    #[test]
    fn test_query_param_with_leading_question_mark() {
        assert_eq!(query_param("?lang=ja", "lang"), Some("ja"));
    }

    #[test]
    fn test_query_param_without_leading_question_mark() {
        assert_eq!(query_param("lang=ja", "lang"), Some("ja"));
    }

    #[test]
    fn test_query_param_among_other_pairs() {
        assert_eq!(query_param("?page=2&lang=ko&x=y", "lang"), Some("ko"));
    }

    #[test]
    fn test_query_param_last_occurrence_wins() {
        assert_eq!(query_param("?lang=ja&lang=ko", "lang"), Some("ko"));
    }

    #[test]
    fn test_query_param_valueless_last_occurrence_clears() {
        assert_eq!(query_param("?lang=ja&lang", "lang"), None);
    }

    #[test]
    fn test_query_param_takes_text_before_second_equals() {
        assert_eq!(query_param("?lang=ja=x", "lang"), Some("ja"));
    }

    #[test]
    fn test_query_param_absent() {
        assert_eq!(query_param("", "lang"), None);
        assert_eq!(query_param("?", "lang"), None);
        assert_eq!(query_param("?language=ja", "lang"), None);
    }

    // ==================== resolve_language Tests ====================

    #[test]
    fn test_query_wins_over_everything() {
        let resolution = resolve_language("?lang=ko", Some("ja"), &["ja"], registry());
        assert_eq!(resolution.language, Language::KOREAN);
        assert_eq!(resolution.source, LanguageSource::Query);
    }

    #[test]
    fn test_unsupported_query_falls_through_to_stored() {
        let resolution = resolve_language("?lang=fr", Some("ja"), &NO_LOCALES, registry());
        assert_eq!(resolution.language, Language::JAPANESE);
        assert_eq!(resolution.source, LanguageSource::Stored);
    }

    #[test]
    fn test_stored_preference_used_when_query_absent() {
        let resolution = resolve_language("", Some("ja"), &["ko"], registry());
        assert_eq!(resolution.language, Language::JAPANESE);
        assert_eq!(resolution.source, LanguageSource::Stored);
    }

    #[test]
    fn test_browser_locale_used_when_query_and_stored_absent() {
        let resolution = resolve_language("", None, &["ko", "en"], registry());
        assert_eq!(resolution.language, Language::KOREAN);
        assert_eq!(resolution.source, LanguageSource::Browser);
    }

    #[test]
    fn test_unsupported_browser_locale_falls_back_to_default() {
        let resolution = resolve_language("", None, &["fr", "ja"], registry());
        assert_eq!(resolution.language, Language::ENGLISH);
        assert_eq!(resolution.source, LanguageSource::Default);
    }

    #[test]
    fn test_regional_browser_locale_is_not_normalized() {
        let resolution = resolve_language("", None, &["ja-JP", "ja"], registry());
        assert_eq!(resolution.language, Language::ENGLISH);
        assert_eq!(resolution.source, LanguageSource::Default);
    }

    #[test]
    fn test_stored_garbage_falls_through() {
        let resolution = resolve_language("", Some("<script>"), &["ja"], registry());
        assert_eq!(resolution.language, Language::JAPANESE);
        assert_eq!(resolution.source, LanguageSource::Browser);
    }

    #[test]
    fn test_all_absent_resolves_to_default() {
        let resolution = resolve_language("", None, &NO_LOCALES, registry());
        assert_eq!(resolution.language, Language::ENGLISH);
        assert_eq!(resolution.source, LanguageSource::Default);
    }

    // ==================== resolve_and_persist Tests ====================

    #[test]
    fn test_end_to_end_query_overwrites_stored_preference() {
        let mut store = MemoryStore::with_value("en");
        let resolution = resolve_and_persist("?lang=ko", &["ja-JP", "ja"], registry(), &mut store);

        assert_eq!(resolution.language, Language::KOREAN);
        assert_eq!(store.load().as_deref(), Some("ko"));
    }

    #[test]
    fn test_persist_writes_even_when_result_came_from_store() {
        let mut store = MemoryStore::with_value("ja");
        let before = store.entry().unwrap().expires_at;

        let resolution = resolve_and_persist("", &NO_LOCALES, registry(), &mut store);

        assert_eq!(resolution.source, LanguageSource::Stored);
        assert!(store.entry().unwrap().expires_at >= before);
        assert_eq!(store.load().as_deref(), Some("ja"));
    }

    #[test]
    fn test_persist_failure_is_not_fatal() {
        let mut store = MemoryStore::unavailable();
        let resolution = resolve_and_persist("?lang=ja", &NO_LOCALES, registry(), &mut store);
        assert_eq!(resolution.language, Language::JAPANESE);
    }

    // ==================== Accept-Language Tests ====================

    #[test]
    fn test_accept_language_order_and_quality() {
        let locales = browser_locales_from_accept_language("ja-JP,ja;q=0.9,en;q=0.8");
        assert_eq!(locales, vec!["ja-JP", "ja", "en"]);
    }

    #[test]
    fn test_accept_language_sorts_by_quality() {
        let locales = browser_locales_from_accept_language("en;q=0.5, ko");
        assert_eq!(locales, vec!["ko", "en"]);
    }

    #[test]
    fn test_accept_language_skips_wildcard_and_empty() {
        let locales = browser_locales_from_accept_language("*, ,ko;q=0.1");
        assert_eq!(locales, vec!["ko"]);
    }

    // ==================== Properties ====================

    fn code_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("en".to_string())),
            Just(Some("ja".to_string())),
            Just(Some("ko".to_string())),
            Just(Some("fr".to_string())),
            Just(Some("en-US".to_string())),
            "[a-zA-Z=&-]{0,6}".prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn prop_resolution_is_always_supported(
            query in code_strategy(),
            stored in code_strategy(),
            browser in proptest::collection::vec("[a-zA-Z-]{0,5}", 0..3),
        ) {
            let query = query.map(|q| format!("?lang={}", q)).unwrap_or_default();
            let resolution = resolve_language(&query, stored.as_deref(), &browser, registry());
            prop_assert!(registry().is_supported(resolution.language.code()));
        }

        #[test]
        fn prop_supported_query_always_wins(
            lang in prop_oneof![Just("en"), Just("ja"), Just("ko")],
            stored in code_strategy(),
            browser in proptest::collection::vec("[a-zA-Z-]{0,5}", 0..3),
        ) {
            let query = format!("?lang={}", lang);
            let resolution = resolve_language(&query, stored.as_deref(), &browser, registry());
            prop_assert_eq!(resolution.language.code(), lang);
            prop_assert_eq!(resolution.source, LanguageSource::Query);
        }

        #[test]
        fn prop_arbitrary_query_never_panics(query in ".{0,40}") {
            let resolution = resolve_language(&query, None, &NO_LOCALES, registry());
            prop_assert!(registry().is_supported(resolution.language.code()));
        }
    }
}
