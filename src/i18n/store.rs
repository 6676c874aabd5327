//! Persisted language preference.
//!
//! The preference lives under the key `lang` and holds one language code.
//! Every write refreshes a 365-day expiry. Backends:
//! - [`MemoryStore`]: in-process storage with expiry, optionally disabled to
//!   model a browsing context without storage.
//! - [`CookieStore`]: reads the `lang` cookie from a request and produces the
//!   `Set-Cookie` header for the response.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::i18n::Language;

/// Storage key of the language preference.
pub const PREFERENCE_KEY: &str = "lang";

/// Lifetime of a stored preference, refreshed on every write.
pub const PREFERENCE_TTL_DAYS: i64 = 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Preference storage is unavailable: {0}")]
    Unavailable(String),
}

/// Storage for the persisted language preference.
///
/// `load` returns the raw stored value; callers validate it against the
/// supported set, so stale or tampered values simply fall through.
pub trait PreferenceStore {
    fn load(&self) -> Option<String>;

    fn save(&mut self, language: Language) -> Result<(), StoreError>;
}

/// A stored value together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPreference {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredPreference {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entry: Option<StoredPreference>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `value`, valid for the full preference lifetime.
    pub fn with_value(value: &str) -> Self {
        Self::with_entry(StoredPreference {
            value: value.to_string(),
            expires_at: Utc::now() + Duration::days(PREFERENCE_TTL_DAYS),
        })
    }

    pub fn with_entry(entry: StoredPreference) -> Self {
        Self {
            entry: Some(entry),
            unavailable: false,
        }
    }

    /// A store whose reads find nothing and whose writes fail.
    pub fn unavailable() -> Self {
        Self {
            entry: None,
            unavailable: true,
        }
    }

    pub fn entry(&self) -> Option<&StoredPreference> {
        self.entry.as_ref()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.entry
            .as_ref()
            .filter(|entry| !entry.is_expired(Utc::now()))
            .map(|entry| entry.value.clone())
    }

    fn save(&mut self, language: Language) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        self.entry = Some(StoredPreference {
            value: language.code().to_string(),
            expires_at: Utc::now() + Duration::days(PREFERENCE_TTL_DAYS),
        });
        Ok(())
    }
}

/// Cookie-backed preference for server-side resolution.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    current: Option<String>,
    pending: Option<Language>,
}

impl CookieStore {
    /// Build a store from the value of a request `Cookie` header.
    pub fn from_cookie_header(header: Option<&str>) -> Self {
        Self {
            current: header.and_then(parse_cookie),
            pending: None,
        }
    }

    /// The `Set-Cookie` header value for the last saved language, if any.
    pub fn set_cookie_header(&self) -> Option<String> {
        self.pending.map(|language| {
            format!(
                "{}={}; Max-Age={}; Path=/; SameSite=Lax",
                PREFERENCE_KEY,
                language.code(),
                Duration::days(PREFERENCE_TTL_DAYS).num_seconds()
            )
        })
    }
}

impl PreferenceStore for CookieStore {
    fn load(&self) -> Option<String> {
        self.current.clone()
    }

    fn save(&mut self, language: Language) -> Result<(), StoreError> {
        self.current = Some(language.code().to_string());
        self.pending = Some(language);
        Ok(())
    }
}

/// Extract the `lang` cookie from a `Cookie` header (`a=1; lang=ja; b=2`).
/// The last occurrence wins.
fn parse_cookie(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| name.trim() == PREFERENCE_KEY)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load(), None);

        store.save(Language::JAPANESE).unwrap();
        assert_eq!(store.load().as_deref(), Some("ja"));
    }

    #[test]
    fn test_memory_store_save_refreshes_expiry() {
        let mut store = MemoryStore::with_entry(StoredPreference {
            value: "ko".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        });

        store.save(Language::KOREAN).unwrap();
        let entry = store.entry().unwrap();
        assert!(entry.expires_at > Utc::now() + Duration::days(PREFERENCE_TTL_DAYS - 1));
    }

    #[test]
    fn test_memory_store_ignores_expired_entry() {
        let store = MemoryStore::with_entry(StoredPreference {
            value: "ja".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        });
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_unavailable_store_fails_writes() {
        let mut store = MemoryStore::unavailable();
        let err = store.save(Language::ENGLISH).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_cookie_store_reads_lang_cookie() {
        let store = CookieStore::from_cookie_header(Some("theme=dark; lang=ja; other=1"));
        assert_eq!(store.load().as_deref(), Some("ja"));
    }

    #[test]
    fn test_cookie_store_last_occurrence_wins() {
        let store = CookieStore::from_cookie_header(Some("lang=ja; lang=ko"));
        assert_eq!(store.load().as_deref(), Some("ko"));
    }

    #[test]
    fn test_cookie_store_without_header() {
        let store = CookieStore::from_cookie_header(None);
        assert_eq!(store.load(), None);
        assert_eq!(store.set_cookie_header(), None);
    }

    #[test]
    fn test_cookie_store_does_not_match_prefixed_names() {
        let store = CookieStore::from_cookie_header(Some("xlang=ja"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_cookie_store_set_cookie_header() {
        let mut store = CookieStore::from_cookie_header(Some("lang=en"));
        store.save(Language::KOREAN).unwrap();

        assert_eq!(store.load().as_deref(), Some("ko"));
        assert_eq!(
            store.set_cookie_header().as_deref(),
            Some("lang=ko; Max-Age=31536000; Path=/; SameSite=Lax")
        );
    }
}
