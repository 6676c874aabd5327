//! Language registry: the closed set of languages the site offers.
//!
//! The site-wide registry is an immutable table initialized once with
//! `OnceLock`. Custom registries can be built with [`LanguageRegistry::new`]
//! (useful for tests and for sites with a different language set); every
//! registry is validated so that it holds exactly one default language.

use std::sync::OnceLock;

use super::language::{Language, LanguageError};

/// Configuration for a supported language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Language code as it appears in URLs, cookies and bundle paths (e.g., "en", "ja")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Japanese")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "日本語")
    pub native_name: &'static str,

    /// Whether this is the fallback language of last resort (exactly one must be true)
    pub is_default: bool,
}

/// A validated set of supported languages with exactly one default.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
    default_index: usize,
}

/// Site registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Build a registry from a list of language configurations.
    ///
    /// # Errors
    /// Fails if the list is empty, holds duplicate codes, or does not contain
    /// exactly one default language.
    pub fn new(languages: Vec<LanguageConfig>) -> Result<Self, LanguageError> {
        if languages.is_empty() {
            return Err(LanguageError::EmptyRegistry);
        }

        for (i, lang) in languages.iter().enumerate() {
            if languages[..i].iter().any(|other| other.code == lang.code) {
                return Err(LanguageError::DuplicateCode(lang.code.to_string()));
            }
        }

        let defaults: Vec<usize> = languages
            .iter()
            .enumerate()
            .filter(|(_, lang)| lang.is_default)
            .map(|(i, _)| i)
            .collect();

        match defaults.as_slice() {
            [index] => Ok(Self {
                default_index: *index,
                languages,
            }),
            [] => Err(LanguageError::NoDefault),
            _ => Err(LanguageError::MultipleDefaults),
        }
    }

    /// Get the site-wide language registry (English, Japanese, Korean; English default).
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: site_languages(),
            default_index: 0,
        })
    }

    /// Look up a supported language by its exact code.
    ///
    /// Matching is literal: `"en-US"` is not a member unless the registry
    /// itself lists `"en-US"`.
    pub fn language(&self, code: &str) -> Option<Language> {
        self.get_by_code(code).map(|config| Language::new(config.code))
    }

    /// Get a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Check whether a code is a member of the supported set.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// The fallback language of last resort. Always a member of the registry.
    pub fn default_language(&self) -> Language {
        Language::new(self.languages[self.default_index].code)
    }

    /// All supported languages, in registry order.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.languages.iter().map(|config| Language::new(config.code))
    }

    /// All language configurations, in registry order.
    pub fn list_all(&self) -> &[LanguageConfig] {
        &self.languages
    }
}

/// Languages offered by the portfolio site.
fn site_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: true,
        },
        LanguageConfig {
            code: "ja",
            name: "Japanese",
            native_name: "日本語",
            is_default: false,
        },
        LanguageConfig {
            code: "ko",
            name: "Korean",
            native_name: "한국어",
            is_default: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(code: &'static str, is_default: bool) -> LanguageConfig {
        LanguageConfig {
            code,
            name: code,
            native_name: code,
            is_default,
        }
    }

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();

        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_site_registry_languages() {
        let codes: Vec<&str> = LanguageRegistry::get()
            .languages()
            .map(|lang| lang.code())
            .collect();
        assert_eq!(codes, vec!["en", "ja", "ko"]);
    }

    #[test]
    fn test_site_registry_default_is_english() {
        let registry = LanguageRegistry::get();
        assert_eq!(registry.default_language().code(), "en");
        assert!(registry.is_supported(registry.default_language().code()));
    }

    #[test]
    fn test_get_by_code_japanese() {
        let config = LanguageRegistry::get().get_by_code("ja").unwrap();
        assert_eq!(config.name, "Japanese");
        assert_eq!(config.native_name, "日本語");
        assert!(!config.is_default);
    }

    #[test]
    fn test_language_lookup_is_exact() {
        let registry = LanguageRegistry::get();
        assert!(registry.language("ko").is_some());
        assert!(registry.language("en-US").is_none());
        assert!(registry.language("EN").is_none());
        assert!(registry.language("").is_none());
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = LanguageRegistry::new(vec![]).unwrap_err();
        assert!(matches!(err, LanguageError::EmptyRegistry));
    }

    #[test]
    fn test_new_rejects_missing_default() {
        let err =
            LanguageRegistry::new(vec![config("en", false), config("ja", false)]).unwrap_err();
        assert!(matches!(err, LanguageError::NoDefault));
    }

    #[test]
    fn test_new_rejects_multiple_defaults() {
        let err = LanguageRegistry::new(vec![config("en", true), config("ja", true)]).unwrap_err();
        assert!(matches!(err, LanguageError::MultipleDefaults));
    }

    #[test]
    fn test_new_rejects_duplicate_codes() {
        let err = LanguageRegistry::new(vec![config("en", true), config("en", false)]).unwrap_err();
        assert!(matches!(err, LanguageError::DuplicateCode(code) if code == "en"));
    }

    #[test]
    fn test_custom_registry_with_regional_tag() {
        let registry =
            LanguageRegistry::new(vec![config("ja", true), config("en-US", false)]).unwrap();
        assert_eq!(registry.default_language().code(), "ja");
        assert!(registry.is_supported("en-US"));
        assert!(!registry.is_supported("en"));
    }
}
