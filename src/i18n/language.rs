//! Language type: a language code validated against a registry.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::i18n::LanguageRegistry;

/// Errors raised when constructing languages or registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Unknown language code: '{0}'")]
    Unknown(String),

    #[error("Language registry is empty")]
    EmptyRegistry,

    #[error("Language registry has no default language")]
    NoDefault,

    #[error("Language registry has more than one default language")]
    MultipleDefaults,

    #[error("Language code '{0}' is listed more than once")]
    DuplicateCode(String),
}

/// A supported language.
///
/// Only obtainable from a [`LanguageRegistry`], so holding a `Language`
/// proves membership in a supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const JAPANESE: Language = Language { code: "ja" };
    pub const KOREAN: Language = Language { code: "ko" };

    pub(crate) fn new(code: &'static str) -> Self {
        Self { code }
    }

    /// Create a Language from a code in the site registry.
    ///
    /// # Example
    /// ```ignore
    /// let japanese = Language::from_code("ja")?;
    /// ```
    pub fn from_code(code: &str) -> Result<Language, LanguageError> {
        LanguageRegistry::get()
            .language(code)
            .ok_or_else(|| LanguageError::Unknown(code.to_string()))
    }

    /// The language code (e.g., "en", "ja").
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_match_registry() {
        assert_eq!(Language::from_code("en").unwrap(), Language::ENGLISH);
        assert_eq!(Language::from_code("ja").unwrap(), Language::JAPANESE);
        assert_eq!(Language::from_code("ko").unwrap(), Language::KOREAN);
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Language::from_code("fr");
        assert_eq!(result, Err(LanguageError::Unknown("fr".to_string())));
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_from_code_regional_tag_is_not_normalized() {
        assert!(Language::from_code("ja-JP").is_err());
    }

    #[test]
    fn test_display_and_serialize_use_code() {
        assert_eq!(Language::KOREAN.to_string(), "ko");
        assert_eq!(serde_json::to_string(&Language::JAPANESE).unwrap(), "\"ja\"");
    }
}
