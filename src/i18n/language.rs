//! Language type: validated language representation.
//!
//! A `Language` can only be constructed from a code found in the
//! `LanguageRegistry`, so every downstream lookup by code is infallible.

use crate::i18n::{I18nError, LanguageConfig, LanguageRegistry, LanguageStrings};
use std::fmt;

/// A validated, enabled language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// Canonical code from the registry (e.g., "ja", "zh-CN")
    code: &'static str,
}

impl Language {
    pub const JAPANESE: Language = Language { code: "ja" };
    pub const ENGLISH: Language = Language { code: "en" };
    pub const CHINESE_SIMPLIFIED: Language = Language { code: "zh-CN" };
    pub const KOREAN: Language = Language { code: "ko" };
    pub const SPANISH: Language = Language { code: "es" };

    /// Create a Language from a language code string.
    ///
    /// Matching is case-insensitive; the returned language always carries the
    /// registry's canonical spelling.
    ///
    /// # Example
    /// ```
    /// use site_i18n::i18n::Language;
    ///
    /// let chinese = Language::from_code("zh-cn").unwrap();
    /// assert_eq!(chinese.code(), "zh-CN");
    /// ```
    pub fn from_code(code: &str) -> Result<Language, I18nError> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => Err(I18nError::LanguageDisabled(code.to_string())),
            None => Err(I18nError::UnknownLanguage(code.to_string())),
        }
    }

    /// The default language: always available, never fetched.
    pub fn default_language() -> Language {
        let config = LanguageRegistry::get().default_language();
        Language { code: config.code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen for
    /// a `Language` built through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Value for the document language attribute (`zh-CN` displays as `zh-Hans`).
    pub fn html_lang(&self) -> &'static str {
        self.config().html_lang
    }

    pub fn is_default(&self) -> bool {
        self.config().is_default
    }

    pub fn strings(&self) -> &'static LanguageStrings {
        self.config().strings
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::default_language()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
