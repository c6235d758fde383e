//! Language registry: single source of truth for all supported languages.
//!
//! The registry is immutable data, initialized lazily with `OnceLock`. The
//! services that act on languages are constructed explicitly elsewhere.

use crate::i18n::strings::{
    LanguageStrings, CHINESE_SIMPLIFIED_STRINGS, ENGLISH_STRINGS, JAPANESE_STRINGS,
    KOREAN_STRINGS, SPANISH_STRINGS,
};
use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Language code as used in bundle file names (e.g., "ja", "zh-CN")
    pub code: &'static str,

    /// English name of the language (e.g., "Japanese")
    pub name: &'static str,

    /// Native name of the language (e.g., "日本語")
    pub native_name: &'static str,

    /// Value written to the document language attribute
    pub html_lang: &'static str,

    /// Whether this is the default language (only one should be true).
    /// The default language is the document's native text and never fetched.
    pub is_default: bool,

    /// Whether this language is enabled for use
    pub enabled: bool,

    /// Strings used by the language switch control
    pub strings: &'static LanguageStrings,
}

/// Registry of supported languages.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// Matching is case-insensitive so `zh-cn` resolves to `zh-CN`.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Get all enabled languages, in declaration order.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Get all languages (including disabled ones).
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the default language configuration.
    ///
    /// # Panics
    /// Panics if the built-in table does not declare exactly one default
    /// language (a programming error in `default_languages`).
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self.languages.iter().filter(|lang| lang.is_default).collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }

    /// Check if a language code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "ja",
            name: "Japanese",
            native_name: "日本語",
            html_lang: "ja",
            is_default: true,
            enabled: true,
            strings: &JAPANESE_STRINGS,
        },
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            html_lang: "en",
            is_default: false,
            enabled: true,
            strings: &ENGLISH_STRINGS,
        },
        LanguageConfig {
            code: "zh-CN",
            name: "Chinese (Simplified)",
            native_name: "简体中文",
            html_lang: "zh-Hans",
            is_default: false,
            enabled: true,
            strings: &CHINESE_SIMPLIFIED_STRINGS,
        },
        LanguageConfig {
            code: "ko",
            name: "Korean",
            native_name: "한국어",
            html_lang: "ko",
            is_default: false,
            enabled: true,
            strings: &KOREAN_STRINGS,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            html_lang: "es",
            is_default: false,
            enabled: true,
            strings: &SPANISH_STRINGS,
        },
    ]
}
