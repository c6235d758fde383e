//! Active language resolution.

use crate::i18n::{Language, LanguageRegistry};
use crate::storage::{KeyValueStore, PREFERRED_LANGUAGE_KEY};
use std::sync::Arc;
use tracing::debug;

/// Resolves the active language from the stored preference, the browser
/// preference list, or the default language, in that order.
pub struct LanguageDetector {
    prefs: Arc<dyn KeyValueStore>,
    browser_languages: Vec<String>,
}

impl LanguageDetector {
    pub fn new(prefs: Arc<dyn KeyValueStore>, browser_languages: Vec<String>) -> Self {
        Self {
            prefs,
            browser_languages,
        }
    }

    pub fn detect(&self) -> Language {
        if let Some(stored) = self.prefs.get(PREFERRED_LANGUAGE_KEY) {
            match Language::from_code(&stored) {
                Ok(lang) => {
                    debug!("Using stored language preference '{}'", lang);
                    return lang;
                }
                Err(e) => debug!("Ignoring stored language preference: {}", e),
            }
        }

        for tag in &self.browser_languages {
            if let Some(lang) = match_browser_tag(tag) {
                debug!("Matched browser language '{}' to '{}'", tag, lang);
                return lang;
            }
        }

        Language::default_language()
    }
}

/// Match one browser language tag against the supported set.
///
/// Exact (case-insensitive) match first, then the simplified-Chinese rule, then
/// the base-language prefix.
pub fn match_browser_tag(tag: &str) -> Option<Language> {
    let tag = tag.trim().replace('_', "-");
    if tag.is_empty() {
        return None;
    }

    let registry = LanguageRegistry::get();
    if registry.is_enabled(&tag) {
        return Language::from_code(&tag).ok();
    }

    let lower = tag.to_ascii_lowercase();
    if lower == "zh" || lower == "zh-cn" || lower == "zh-sg" || lower.starts_with("zh-hans") {
        return Some(Language::CHINESE_SIMPLIFIED);
    }

    let base = lower.split('-').next().unwrap_or_default();
    if base == "zh" {
        // Traditional variants have no bundle; keep looking at later preferences
        return None;
    }
    Language::from_code(base).ok()
}

/// Browser-style language preferences derived from POSIX locale variables.
///
/// `LANGUAGE` may hold a colon-separated list; `LC_ALL` and `LANG` hold a
/// single locale such as `en_US.UTF-8`.
pub fn browser_languages_from_env() -> Vec<String> {
    let mut tags = Vec::new();

    if let Ok(list) = std::env::var("LANGUAGE") {
        tags.extend(list.split(':').filter_map(posix_to_tag));
    }
    for var in ["LC_ALL", "LANG"] {
        if let Some(tag) = std::env::var(var).ok().as_deref().and_then(posix_to_tag) {
            tags.push(tag);
        }
    }

    tags.dedup();
    tags
}

fn posix_to_tag(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serial_test::serial;

    fn detector(stored: Option<&str>, browser: &[&str]) -> LanguageDetector {
        let prefs = Arc::new(MemoryStore::new());
        if let Some(code) = stored {
            prefs.set(PREFERRED_LANGUAGE_KEY, code).unwrap();
        }
        LanguageDetector::new(prefs, browser.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_stored_preference_wins_over_browser() {
        let detector = detector(Some("en"), &["ko-KR", "es"]);
        assert_eq!(detector.detect(), Language::ENGLISH);
    }

    #[test]
    fn test_stored_preference_without_browser_match() {
        let detector = detector(Some("en"), &["fr-FR"]);
        assert_eq!(detector.detect(), Language::ENGLISH);
    }

    #[test]
    fn test_unsupported_stored_preference_is_ignored() {
        let detector = detector(Some("fr"), &["es-MX"]);
        assert_eq!(detector.detect(), Language::SPANISH);
    }

    #[test]
    fn test_browser_exact_match() {
        let detector = detector(None, &["zh-CN"]);
        assert_eq!(detector.detect(), Language::CHINESE_SIMPLIFIED);
    }

    #[test]
    fn test_browser_prefix_match() {
        let detector = detector(None, &["fr-FR", "en-GB"]);
        assert_eq!(detector.detect(), Language::ENGLISH);
    }

    #[test]
    fn test_chinese_variants_map_to_simplified() {
        for tag in ["zh", "zh-Hans", "zh-Hans-CN", "zh-SG", "zh_CN"] {
            assert_eq!(match_browser_tag(tag), Some(Language::CHINESE_SIMPLIFIED), "{tag}");
        }
    }

    #[test]
    fn test_traditional_chinese_falls_through() {
        assert_eq!(match_browser_tag("zh-TW"), None);
        let detector = detector(None, &["zh-Hant-TW", "ko"]);
        assert_eq!(detector.detect(), Language::KOREAN);
    }

    #[test]
    fn test_falls_back_to_default() {
        let detector = detector(None, &["de-DE", "fr"]);
        assert_eq!(detector.detect(), Language::JAPANESE);

        let detector = detector_with_no_prefs();
        assert_eq!(detector.detect(), Language::JAPANESE);
    }

    fn detector_with_no_prefs() -> LanguageDetector {
        LanguageDetector::new(Arc::new(MemoryStore::new()), Vec::new())
    }

    #[test]
    fn test_posix_to_tag() {
        assert_eq!(posix_to_tag("en_US.UTF-8").as_deref(), Some("en-US"));
        assert_eq!(posix_to_tag("ja_JP@euro").as_deref(), Some("ja-JP"));
        assert_eq!(posix_to_tag("C"), None);
        assert_eq!(posix_to_tag(""), None);
    }

    #[test]
    #[serial]
    fn test_browser_languages_from_env() {
        std::env::set_var("LANGUAGE", "es_MX:en");
        std::env::set_var("LC_ALL", "C");
        std::env::set_var("LANG", "ko_KR.UTF-8");

        let tags = browser_languages_from_env();
        assert_eq!(tags, vec!["es-MX", "en", "ko-KR"]);

        std::env::remove_var("LANGUAGE");
        std::env::remove_var("LC_ALL");
        std::env::remove_var("LANG");
    }
}
