//! Translation bundles.
//!
//! A bundle is the deep-merge of every module file for one language. Values
//! are either strings or nested category objects; only string leaves are
//! translations.

use crate::i18n::{Language, LoadError};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").unwrap())
}

/// All translations for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationBundle {
    language: Language,
    entries: Map<String, Value>,
}

impl TranslationBundle {
    /// An empty bundle. The default language always uses one.
    pub fn empty(language: Language) -> Self {
        Self {
            language,
            entries: Map::new(),
        }
    }

    /// Build a bundle from a decoded JSON document.
    pub fn from_value(language: Language, resource: &str, value: Value) -> Result<Self, LoadError> {
        match value {
            Value::Object(entries) => Ok(Self { language, entries }),
            _ => Err(LoadError::NotAnObject {
                resource: resource.to_string(),
            }),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Merge another module into this bundle; `other` wins on conflicts.
    pub fn deep_merge(&mut self, other: Map<String, Value>) {
        merge_maps(&mut self.entries, other);
    }

    /// Look up a string by key.
    ///
    /// An exact top-level key wins; otherwise the key is walked as a dotted
    /// path (`ui.nav.home`). Non-string leaves never resolve.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        if let Some(Value::String(s)) = self.entries.get(key) {
            return Some(s);
        }

        let mut parts = key.split('.');
        let mut current = self.entries.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        current.as_str()
    }

    /// A top-level category object (`ui`, `sections`, `meta`, ...).
    pub fn category(&self, name: &str) -> Option<&Map<String, Value>> {
        self.entries.get(name).and_then(Value::as_object)
    }

    /// Every string leaf, keyed by its dotted path.
    pub fn flatten(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        flatten_into(&self.entries, "", &mut out);
        out
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn flatten_into<'a>(map: &'a Map<String, Value>, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::String(s) => out.push((path, s)),
            Value::Object(inner) => flatten_into(inner, &path, out),
            _ => {}
        }
    }
}

/// Substitute `{{name}}` placeholders. Unknown placeholders stay verbatim.
pub fn interpolate(template: &str, params: &HashMap<String, String>) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    placeholder_regex()
        .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names of the `{{placeholders}}` in a string, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Split a combined per-language document into module documents.
///
/// Every top-level category becomes one module `{category: value}`, so
/// deep-merging the modules in the returned order reproduces the input.
/// Top-level string entries are collected into a `common` module.
pub fn split_into_modules(combined: &Map<String, Value>) -> Vec<(String, Map<String, Value>)> {
    let mut common = Map::new();
    let mut modules = Vec::new();

    for (key, value) in combined {
        if value.is_object() {
            let mut module = Map::new();
            module.insert(key.clone(), value.clone());
            modules.push((key.clone(), module));
        } else {
            common.insert(key.clone(), value.clone());
        }
    }

    if !common.is_empty() {
        match modules.iter_mut().find(|(name, _)| name == "common") {
            Some((_, existing)) => merge_maps(existing, common),
            None => modules.insert(0, ("common".to_string(), common)),
        }
    }
    modules
}

/// File name of one module of a language: `{lang}-{module}.json`.
pub fn module_file_name(language: Language, module: &str) -> String {
    format!("{}-{}.json", language.code(), module)
}

/// File name of the combined bundle of a language: `{lang}.json`.
pub fn combined_file_name(language: Language) -> String {
    format!("{}.json", language.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn bundle(value: Value) -> TranslationBundle {
        TranslationBundle::from_value(Language::ENGLISH, "test.json", value).unwrap()
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        let result = TranslationBundle::from_value(Language::ENGLISH, "en.json", json!(["a"]));
        assert_eq!(
            result,
            Err(LoadError::NotAnObject {
                resource: "en.json".to_string()
            })
        );
    }

    #[test]
    fn test_deep_merge_later_module_wins() {
        let mut b = bundle(json!({"ui": {"home": "Home", "save": "Save"}}));
        b.deep_merge(object(json!({"ui": {"save": "Save changes"}, "food": {"title": "Food"}})));

        assert_eq!(b.lookup("ui.home"), Some("Home"));
        assert_eq!(b.lookup("ui.save"), Some("Save changes"));
        assert_eq!(b.lookup("food.title"), Some("Food"));
    }

    #[test]
    fn test_deep_merge_replaces_scalars_with_objects() {
        let mut b = bundle(json!({"meta": "legacy"}));
        b.deep_merge(object(json!({"meta": {"title": "Diet log"}})));
        assert_eq!(b.lookup("meta.title"), Some("Diet log"));
    }

    #[test]
    fn test_lookup_exact_key_before_path() {
        let b = bundle(json!({"ui.home": "flat", "ui": {"home": "nested"}}));
        assert_eq!(b.lookup("ui.home"), Some("flat"));
    }

    #[test]
    fn test_lookup_missing_and_non_string() {
        let b = bundle(json!({"ui": {"home": "Home", "count": 3}}));
        assert_eq!(b.lookup("ui.missing"), None);
        assert_eq!(b.lookup("ui.count"), None);
        assert_eq!(b.lookup("ui"), None);
        assert_eq!(b.lookup("ui.home.deeper"), None);
    }

    #[test]
    fn test_flatten_paths() {
        let b = bundle(json!({"ui": {"home": "Home"}, "title": "T"}));
        let mut flat = b.flatten();
        flat.sort();
        assert_eq!(
            flat,
            vec![("title".to_string(), "T"), ("ui.home".to_string(), "Home")]
        );
    }

    #[test]
    fn test_interpolate_known_and_unknown() {
        let mut params = HashMap::new();
        params.insert("name".to_string(), "Aiko".to_string());

        let out = interpolate("Hi {{name}}, you have {{count}} posts", &params);
        assert_eq!(out, "Hi Aiko, you have {{count}} posts");
    }

    #[test]
    fn test_interpolate_tolerates_inner_spaces() {
        let mut params = HashMap::new();
        params.insert("kg".to_string(), "62.5".to_string());
        assert_eq!(interpolate("{{ kg }} kg", &params), "62.5 kg");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("{{a}} and {{ b }} and {single}"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_split_into_modules_roundtrips_through_merge() {
        let combined = object(json!({
            "title": "Top",
            "ui": {"home": "Home"},
            "meta": {"title": "Site"},
            "articles": {"/a.html": {"title": "A", "excerpt": "E"}}
        }));

        let modules = split_into_modules(&combined);
        assert_eq!(modules[0].0, "common");

        let mut merged = TranslationBundle::empty(Language::ENGLISH);
        for (_, module) in modules {
            merged.deep_merge(module);
        }
        assert_eq!(merged.entries(), &combined);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(module_file_name(Language::CHINESE_SIMPLIFIED, "food"), "zh-CN-food.json");
        assert_eq!(combined_file_name(Language::KOREAN), "ko.json");
    }

    proptest! {
        #[test]
        fn prop_merge_with_self_is_identity(
            keys in proptest::collection::btree_map("[a-z]{1,6}", "[a-zA-Z ]{0,12}", 0..8)
        ) {
            let mut ui = Map::new();
            for (k, v) in &keys {
                ui.insert(k.clone(), Value::String(v.clone()));
            }
            let mut doc = Map::new();
            doc.insert("ui".to_string(), Value::Object(ui));

            let mut b = TranslationBundle::from_value(Language::ENGLISH, "p", Value::Object(doc.clone())).unwrap();
            b.deep_merge(doc.clone());
            prop_assert_eq!(b.entries(), &doc);
        }

        #[test]
        fn prop_interpolate_without_placeholders_is_identity(text in "[^{}]{0,40}") {
            let mut params = HashMap::new();
            params.insert("x".to_string(), "y".to_string());
            prop_assert_eq!(interpolate(&text, &params), text);
        }
    }
}
