//! Translation store: loads, merges and caches bundles per language.

use crate::i18n::bundle::{combined_file_name, interpolate, module_file_name};
use crate::i18n::source::BundleSource;
use crate::i18n::{BundleValidator, Language, LoadError, TranslationBundle, TranslationMetrics};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Modules fetched for every language when no explicit list is configured.
pub const DEFAULT_MODULES: &[&str] = &[
    "common",
    "ui",
    "sections",
    "categories",
    "articles",
    "excerpts",
    "meta",
    "profile",
    "weight",
    "exercise",
    "food",
];

/// How a language's bundle is split into resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleLayout {
    /// One `{lang}-{module}.json` per module, merged in declared order.
    /// A module with no resource counts as empty, but at least one must exist.
    Modular(Vec<String>),
    /// A single `{lang}.json`
    Combined,
}

impl BundleLayout {
    pub fn default_modular() -> Self {
        BundleLayout::Modular(DEFAULT_MODULES.iter().map(|m| m.to_string()).collect())
    }

    fn resource_names(&self, language: Language) -> Vec<String> {
        match self {
            BundleLayout::Modular(modules) => modules
                .iter()
                .map(|module| module_file_name(language, module))
                .collect(),
            BundleLayout::Combined => vec![combined_file_name(language)],
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub layout: BundleLayout,

    /// Language consulted when a key is missing; `None` disables fallback
    pub fallback: Option<Language>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            layout: BundleLayout::default_modular(),
            fallback: Some(Language::ENGLISH),
        }
    }
}

type LoadResult = Result<Arc<TranslationBundle>, LoadError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Slot {
    Loading(SharedLoad),
    Loaded(Arc<TranslationBundle>),
}

#[derive(Default)]
struct State {
    slots: HashMap<Language, Slot>,
    /// Partial bundles merged while their language was still loading
    pending: HashMap<Language, Map<String, Value>>,
}

pub struct TranslationStore {
    source: Arc<dyn BundleSource>,
    options: StoreOptions,
    state: Mutex<State>,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationStore {
    pub fn new(source: Arc<dyn BundleSource>, options: StoreOptions) -> Self {
        Self {
            source,
            options,
            state: Mutex::new(State::default()),
            metrics: Arc::new(TranslationMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    pub fn fallback(&self) -> Option<Language> {
        self.options.fallback
    }

    /// Load the bundle for a language.
    ///
    /// The default language resolves immediately with an empty bundle. A cached
    /// bundle is returned without fetching. Concurrent calls for the same
    /// language share one fetch. On failure the language stays unloaded and
    /// nothing is retried.
    pub async fn load(&self, language: Language) -> LoadResult {
        if language.is_default() {
            return Ok(Arc::new(TranslationBundle::empty(language)));
        }

        let load = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            match state.slots.get(&language) {
                Some(Slot::Loaded(bundle)) => {
                    self.metrics.record_cache_hit();
                    debug!("Bundle for '{}' served from cache", language);
                    return Ok(bundle.clone());
                }
                Some(Slot::Loading(in_flight)) => {
                    self.metrics.record_shared_wait();
                    debug!("Joining in-flight load for '{}'", language);
                    in_flight.clone()
                }
                None => {
                    self.metrics.record_cache_miss();
                    let load = fetch_bundle(
                        self.source.clone(),
                        self.options.layout.clone(),
                        language,
                        self.metrics.clone(),
                    )
                    .boxed()
                    .shared();
                    state.slots.insert(language, Slot::Loading(load.clone()));
                    load
                }
            }
        };

        let result = load.clone().await;

        let finished = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            let owns_slot = matches!(
                state.slots.get(&language),
                Some(Slot::Loading(in_flight)) if in_flight.ptr_eq(&load)
            );
            if !owns_slot {
                // Another waiter on the same fetch already settled the slot
                return match state.slots.get(&language) {
                    Some(Slot::Loaded(bundle)) => Ok(bundle.clone()),
                    _ => result,
                };
            }

            match result {
                Ok(bundle) => {
                    let bundle = match state.pending.remove(&language) {
                        Some(partial) => {
                            let mut merged = (*bundle).clone();
                            merged.deep_merge(partial);
                            Arc::new(merged)
                        }
                        None => bundle,
                    };
                    state.slots.insert(language, Slot::Loaded(bundle.clone()));
                    Ok(bundle)
                }
                Err(e) => {
                    state.slots.remove(&language);
                    state.pending.remove(&language);
                    Err(e)
                }
            }
        };

        match &finished {
            Ok(bundle) => {
                info!(
                    "Loaded bundle for '{}' ({} entries)",
                    language,
                    bundle.flatten().len()
                );
                self.validate_against_fallback(bundle);
            }
            Err(e) => {
                self.metrics.record_load_failure();
                warn!(
                    "Failed to load bundle for '{}', keeping default-language content: {}",
                    language, e
                );
            }
        }
        finished
    }

    /// Evict a language and load it again.
    pub async fn reload(&self, language: Language) -> LoadResult {
        {
            let mut state = lock(&self.state);
            if matches!(state.slots.get(&language), Some(Slot::Loaded(_))) {
                state.slots.remove(&language);
            }
        }
        self.load(language).await
    }

    /// Deep-merge a partial bundle into a language's cached bundle.
    ///
    /// Creates the bundle when nothing is cached. While a load is in flight the
    /// partial is held back and merged once the load succeeds.
    pub fn merge(&self, language: Language, partial: Map<String, Value>) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        match state.slots.get_mut(&language) {
            Some(Slot::Loaded(bundle)) => Arc::make_mut(bundle).deep_merge(partial),
            Some(Slot::Loading(_)) => {
                let mut held = TranslationBundle::empty(language);
                if let Some(earlier) = state.pending.remove(&language) {
                    held.deep_merge(earlier);
                }
                held.deep_merge(partial);
                state.pending.insert(language, held.entries().clone());
            }
            None => {
                let mut bundle = TranslationBundle::empty(language);
                bundle.deep_merge(partial);
                state.slots.insert(language, Slot::Loaded(Arc::new(bundle)));
            }
        }
    }

    /// Whether a usable bundle exists. The default language always has one.
    pub fn is_loaded(&self, language: Language) -> bool {
        language.is_default() || self.cached(language).is_some()
    }

    /// The cached bundle of a language, if it finished loading.
    pub fn cached(&self, language: Language) -> Option<Arc<TranslationBundle>> {
        match lock(&self.state).slots.get(&language) {
            Some(Slot::Loaded(bundle)) => Some(bundle.clone()),
            _ => None,
        }
    }

    /// Resolve a key to display text. Never fails.
    ///
    /// Order: the language's bundle, then the fallback language's bundle (if
    /// enabled), then the key itself. With `count`, `{key}_one` (count 1) or
    /// `{key}_other` is tried before `{key}`, and `{{count}}` is offered as a
    /// parameter.
    pub fn get(
        &self,
        language: Language,
        key: &str,
        params: Option<&HashMap<String, String>>,
        count: Option<u64>,
    ) -> String {
        let mut candidates = Vec::with_capacity(2);
        if let Some(n) = count {
            let suffix = if n == 1 { "one" } else { "other" };
            candidates.push(format!("{}_{}", key, suffix));
        }
        candidates.push(key.to_string());

        let mut languages = vec![language];
        if let Some(fallback) = self.options.fallback {
            if fallback != language {
                languages.push(fallback);
            }
        }

        let resolved = languages.into_iter().find_map(|lang| {
            let bundle = self.cached(lang)?;
            candidates
                .iter()
                .find_map(|candidate| bundle.lookup(candidate).map(str::to_string))
        });

        let Some(template) = resolved else {
            debug!("No translation for '{}' in '{}'", key, language);
            return key.to_string();
        };

        let mut values = params.cloned().unwrap_or_default();
        if let Some(n) = count {
            values.entry("count".to_string()).or_insert_with(|| n.to_string());
        }
        interpolate(&template, &values)
    }

    /// Shorthand for `get` without parameters.
    pub fn t(&self, language: Language, key: &str) -> String {
        self.get(language, key, None, None)
    }

    fn validate_against_fallback(&self, bundle: &TranslationBundle) {
        let Some(fallback) = self.options.fallback else {
            return;
        };
        if fallback == bundle.language() {
            return;
        }
        let Some(reference) = self.cached(fallback) else {
            return;
        };

        let report = BundleValidator::validate(&reference, bundle);
        if report.has_errors() {
            warn!(
                "Bundle validation errors for '{}': {:?}",
                bundle.language(),
                report.errors
            );
        }
        if report.has_warnings() {
            debug!(
                "{} keys of '{}' will use the '{}' fallback",
                report.warnings.len(),
                bundle.language(),
                fallback
            );
        }
    }
}

async fn fetch_bundle(
    source: Arc<dyn BundleSource>,
    layout: BundleLayout,
    language: Language,
    metrics: Arc<TranslationMetrics>,
) -> LoadResult {
    let resources = layout.resource_names(language);
    let optional = matches!(layout, BundleLayout::Modular(_));
    let fetches = resources.iter().map(|name| {
        metrics.record_fetch();
        let fetch = source.fetch_json(name);
        async move {
            match fetch.await {
                Ok(document) => Ok(Some(document)),
                Err(LoadError::NotFound { resource }) if optional => {
                    debug!("Module {} not published, treating it as empty", resource);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }
    });
    let documents = future::try_join_all(fetches).await?;

    if documents.iter().all(Option::is_none) {
        return Err(LoadError::NotFound {
            resource: resources.first().cloned().unwrap_or_else(|| combined_file_name(language)),
        });
    }

    let mut bundle = TranslationBundle::empty(language);
    for (name, document) in resources.iter().zip(documents) {
        match document {
            Some(Value::Object(module)) => bundle.deep_merge(module),
            Some(_) => {
                return Err(LoadError::NotAnObject {
                    resource: name.clone(),
                })
            }
            None => {}
        }
    }
    Ok(Arc::new(bundle))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::source::StaticBundleSource;
    use proptest::prelude::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn modular(modules: &[&str]) -> StoreOptions {
        StoreOptions {
            layout: BundleLayout::Modular(modules.iter().map(|m| m.to_string()).collect()),
            fallback: Some(Language::ENGLISH),
        }
    }

    fn source() -> StaticBundleSource {
        StaticBundleSource::new()
            .with("en-common.json", json!({"common": {"save": "Save", "cancel": "Cancel"}}))
            .with("en-ui.json", json!({"ui": {"home": "Home", "posts_one": "{{count}} post", "posts_other": "{{count}} posts"}}))
            .with("es-common.json", json!({"common": {"save": "Guardar"}}))
            .with("es-ui.json", json!({"ui": {"home": "Inicio", "greet": "Hola {{name}}"}, "common": {"save": "Guardar cambios"}}))
    }

    fn store_with(source: StaticBundleSource) -> TranslationStore {
        TranslationStore::new(Arc::new(source), modular(&["common", "ui"]))
    }

    #[tokio::test]
    async fn test_default_language_loads_empty_without_fetch() {
        let source = source();
        let store = store_with(source.clone());

        let bundle = store.load(Language::JAPANESE).await.unwrap();
        assert!(bundle.is_empty());
        assert_eq!(bundle.language(), Language::JAPANESE);
        assert_eq!(store.metrics().fetches(), 0);
        assert!(store.is_loaded(Language::JAPANESE));
    }

    #[tokio::test]
    async fn test_load_merges_modules_in_order() {
        let store = store_with(source());

        let bundle = store.load(Language::SPANISH).await.unwrap();
        // es-ui.json is declared after es-common.json and overrides it
        assert_eq!(bundle.lookup("common.save"), Some("Guardar cambios"));
        assert_eq!(bundle.lookup("ui.home"), Some("Inicio"));
    }

    #[tokio::test]
    async fn test_load_is_cached() {
        let source = source();
        let store = store_with(source.clone());

        assert_ok!(store.load(Language::ENGLISH).await);
        assert_ok!(store.load(Language::ENGLISH).await);

        assert_eq!(source.fetch_count("en-common.json"), 1);
        assert_eq!(store.metrics().cache_hits(), 1);
        assert_eq!(store.metrics().cache_misses(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = source();
        let store = store_with(source.clone());

        let (first, second) = tokio::join!(store.load(Language::ENGLISH), store.load(Language::ENGLISH));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetch_count("en-common.json"), 1);
        assert_eq!(source.fetch_count("en-ui.json"), 1);
        assert_eq!(store.metrics().shared_waits(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_language_unloaded() {
        let source = StaticBundleSource::new()
            .with("ko-common.json", json!({"common": {}}))
            .with("ko-ui.json", json!(["not", "a", "module"]));
        let store = store_with(source.clone());

        let err = assert_err!(store.load(Language::KOREAN).await);
        assert_eq!(err.resource(), "ko-ui.json");
        assert!(!store.is_loaded(Language::KOREAN));
        assert_eq!(store.metrics().load_failures(), 1);

        // Nothing retries on its own; a later explicit load fetches again
        assert_eq!(source.fetch_count("ko-ui.json"), 1);
        source.insert("ko-ui.json", json!({"ui": {"home": "홈"}}));
        let bundle = store.load(Language::KOREAN).await.unwrap();
        assert_eq!(bundle.lookup("ui.home"), Some("홈"));
    }

    #[tokio::test]
    async fn test_missing_modules_count_as_empty() {
        let source = StaticBundleSource::new().with("ko-ui.json", json!({"ui": {"home": "홈"}}));
        let store = store_with(source.clone());

        let bundle = store.load(Language::KOREAN).await.unwrap();
        assert_eq!(bundle.lookup("ui.home"), Some("홈"));
        assert_eq!(source.fetch_count("ko-common.json"), 1);
    }

    #[tokio::test]
    async fn test_language_with_no_modules_fails() {
        let store = store_with(StaticBundleSource::new());

        let err = assert_err!(store.load(Language::KOREAN).await);
        assert_eq!(
            err,
            LoadError::NotFound {
                resource: "ko-common.json".to_string()
            }
        );
        assert!(!store.is_loaded(Language::KOREAN));
    }

    #[tokio::test]
    async fn test_missing_combined_bundle_fails() {
        let store = TranslationStore::new(
            Arc::new(StaticBundleSource::new()),
            StoreOptions {
                layout: BundleLayout::Combined,
                fallback: None,
            },
        );
        let err = assert_err!(store.load(Language::SPANISH).await);
        assert_eq!(err.resource(), "es.json");
    }

    #[tokio::test]
    async fn test_default_layout_loads_split_output() {
        let combined = object(json!({
            "ui": {"home": "Home"},
            "excerpts": {"articles/protein.html": "Why protein matters"},
            "meta": {"title": "Diet Blog"}
        }));
        let source = StaticBundleSource::new();
        for (module, content) in crate::i18n::bundle::split_into_modules(&combined) {
            source.insert(&module_file_name(Language::ENGLISH, &module), Value::Object(content));
        }
        let store = TranslationStore::new(Arc::new(source), StoreOptions::default());

        let bundle = store.load(Language::ENGLISH).await.unwrap();
        assert_eq!(bundle.lookup("ui.home"), Some("Home"));
        assert_eq!(bundle.lookup("meta.title"), Some("Diet Blog"));
        assert_eq!(bundle.entries()["excerpts"]["articles/protein.html"], "Why protein matters");
    }

    #[tokio::test]
    async fn test_concurrent_failure_reported_to_every_waiter() {
        let store = store_with(StaticBundleSource::new());
        let (first, second) = tokio::join!(store.load(Language::KOREAN), store.load(Language::KOREAN));

        assert!(first.is_err());
        assert!(second.is_err());
        assert_eq!(store.metrics().load_failures(), 1);
    }

    #[tokio::test]
    async fn test_non_object_module_fails() {
        let source = StaticBundleSource::new()
            .with("es.json", json!("just a string"));
        let store = TranslationStore::new(
            Arc::new(source),
            StoreOptions {
                layout: BundleLayout::Combined,
                fallback: None,
            },
        );

        let err = store.load(Language::SPANISH).await.unwrap_err();
        assert_eq!(
            err,
            LoadError::NotAnObject {
                resource: "es.json".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_get_exact_fallback_and_key() {
        let store = store_with(source());
        store.load(Language::ENGLISH).await.unwrap();
        store.load(Language::SPANISH).await.unwrap();

        assert_eq!(store.t(Language::SPANISH, "ui.home"), "Inicio");
        assert_eq!(store.t(Language::SPANISH, "common.cancel"), "Cancel");
        assert_eq!(store.t(Language::SPANISH, "ui.unknown"), "ui.unknown");
    }

    #[tokio::test]
    async fn test_get_without_fallback_returns_key() {
        let source = source();
        let store = TranslationStore::new(
            Arc::new(source),
            StoreOptions {
                layout: BundleLayout::Modular(vec!["common".to_string(), "ui".to_string()]),
                fallback: None,
            },
        );
        store.load(Language::ENGLISH).await.unwrap();
        store.load(Language::SPANISH).await.unwrap();

        assert_eq!(store.t(Language::SPANISH, "common.cancel"), "common.cancel");
    }

    #[tokio::test]
    async fn test_get_interpolates_params() {
        let store = store_with(source());
        store.load(Language::SPANISH).await.unwrap();

        let mut params = HashMap::new();
        params.insert("name".to_string(), "Lucía".to_string());
        assert_eq!(
            store.get(Language::SPANISH, "ui.greet", Some(&params), None),
            "Hola Lucía"
        );
        assert_eq!(store.get(Language::SPANISH, "ui.greet", None, None), "Hola {{name}}");
    }

    #[tokio::test]
    async fn test_get_plural_forms() {
        let store = store_with(source());
        store.load(Language::ENGLISH).await.unwrap();

        assert_eq!(store.get(Language::ENGLISH, "ui.posts", None, Some(1)), "1 post");
        assert_eq!(store.get(Language::ENGLISH, "ui.posts", None, Some(4)), "4 posts");
        // Plural lookups fall back through the chain like any other key
        assert_eq!(store.get(Language::SPANISH, "ui.posts", None, Some(0)), "0 posts");
    }

    #[tokio::test]
    async fn test_merge_into_loaded_bundle_keeps_old_snapshots() {
        let store = store_with(source());
        let before = store.load(Language::SPANISH).await.unwrap();

        store.merge(Language::SPANISH, object(json!({"ui": {"home": "Portada"}})));

        assert_eq!(before.lookup("ui.home"), Some("Inicio"));
        assert_eq!(store.t(Language::SPANISH, "ui.home"), "Portada");
        assert_eq!(store.t(Language::SPANISH, "ui.greet"), "Hola {{name}}");
    }

    #[tokio::test]
    async fn test_merge_creates_bundle_when_absent() {
        let store = store_with(StaticBundleSource::new());
        store.merge(Language::KOREAN, object(json!({"ui": {"home": "홈"}})));

        assert!(store.is_loaded(Language::KOREAN));
        assert_eq!(store.load(Language::KOREAN).await.unwrap().lookup("ui.home"), Some("홈"));
    }

    #[tokio::test]
    async fn test_merge_while_loading_is_applied_after_load() {
        let store = store_with(source());

        let load = store.load(Language::ENGLISH);
        futures::pin_mut!(load);
        assert!(futures::poll!(load.as_mut()).is_pending());

        store.merge(Language::ENGLISH, object(json!({"ui": {"extra": "Extra"}})));

        let bundle = load.await.unwrap();
        assert_eq!(bundle.lookup("ui.extra"), Some("Extra"));
        assert_eq!(bundle.lookup("ui.home"), Some("Home"));
    }

    #[tokio::test]
    async fn test_reload_fetches_again() {
        let source = source();
        let store = store_with(source.clone());
        store.load(Language::ENGLISH).await.unwrap();

        source.insert("en-ui.json", json!({"ui": {"home": "Start"}}));
        let bundle = store.reload(Language::ENGLISH).await.unwrap();

        assert_eq!(bundle.lookup("ui.home"), Some("Start"));
        assert_eq!(source.fetch_count("en-ui.json"), 2);
    }

    #[tokio::test]
    async fn test_default_language_get_uses_merged_then_fallback() {
        let store = store_with(source());
        store.load(Language::ENGLISH).await.unwrap();
        store.merge(Language::JAPANESE, object(json!({"ui": {"home": "ホーム"}})));

        assert_eq!(store.t(Language::JAPANESE, "ui.home"), "ホーム");
        assert_eq!(store.t(Language::JAPANESE, "common.save"), "Save");
        // The default language still loads as the no-op bundle
        assert!(store.load(Language::JAPANESE).await.unwrap().is_empty());
    }

    #[test]
    fn test_resource_names_per_layout() {
        let modular = BundleLayout::Modular(vec!["common".to_string(), "food".to_string()]);
        assert_eq!(
            modular.resource_names(Language::KOREAN),
            vec!["ko-common.json", "ko-food.json"]
        );
        assert_eq!(BundleLayout::Combined.resource_names(Language::SPANISH), vec!["es.json"]);
        assert_eq!(
            BundleLayout::default_modular().resource_names(Language::ENGLISH).len(),
            DEFAULT_MODULES.len()
        );
    }

    proptest! {
        #[test]
        fn prop_get_never_returns_empty_for_unknown_keys(key in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}") {
            let store = store_with(StaticBundleSource::new());
            for lang in [Language::JAPANESE, Language::ENGLISH, Language::KOREAN] {
                prop_assert_eq!(store.t(lang, &key), key.clone());
            }
        }
    }
}
