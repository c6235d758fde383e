//! Interactive language switching.
//!
//! One switch runs at a time. A request arriving while another is in flight
//! is dropped, not queued. The page lock is only held between suspension
//! points, never across an `.await`.

use crate::dom::{has_affiliate_links, AffiliateBundle, ApplyReport, Document, DomTranslationApplier, PageKind};
use crate::i18n::{BundleSource, Language, LoadError, TranslationStore};
use crate::storage::{KeyValueStore, BANNER_DISMISSED_KEY, PREFERRED_LANGUAGE_KEY};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// State of the language switch control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageIndicator {
    /// Language the control currently represents
    pub language: Language,
    pub label: String,
    pub enabled: bool,
}

impl LanguageIndicator {
    pub fn settled(language: Language) -> Self {
        Self {
            language,
            label: language.native_name().to_string(),
            enabled: true,
        }
    }
}

/// The informational banner suggesting machine translation of article bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateBanner {
    pub language: Language,
    pub message: String,
    pub dismiss_label: String,
}

/// The live page and everything that writes to it.
pub struct Page {
    pub document: Document,
    pub applier: DomTranslationApplier,
    pub banner: Option<TranslateBanner>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched { language: Language, banner_shown: bool },
    /// Another switch was in flight
    Ignored,
    /// The bundle could not be loaded; the page was not touched
    Failed { language: Language, notice: String },
}

pub struct LanguageSwitchController {
    store: Arc<TranslationStore>,
    affiliate_source: Option<Arc<dyn BundleSource>>,
    affiliate_cache: Mutex<HashMap<Language, Arc<AffiliateBundle>>>,
    prefs: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    page: Mutex<Page>,
    indicator: Mutex<LanguageIndicator>,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LanguageSwitchController {
    /// `document` is the page as rendered natively in the default language.
    pub fn new(
        store: Arc<TranslationStore>,
        prefs: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        document: Document,
    ) -> Self {
        let default = Language::default_language();
        Self {
            store,
            affiliate_source: None,
            affiliate_cache: Mutex::new(HashMap::new()),
            prefs,
            session,
            page: Mutex::new(Page {
                document,
                applier: DomTranslationApplier::new(default),
                banner: None,
            }),
            indicator: Mutex::new(LanguageIndicator::settled(default)),
            busy: AtomicBool::new(false),
        }
    }

    /// Enable the affiliate pass, fetching `affiliate-{lang}.json` from `source`.
    pub fn with_affiliate_source(mut self, source: Arc<dyn BundleSource>) -> Self {
        self.affiliate_source = Some(source);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn indicator(&self) -> LanguageIndicator {
        lock(&self.indicator).clone()
    }

    /// Language currently applied to the page.
    pub fn active_language(&self) -> Language {
        self.page()
            .applier
            .active_language()
            .unwrap_or_else(Language::default_language)
    }

    pub fn with_page<R>(&self, f: impl FnOnce(&Page) -> R) -> R {
        f(&self.page())
    }

    /// Run a page mutation, as a renderer would, without notifying the applier.
    pub fn with_page_mut<R>(&self, f: impl FnOnce(&mut Page) -> R) -> R {
        f(&mut self.page())
    }

    /// Switch the page to `language`.
    pub async fn switch_to(&self, language: Language) -> SwitchOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("Ignoring switch to '{}': another switch is in flight", language);
            return SwitchOutcome::Ignored;
        };

        let previous = self.indicator();
        self.set_indicator(LanguageIndicator {
            language: previous.language,
            label: previous.language.strings().loading_label.to_string(),
            enabled: false,
        });

        if let Err(e) = self.prefs.set(PREFERRED_LANGUAGE_KEY, language.code()) {
            warn!("Failed to persist language preference: {}", e);
        }

        let bundle = match self.store.load(language).await {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Switch to '{}' failed: {}", language, e);
                self.set_indicator(previous.clone());
                return SwitchOutcome::Failed {
                    language,
                    notice: previous.language.strings().switch_failed_notice.to_string(),
                };
            }
        };

        let (report, affiliate_links) = {
            let mut page = self.page();
            let page = &mut *page;
            let report = page.applier.apply(&mut page.document, bundle);
            page.document.set_lang(language.html_lang());
            (report, has_affiliate_links(&page.document))
        };

        if affiliate_links && !language.is_default() {
            self.apply_affiliate(language).await;
        }

        self.set_indicator(LanguageIndicator::settled(language));
        let banner_shown = self.update_banner(language);

        info!(
            "Switched page to '{}' ({} translated, banner {})",
            language,
            report.translated,
            if banner_shown { "shown" } else { "hidden" }
        );
        SwitchOutcome::Switched {
            language,
            banner_shown,
        }
    }

    /// Notification from a renderer that new content was inserted.
    pub fn content_rendered(&self) -> ApplyReport {
        let mut page = self.page();
        let page = &mut *page;
        page.applier.content_rendered(&mut page.document)
    }

    /// Hide the translate banner for the rest of the session.
    pub fn dismiss_banner(&self) {
        self.page().banner = None;
        if let Err(e) = self.session.set(BANNER_DISMISSED_KEY, "true") {
            warn!("Failed to record banner dismissal: {}", e);
        }
    }

    async fn apply_affiliate(&self, language: Language) {
        match self.load_affiliate(language).await {
            Ok(Some(bundle)) => {
                let mut page = self.page();
                let page = &mut *page;
                let report = page.applier.apply_affiliate(&mut page.document, bundle);
                debug!("Localized {} affiliate targets", report.translated);
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Affiliate translations for '{}' unavailable, links left as is: {}",
                language, e
            ),
        }
    }

    async fn load_affiliate(&self, language: Language) -> Result<Option<Arc<AffiliateBundle>>, LoadError> {
        let Some(source) = &self.affiliate_source else {
            return Ok(None);
        };
        if let Some(cached) = lock(&self.affiliate_cache).get(&language) {
            return Ok(Some(cached.clone()));
        }

        let resource = affiliate_file_name(language);
        let value = source.fetch_json(&resource).await?;
        let bundle: AffiliateBundle = serde_json::from_value(value).map_err(|e| LoadError::Parse {
            resource,
            message: e.to_string(),
        })?;

        let bundle = Arc::new(bundle);
        lock(&self.affiliate_cache).insert(language, bundle.clone());
        Ok(Some(bundle))
    }

    fn update_banner(&self, language: Language) -> bool {
        let mut page = self.page();
        let dismissed = self.session.get(BANNER_DISMISSED_KEY).is_some();
        let show = !language.is_default() && page.document.page() == PageKind::Article && !dismissed;

        page.banner = show.then(|| TranslateBanner {
            language,
            message: language.strings().translate_banner.to_string(),
            dismiss_label: language.strings().translate_banner_dismiss.to_string(),
        });
        show
    }

    fn set_indicator(&self, indicator: LanguageIndicator) {
        *lock(&self.indicator) = indicator;
    }

    fn page(&self) -> MutexGuard<'_, Page> {
        lock(&self.page)
    }
}

/// `affiliate-{lang}.json`
pub fn affiliate_file_name(language: Language) -> String {
    format!("affiliate-{}.json", language.code())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
