//! Translate a page snapshot.
//!
//! Usage:
//!   site-i18n <page.json>          # Detect the language (stored preference, then LANGUAGE/LANG)
//!   site-i18n <page.json> <lang>   # Switch to an explicit language
//!
//! The translated page is printed to stdout as JSON. Logs go to stderr.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use site_i18n::config::Config;
use site_i18n::dom::Document;
use site_i18n::i18n::{
    browser_languages_from_env, BundleSource, DirBundleSource, HttpBundleSource, Language, LanguageDetector,
    MetricsReport, TranslationStore,
};
use site_i18n::regional::{country_hint, RegionalFormatProvider};
use site_i18n::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use site_i18n::switch::{LanguageSwitchController, SwitchOutcome};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Serialize)]
struct Output {
    language: String,
    locale: String,
    notice: Option<String>,
    banner: Option<String>,
    metrics: MetricsReport,
    page: Document,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("site_i18n=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(page_path) = args.first() else {
        bail!("Usage: site-i18n <page.json> [lang]");
    };
    let requested = args
        .get(1)
        .map(String::as_str)
        .map(Language::from_code)
        .transpose()
        .context("Requested language is not supported")?;

    let config = Config::from_env()?;

    let raw = std::fs::read_to_string(page_path).with_context(|| format!("Failed to read {}", page_path))?;
    let mut document: Document =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a page snapshot", page_path))?;
    document.mark_rendered();

    let prefs: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&config.state_file)
            .with_context(|| format!("Failed to open state file {}", config.state_file.display()))?,
    );
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let source: Arc<dyn BundleSource> = if config.is_remote() {
        Arc::new(
            HttpBundleSource::new(reqwest::Client::new(), &config.translations_base)
                .context("TRANSLATIONS_BASE is not a valid URL")?,
        )
    } else {
        Arc::new(DirBundleSource::new(&config.translations_base))
    };

    let store = Arc::new(TranslationStore::new(source.clone(), config.store_options()));
    if let Some(fallback) = store.fallback() {
        if let Err(e) = store.load(fallback).await {
            warn!("Fallback language '{}' unavailable: {}", fallback, e);
        }
    }

    let browser_languages = browser_languages_from_env();
    let language = match requested {
        Some(language) => language,
        None => LanguageDetector::new(prefs.clone(), browser_languages.clone()).detect(),
    };
    info!("Translating {} to '{}'", page_path, language);

    let mut controller = LanguageSwitchController::new(store.clone(), prefs, session, document);
    if config.affiliate_translations {
        controller = controller.with_affiliate_source(source);
    }

    let notice = match controller.switch_to(language).await {
        SwitchOutcome::Failed { notice, .. } => Some(notice),
        SwitchOutcome::Switched { .. } | SwitchOutcome::Ignored => None,
    };

    let regional = match &config.regional_config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read regional config {}", path.display()))?;
            RegionalFormatProvider::from_json(serde_json::from_str(&raw)?)?
        }
        None => RegionalFormatProvider::builtin(),
    };
    let active = controller.active_language();
    let hint = browser_languages.iter().find_map(|tag| country_hint(tag));
    let locale = regional.resolve_locale(active, hint).id.clone();

    let (banner, page) = controller.with_page(|page| {
        (
            page.banner.as_ref().map(|b| b.message.clone()),
            page.document.clone(),
        )
    });

    let output = Output {
        language: active.code().to_string(),
        locale,
        notice,
        banner,
        metrics: store.metrics().report(),
        page,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
