//! Internationalization (i18n) core.
//!
//! # Architecture
//!
//! - `registry`: single source of truth for supported languages and their metadata
//! - `language`: validated `Language` handle onto the registry
//! - `detector`: resolves the active language (stored preference, browser, default)
//! - `bundle`: translation bundles, deep-merge, lookup and interpolation
//! - `source`: where bundle files come from (HTTP, directory, memory)
//! - `store`: loads, de-duplicates, caches and queries bundles per language
//! - `validator`: checks a bundle against the fallback bundle
//! - `metrics`: per-store loading counters
//! - `strings`: strings of the language switch control itself
//!
//! # Example
//!
//! ```rust,ignore
//! use site_i18n::i18n::{Language, StoreOptions, TranslationStore};
//!
//! let store = TranslationStore::new(source, StoreOptions::default());
//! store.load(Language::ENGLISH).await?;
//! let label = store.t(Language::ENGLISH, "ui.home");
//! ```

pub mod bundle;
mod detector;
mod error;
mod language;
mod metrics;
mod registry;
pub mod source;
mod store;
mod strings;
mod validator;

pub use bundle::TranslationBundle;
pub use detector::{browser_languages_from_env, match_browser_tag, LanguageDetector};
pub use error::{I18nError, LoadError};
pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use source::{BundleSource, DirBundleSource, HttpBundleSource, StaticBundleSource};
pub use store::{BundleLayout, StoreOptions, TranslationStore, DEFAULT_MODULES};
pub use strings::LanguageStrings;
pub use validator::{BundleValidator, ValidationReport};
