use crate::i18n::{BundleLayout, Language, StoreOptions, DEFAULT_MODULES};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Bundles
    /// Base URL or directory holding the bundle files
    pub translations_base: String,
    pub layout: BundleLayout,

    // Fallback
    pub fallback_language: Option<Language>,

    // Affiliate links
    pub affiliate_translations: bool,

    // Persisted client state
    pub state_file: PathBuf,

    // Regional profiles document
    pub regional_config: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let layout = match std::env::var("TRANSLATION_LAYOUT")
            .unwrap_or_else(|_| "modular".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "modular" => {
                let modules = std::env::var("TRANSLATION_MODULES")
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|m| !m.is_empty())
                            .map(String::from)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_else(|_| DEFAULT_MODULES.iter().map(|m| m.to_string()).collect());
                if modules.is_empty() {
                    bail!("TRANSLATION_MODULES must name at least one module");
                }
                BundleLayout::Modular(modules)
            }
            "combined" => BundleLayout::Combined,
            other => bail!("TRANSLATION_LAYOUT must be 'modular' or 'combined', got '{}'", other),
        };

        let fallback_enabled = parse_flag("FALLBACK_ENABLED", true)?;
        let fallback_language = if fallback_enabled {
            let code = std::env::var("FALLBACK_LANGUAGE").unwrap_or_else(|_| "en".to_string());
            Some(Language::from_code(&code).context("FALLBACK_LANGUAGE is not a supported language")?)
        } else {
            None
        };

        Ok(Self {
            // Bundles
            translations_base: std::env::var("TRANSLATIONS_BASE")
                .unwrap_or_else(|_| "translations".to_string()),
            layout,

            fallback_language,

            affiliate_translations: parse_flag("AFFILIATE_TRANSLATIONS", true)?,

            state_file: std::env::var("STATE_FILE")
                .unwrap_or_else(|_| ".site-i18n-state.json".to_string())
                .into(),

            regional_config: std::env::var("REGIONAL_CONFIG").ok().map(PathBuf::from),
        })
    }

    /// Whether bundles are fetched over HTTP rather than read from disk.
    pub fn is_remote(&self) -> bool {
        self.translations_base.starts_with("http://") || self.translations_base.starts_with("https://")
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            layout: self.layout.clone(),
            fallback: self.fallback_language,
        }
    }
}

fn parse_flag(name: &str, default: bool) -> Result<bool> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be a boolean, got '{}'", name, other),
    }
}
