//! Split combined per-language bundles into per-module files.
//!
//! Usage:
//!   split-bundles <dir>            # Split every {lang}.json in <dir>
//!   split-bundles <dir> <lang>...  # Split only the given languages
//!
//! Writes `{lang}-{module}.json` next to the combined file.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use site_i18n::i18n::bundle::{combined_file_name, module_file_name, split_into_modules};
use site_i18n::i18n::{Language, LanguageRegistry};
use std::path::Path;
use tracing::{info, warn};

fn split_language(dir: &Path, language: Language) -> Result<usize> {
    let combined_path = dir.join(combined_file_name(language));
    let raw = std::fs::read_to_string(&combined_path)
        .with_context(|| format!("Failed to read {}", combined_path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", combined_path.display()))?;
    let Value::Object(combined) = value else {
        bail!("{} is not a JSON object", combined_path.display());
    };

    let modules = split_into_modules(&combined);
    for (module, content) in &modules {
        let path = dir.join(module_file_name(language, module));
        let json = serde_json::to_string_pretty(content)?;
        std::fs::write(&path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }
    Ok(modules.len())
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("split_bundles=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(dir) = args.first() else {
        bail!("Usage: split-bundles <dir> [lang...]");
    };
    let dir = Path::new(dir);

    let languages: Vec<Language> = if args.len() > 1 {
        args[1..]
            .iter()
            .map(|code| Language::from_code(code).with_context(|| format!("Unsupported language '{}'", code)))
            .collect::<Result<_>>()?
    } else {
        LanguageRegistry::get()
            .list_enabled()
            .into_iter()
            .filter(|config| !config.is_default)
            .filter_map(|config| Language::from_code(config.code).ok())
            .collect()
    };

    let mut written = 0;
    for language in languages {
        if !dir.join(combined_file_name(language)).exists() {
            warn!("No combined bundle for '{}', skipping", language);
            continue;
        }
        written += split_language(dir, language)?;
    }

    info!("Split into {} module files", written);
    Ok(())
}
