//! Bundle quality validation.
//!
//! Compares a freshly loaded bundle against a reference bundle (the fallback
//! language) and reports keys that will silently fall back and translations
//! whose placeholders drifted from the reference.

use crate::i18n::bundle::placeholders;
use crate::i18n::TranslationBundle;
use std::collections::{BTreeSet, HashMap};

/// Validation report containing errors and warnings about a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Problems that make a translation render wrongly
    pub errors: Vec<String>,

    /// Problems that only degrade the result (e.g. a fallback is used)
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

pub struct BundleValidator;

impl BundleValidator {
    /// Validate `candidate` against `reference`.
    ///
    /// - a key present in the reference but missing from the candidate is a
    ///   warning (lookups will use the fallback)
    /// - a translation whose set of `{{placeholders}}` differs from the
    ///   reference is an error (a value would be dropped or left verbatim)
    pub fn validate(reference: &TranslationBundle, candidate: &TranslationBundle) -> ValidationReport {
        let mut report = ValidationReport::new();

        let translated: HashMap<String, &str> = candidate.flatten().into_iter().collect();

        for (key, reference_text) in reference.flatten() {
            let Some(candidate_text) = translated.get(&key) else {
                report.warnings.push(format!(
                    "Missing key '{}' in {} bundle",
                    key,
                    candidate.language()
                ));
                continue;
            };

            let expected: BTreeSet<_> = placeholders(reference_text).into_iter().collect();
            let actual: BTreeSet<_> = placeholders(candidate_text).into_iter().collect();
            if expected != actual {
                report.errors.push(format!(
                    "Placeholder mismatch for '{}': {} has {:?}, {} has {:?}",
                    key,
                    reference.language(),
                    expected,
                    candidate.language(),
                    actual
                ));
            }
        }

        report
    }
}
