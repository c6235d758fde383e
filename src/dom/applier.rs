//! Applies a translation bundle to a document and restores the originals.
//!
//! # Invariants
//!
//! 1. **Snapshot once**: the original value of a `(node, target)` pair is
//!    captured the first time the applier overwrites it and never replaced by
//!    translated content.
//! 2. **Restore before apply**: `apply` always restores first, so applying
//!    the same bundle twice equals applying it once.
//! 3. **Owner writes win**: a node re-rendered by the page after the applier
//!    wrote it is neither restored to the stale snapshot nor skipped by the next
//!    pass; its new content becomes the new original.

use crate::dom::affiliate::{self, AffiliateBundle};
use crate::dom::document::{Document, Element, NodeId, PageMeta, Target};
use crate::i18n::{Language, TranslationBundle};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Flat UI string key (`ui.<key>`, then `<key>`).
pub const UI_ATTR: &str = "data-i18n";

/// Attribute translations: `placeholder=ui.search;title=ui.search_hint`.
pub const ATTRS_ATTR: &str = "data-i18n-attr";

/// Section heading key (`sections.<key>`).
pub const SECTION_ATTR: &str = "data-i18n-section";

/// Stable category id (`categories.<id>`).
pub const CATEGORY_ATTR: &str = "data-i18n-category";

/// Class of category labels without a stable id, matched by their text.
pub const CATEGORY_CLASS: &str = "category";

/// Excerpt key (`excerpts.<key>`, then `articles.<key>.excerpt`).
pub const EXCERPT_ATTR: &str = "data-i18n-excerpt";

const SOCIAL_TITLE_TAGS: &[&str] = &["og:title", "twitter:title"];
const SOCIAL_DESCRIPTION_TAGS: &[&str] = &["og:description", "twitter:description"];

/// Outcome of one translation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Targets newly translated by this pass
    pub translated: usize,
    /// Targets left alone: already translated, or missing on the node
    pub skipped: usize,
}

type SnapshotKey = (NodeId, Target);

pub struct DomTranslationApplier {
    default_language: Language,
    snapshots: HashMap<SnapshotKey, String>,
    written: HashSet<SnapshotKey>,
    /// Node revision right after the applier's last write to it
    written_at: HashMap<NodeId, u64>,
    meta_snapshot: Option<PageMeta>,
    active: Option<Arc<TranslationBundle>>,
    affiliate: Option<Arc<AffiliateBundle>>,
    applied_revision: u64,
}

impl DomTranslationApplier {
    pub fn new(default_language: Language) -> Self {
        Self {
            default_language,
            snapshots: HashMap::new(),
            written: HashSet::new(),
            written_at: HashMap::new(),
            meta_snapshot: None,
            active: None,
            affiliate: None,
            applied_revision: 0,
        }
    }

    /// Language of the bundle currently applied; `None` while untranslated.
    pub fn active_language(&self) -> Option<Language> {
        self.active.as_ref().map(|bundle| bundle.language())
    }

    pub fn is_translated(&self) -> bool {
        self.active.is_some() || self.affiliate.is_some() || !self.snapshots.is_empty()
    }

    /// Number of preserved originals.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Put every preserved original back. A no-op on an untranslated document.
    pub fn restore(&mut self, doc: &mut Document) {
        if !self.is_translated() {
            return;
        }

        let rerendered: HashSet<NodeId> = self
            .written_at
            .iter()
            .filter(|(id, revision)| doc.node_revision(**id) != Some(**revision))
            .map(|(id, _)| *id)
            .collect();

        let mut restored = 0;
        for ((id, target), original) in self.snapshots.drain() {
            if rerendered.contains(&id) {
                continue;
            }
            if doc.read(id, &target).as_deref() != Some(original.as_str()) {
                doc.write(id, &target, &original);
            }
            restored += 1;
        }

        if let Some(meta) = &self.meta_snapshot {
            doc.set_meta(meta.clone());
        }
        doc.set_lang(self.default_language.html_lang());

        self.written.clear();
        self.written_at.clear();
        self.active = None;
        self.affiliate = None;
        self.applied_revision = doc.content_revision();
        debug!("Restored {} original values", restored);
    }

    /// Translate the document with `bundle`. Restores first; an empty bundle
    /// (the default language) leaves the restored document as is.
    pub fn apply(&mut self, doc: &mut Document, bundle: Arc<TranslationBundle>) -> ApplyReport {
        self.restore(doc);
        if bundle.is_empty() {
            return ApplyReport::default();
        }

        if self.meta_snapshot.is_none() {
            self.meta_snapshot = Some(doc.meta().clone());
        }

        let report = self.translate_pass(doc, &bundle);
        update_meta(doc, &bundle);
        doc.set_lang(bundle.language().html_lang());

        debug!(
            "Applied '{}' bundle: {} translated",
            bundle.language(),
            report.translated
        );
        self.active = Some(bundle);
        self.applied_revision = doc.content_revision();
        report
    }

    /// Localize affiliate links with a keyword bundle.
    pub fn apply_affiliate(&mut self, doc: &mut Document, bundle: Arc<AffiliateBundle>) -> ApplyReport {
        let report = self.affiliate_pass(doc, &bundle);
        self.affiliate = Some(bundle);
        self.applied_revision = doc.content_revision();
        report
    }

    /// Notification that new translatable content was rendered.
    ///
    /// Re-runs the active bundles over the document if its content changed
    /// since the last pass. Already-translated nodes are skipped.
    pub fn content_rendered(&mut self, doc: &mut Document) -> ApplyReport {
        if doc.content_revision() == self.applied_revision {
            return ApplyReport::default();
        }

        let mut report = ApplyReport::default();
        if let Some(bundle) = self.active.clone() {
            report = self.translate_pass(doc, &bundle);
        }
        if let Some(bundle) = self.affiliate.clone() {
            let affiliate = self.affiliate_pass(doc, &bundle);
            report.translated += affiliate.translated;
            report.skipped += affiliate.skipped;
        }

        self.applied_revision = doc.content_revision();
        report
    }

    fn translate_pass(&mut self, doc: &mut Document, bundle: &TranslationBundle) -> ApplyReport {
        let writes: Vec<_> = doc
            .elements()
            .flat_map(|(id, element)| plan_element(id, element, bundle))
            .collect();
        self.execute(doc, writes)
    }

    fn affiliate_pass(&mut self, doc: &mut Document, bundle: &AffiliateBundle) -> ApplyReport {
        let writes = affiliate::plan(doc, bundle);
        self.execute(doc, writes)
    }

    fn execute(&mut self, doc: &mut Document, writes: Vec<(NodeId, Target, String)>) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (id, target, value) in writes {
            if self.write(doc, id, target, &value) {
                report.translated += 1;
            } else {
                report.skipped += 1;
            }
        }
        report
    }

    fn write(&mut self, doc: &mut Document, id: NodeId, target: Target, value: &str) -> bool {
        if let Some(revision) = self.written_at.get(&id) {
            if doc.node_revision(id) != Some(*revision) {
                // Re-rendered by its owner: what's there now is the new original
                self.forget(id);
            }
        }

        let key = (id, target);
        if self.written.contains(&key) {
            return false;
        }
        let Some(current) = doc.read(id, &key.1) else {
            debug!("Node {:?} has no {:?} to translate, leaving it alone", id, key.1);
            return false;
        };

        if current != value {
            doc.write(id, &key.1, value);
        }
        self.snapshots.entry(key.clone()).or_insert(current);
        self.written.insert(key);
        if let Some(revision) = doc.node_revision(id) {
            self.written_at.insert(id, revision);
        }
        true
    }

    fn forget(&mut self, id: NodeId) {
        self.snapshots.retain(|(node, _), _| *node != id);
        self.written.retain(|(node, _)| *node != id);
        self.written_at.remove(&id);
    }
}

fn plan_element(id: NodeId, element: &Element, bundle: &TranslationBundle) -> Vec<(NodeId, Target, String)> {
    let mut writes = Vec::new();
    let mut text = |value: Option<&str>| {
        if let Some(value) = value {
            writes.push((id, Target::Text, value.to_string()));
        }
    };

    if let Some(key) = element.get_attr(UI_ATTR) {
        text(bundle.lookup(&format!("ui.{}", key)).or_else(|| bundle.lookup(key)));
    }
    if let Some(key) = element.get_attr(SECTION_ATTR) {
        text(bundle.lookup(&format!("sections.{}", key)));
    }
    if let Some(key) = element.get_attr(EXCERPT_ATTR) {
        text(
            bundle
                .lookup(&format!("excerpts.{}", key))
                .or_else(|| article_field(bundle, key, "excerpt")),
        );
    }
    if let Some(category) = element.get_attr(CATEGORY_ATTR) {
        text(bundle.category("categories").and_then(|c| c.get(category)).and_then(Value::as_str));
    } else if element.has_class(CATEGORY_CLASS) {
        text(category_by_text(bundle, &element.text));
    }
    if element.tag == "a" && element.get_attr(UI_ATTR).is_none() {
        if let Some(href) = element.get_attr("href") {
            text(article_title(bundle, href));
        }
    }

    if let Some(spec) = element.get_attr(ATTRS_ATTR) {
        for pair in spec.split(';') {
            let Some((attr, key)) = pair.split_once('=') else {
                continue;
            };
            let (attr, key) = (attr.trim(), key.trim());
            if let Some(value) = bundle.lookup(&format!("ui.{}", key)).or_else(|| bundle.lookup(key)) {
                writes.push((id, Target::Attr(attr.to_string()), value.to_string()));
            }
        }
    }

    writes
}

fn article_entry<'a>(bundle: &'a TranslationBundle, href: &str) -> Option<&'a Value> {
    let articles = bundle.category("articles")?;
    articles.get(href).or_else(|| {
        let trimmed = href.trim_start_matches("./").trim_start_matches('/');
        articles.get(trimmed)
    })
}

fn article_title<'a>(bundle: &'a TranslationBundle, href: &str) -> Option<&'a str> {
    match article_entry(bundle, href)? {
        Value::String(title) => Some(title),
        Value::Object(entry) => entry.get("title").and_then(Value::as_str),
        _ => None,
    }
}

fn article_field<'a>(bundle: &'a TranslationBundle, key: &str, field: &str) -> Option<&'a str> {
    article_entry(bundle, key)?
        .as_object()
        .and_then(|entry| entry.get(field))
        .and_then(Value::as_str)
}

fn category_by_text<'a>(bundle: &'a TranslationBundle, text: &str) -> Option<&'a str> {
    let categories: &Map<String, Value> = bundle.category("categories")?;
    let wanted = normalize_whitespace(text);
    if wanted.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|(native, _)| normalize_whitespace(native) == wanted)
        .and_then(|(_, translated)| translated.as_str())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn update_meta(doc: &mut Document, bundle: &TranslationBundle) {
    let Some(meta) = bundle.category("meta") else {
        return;
    };

    let mut page_meta = doc.meta().clone();
    if let Some(title) = meta.get("title").and_then(Value::as_str) {
        page_meta.title = title.to_string();
        set_existing(&mut page_meta, SOCIAL_TITLE_TAGS, title);
    }
    if let Some(description) = meta.get("description").and_then(Value::as_str) {
        page_meta.description = description.to_string();
        set_existing(&mut page_meta, SOCIAL_DESCRIPTION_TAGS, description);
    }
    doc.set_meta(page_meta);
}

fn set_existing(meta: &mut PageMeta, tags: &[&str], value: &str) {
    for tag in tags {
        if let Some(existing) = meta.social.get_mut(*tag) {
            *existing = value.to_string();
        }
    }
}
