//! A virtual page: metadata plus a flat list of elements.
//!
//! Every content write goes through `Document`, which bumps the written
//! node's revision and the document-wide content revision. The applier uses
//! both to tell its own writes apart from re-renders by the page's owner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// What part of an element a translation writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Text,
    Attr(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// A content article; eligible for the translate banner
    Article,
    /// An index or listing page
    #[default]
    Index,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Social preview tags by property name (`og:title`, `twitter:description`, ...)
    #[serde(default)]
    pub social: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,

    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    #[serde(default)]
    pub text: String,

    #[serde(skip)]
    revision: u64,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: String::new(),
            revision: 0,
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    lang: String,

    #[serde(default)]
    meta: PageMeta,

    #[serde(default)]
    page: PageKind,

    #[serde(default)]
    elements: Vec<Element>,

    #[serde(skip)]
    content_revision: u64,
}

impl Document {
    pub fn new(lang: &str, page: PageKind) -> Self {
        Self {
            lang: lang.to_string(),
            meta: PageMeta::default(),
            page,
            elements: Vec::new(),
            content_revision: 0,
        }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn set_lang(&mut self, lang: &str) {
        self.lang = lang.to_string();
    }

    pub fn meta(&self) -> &PageMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: PageMeta) {
        self.meta = meta;
    }

    pub fn page(&self) -> PageKind {
        self.page
    }

    /// Bumped by every insertion and content write.
    pub fn content_revision(&self) -> u64 {
        self.content_revision
    }

    /// Add an element, as a renderer inserting new content would.
    pub fn insert(&mut self, mut element: Element) -> NodeId {
        self.content_revision += 1;
        element.revision = self.content_revision;
        self.elements.push(element);
        NodeId(self.elements.len() - 1)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.elements.len()).map(NodeId)
    }

    pub fn elements(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.elements.iter().enumerate().map(|(i, el)| (NodeId(i), el))
    }

    pub fn node_revision(&self, id: NodeId) -> Option<u64> {
        self.element(id).map(Element::revision)
    }

    pub fn read(&self, id: NodeId, target: &Target) -> Option<String> {
        let element = self.element(id)?;
        match target {
            Target::Text => Some(element.text.clone()),
            Target::Attr(name) => element.attrs.get(name).cloned(),
        }
    }

    /// Write text or an attribute. Returns `false` for an unknown node.
    pub fn write(&mut self, id: NodeId, target: &Target, value: &str) -> bool {
        let Some(element) = self.elements.get_mut(id.0) else {
            return false;
        };
        match target {
            Target::Text => element.text = value.to_string(),
            Target::Attr(name) => {
                element.attrs.insert(name.clone(), value.to_string());
            }
        }
        self.content_revision += 1;
        element.revision = self.content_revision;
        true
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        self.write(id, &Target::Text, text)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        self.write(id, &Target::Attr(name.to_string()), value)
    }

    /// Give every element a fresh revision after deserializing a snapshot.
    pub fn mark_rendered(&mut self) {
        for element in &mut self.elements {
            self.content_revision += 1;
            element.revision = self.content_revision;
        }
    }
}
