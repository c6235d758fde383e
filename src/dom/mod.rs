//! Page translation.
//!
//! - `document`: the virtual page the engine translates
//! - `applier`: writes bundle content into the page and restores originals
//! - `affiliate`: marketplace search-link localization

pub mod affiliate;
mod applier;
mod document;

pub use affiliate::{has_affiliate_links, AffiliateBundle, AffiliateDomain};
pub use applier::{
    ApplyReport, DomTranslationApplier, ATTRS_ATTR, CATEGORY_ATTR, CATEGORY_CLASS, EXCERPT_ATTR,
    SECTION_ATTR, UI_ATTR,
};
pub use document::{Document, Element, NodeId, PageKind, PageMeta, Target};
