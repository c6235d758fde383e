//! Runtime localization for a statically rendered site.
//!
//! The native page is authored in the default language. Other languages are
//! applied on top of it from JSON bundles and can be removed again without
//! losing the original content.

pub mod config;
pub mod dom;
pub mod experiment;
pub mod i18n;
pub mod regional;
pub mod storage;
pub mod switch;
