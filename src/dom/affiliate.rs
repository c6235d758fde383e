//! Affiliate link localization.
//!
//! Outbound marketplace search links carry a search keyword and a tracking
//! tag. Localizing one swaps the keyword (and the visible product name) for
//! the target language while keeping the tag.

use crate::dom::document::{Document, Element, NodeId, Target};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameters that carry the search keyword, by marketplace.
pub const KEYWORD_PARAMS: &[&str] = &["k", "keyword", "field-keywords", "q"];

/// Query parameter carrying the tracking tag.
pub const TAG_PARAM: &str = "tag";

/// Marker attribute for product-name text next to an affiliate link.
pub const PRODUCT_NAME_ATTR: &str = "data-affiliate-name";

/// Marker attribute for links the page declares as affiliate links.
pub const AFFILIATE_ATTR: &str = "data-affiliate";

/// `affiliate-{lang}.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateBundle {
    #[serde(default)]
    pub domains: Vec<AffiliateDomain>,

    /// Original search term -> translated search term
    #[serde(default)]
    pub keywords: HashMap<String, String>,

    /// Original display name -> translated display name
    #[serde(default)]
    pub product_names: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateDomain {
    /// Marketplace host links should point at (e.g. "amazon.com")
    pub domain: String,

    /// Tracking tag set when a link carries none
    #[serde(default)]
    pub tag: String,

    /// Marketplace host whose links are moved to `domain` (e.g. "amazon.co.jp")
    #[serde(default)]
    pub source: Option<String>,
}

impl AffiliateBundle {
    fn domain_for(&self, host: &str) -> Option<(&AffiliateDomain, bool)> {
        self.domains.iter().find_map(|d| {
            if host_matches(host, &d.domain) {
                Some((d, false))
            } else if d.source.as_deref().is_some_and(|source| host_matches(host, source)) {
                Some((d, true))
            } else {
                None
            }
        })
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host.eq_ignore_ascii_case(domain)
        || host
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
}

/// Whether an element looks like an outbound affiliate link.
pub fn is_affiliate_link(element: &Element) -> bool {
    if element.tag != "a" {
        return false;
    }
    if element.get_attr(AFFILIATE_ATTR).is_some() {
        return true;
    }
    if element
        .get_attr("rel")
        .is_some_and(|rel| rel.split_whitespace().any(|r| r == "sponsored"))
    {
        return true;
    }
    element
        .get_attr("href")
        .and_then(|href| Url::parse(href).ok())
        .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|host| host.contains("amazon.") || host.contains("rakuten."))
}

/// Whether any affiliate link is present on the page.
pub fn has_affiliate_links(doc: &Document) -> bool {
    doc.elements().any(|(_, el)| is_affiliate_link(el))
}

/// Rewrite one href. `None` when the link is not a configured marketplace or
/// nothing would change.
///
/// The keyword parameter is swapped through `keywords`; an existing tag is
/// preserved and a missing one is filled from the domain config.
pub fn rewrite_href(href: &str, bundle: &AffiliateBundle) -> Option<String> {
    let mut url = Url::parse(href).ok()?;
    let host = url.host_str()?.to_string();
    let (domain, move_host) = bundle.domain_for(&host)?;

    let mut changed = false;
    let mut has_tag = false;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .map(|(key, value)| {
            if key == TAG_PARAM {
                has_tag = true;
                return (key, value);
            }
            if KEYWORD_PARAMS.contains(&key.as_str()) {
                if let Some(translated) = bundle.keywords.get(value.trim()) {
                    changed = true;
                    return (key, translated.clone());
                }
            }
            (key, value)
        })
        .collect();

    if !has_tag && !domain.tag.is_empty() {
        pairs.push((TAG_PARAM.to_string(), domain.tag.clone()));
        changed = true;
    }

    if move_host {
        let target = match host.strip_prefix("www.") {
            Some(_) => format!("www.{}", domain.domain),
            None => domain.domain.clone(),
        };
        url.set_host(Some(&target)).ok()?;
        changed = true;
    }

    if !changed {
        return None;
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    Some(url.to_string())
}

/// Every write the affiliate pass wants to make, in document order.
pub(crate) fn plan(doc: &Document, bundle: &AffiliateBundle) -> Vec<(NodeId, Target, String)> {
    let mut writes = Vec::new();

    for (id, element) in doc.elements() {
        let rewritten = match element.tag.as_str() {
            "a" => element.get_attr("href").and_then(|href| rewrite_href(href, bundle)),
            _ => None,
        };
        if rewritten.is_some() || is_affiliate_link(element) {
            if let Some(href) = rewritten {
                writes.push((id, Target::Attr("href".to_string()), href));
            }
            if let Some(name) = bundle.product_names.get(element.text.trim()) {
                writes.push((id, Target::Text, name.clone()));
            }
            continue;
        }

        if element.get_attr(PRODUCT_NAME_ATTR).is_some() {
            if let Some(name) = bundle.product_names.get(element.text.trim()) {
                writes.push((id, Target::Text, name.clone()));
            }
        }
    }

    writes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document::PageKind;
    use serde_json::json;

    fn bundle() -> AffiliateBundle {
        serde_json::from_value(json!({
            "domains": [
                {"domain": "amazon.com", "tag": "abc-20"},
                {"domain": "amazon.com", "tag": "abc-20", "source": "amazon.co.jp"}
            ],
            "keywords": {"プロテイン": "protein"},
            "productNames": {"ホエイプロテイン 1kg": "Whey Protein 1kg"}
        }))
        .unwrap()
    }

    #[test]
    fn test_rewrite_swaps_keyword_and_keeps_tag() {
        let href = "https://www.amazon.com/s?k=プロテイン&tag=abc-20";
        let rewritten = rewrite_href(href, &bundle()).unwrap();

        let url = Url::parse(&rewritten).unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["k"], "protein");
        assert_eq!(pairs["tag"], "abc-20");
        assert_eq!(url.host_str(), Some("www.amazon.com"));
    }

    #[test]
    fn test_rewrite_preserves_existing_foreign_tag() {
        let href = "https://www.amazon.com/s?k=プロテイン&tag=other-22";
        let rewritten = rewrite_href(href, &bundle()).unwrap();
        assert!(rewritten.contains("tag=other-22"));
    }

    #[test]
    fn test_rewrite_fills_missing_tag() {
        let href = "https://amazon.com/s?k=unknown";
        let rewritten = rewrite_href(href, &bundle()).unwrap();
        assert!(rewritten.ends_with("k=unknown&tag=abc-20"));
    }

    #[test]
    fn test_rewrite_moves_source_marketplace() {
        let href = "https://www.amazon.co.jp/s?k=プロテイン&tag=jp-22";
        let rewritten = rewrite_href(href, &bundle()).unwrap();
        assert_eq!(rewritten, "https://www.amazon.com/s?k=protein&tag=jp-22");
    }

    #[test]
    fn test_rewrite_ignores_other_hosts_and_noops() {
        assert_eq!(rewrite_href("https://example.com/s?k=プロテイン", &bundle()), None);
        assert_eq!(rewrite_href("/relative/link", &bundle()), None);
        assert_eq!(
            rewrite_href("https://www.amazon.com/s?k=shoes&tag=abc-20", &bundle()),
            None
        );
    }

    #[test]
    fn test_is_affiliate_link() {
        assert!(is_affiliate_link(&Element::new("a").attr("href", "https://www.amazon.co.jp/dp/1")));
        assert!(is_affiliate_link(&Element::new("a").attr("rel", "nofollow sponsored")));
        assert!(is_affiliate_link(&Element::new("a").attr(AFFILIATE_ATTR, "")));
        assert!(!is_affiliate_link(&Element::new("a").attr("href", "/about.html")));
        assert!(!is_affiliate_link(&Element::new("div").attr(AFFILIATE_ATTR, "")));
    }

    #[test]
    fn test_plan_covers_link_and_adjacent_name() {
        let mut doc = Document::new("ja", PageKind::Article);
        let link = doc.insert(
            Element::new("a")
                .attr("href", "https://www.amazon.com/s?k=プロテイン&tag=abc-20")
                .text("ホエイプロテイン 1kg"),
        );
        let name = doc.insert(Element::new("span").attr(PRODUCT_NAME_ATTR, "").text(" ホエイプロテイン 1kg "));
        doc.insert(Element::new("span").text("ホエイプロテイン 1kg"));

        let writes = plan(&doc, &bundle());
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].0, link);
        assert_eq!(writes[0].1, Target::Attr("href".to_string()));
        assert_eq!(writes[1], (link, Target::Text, "Whey Protein 1kg".to_string()));
        assert_eq!(writes[2], (name, Target::Text, "Whey Protein 1kg".to_string()));
        assert!(has_affiliate_links(&doc));
    }

    #[test]
    fn test_plan_renames_link_without_known_keyword() {
        let mut doc = Document::new("ja", PageKind::Article);
        let link = doc.insert(
            Element::new("a")
                .attr("href", "https://www.amazon.com/dp/B000123?tag=abc-20")
                .text("ホエイプロテイン 1kg"),
        );
        doc.insert(Element::new("a").attr("href", "/about.html").text("ホエイプロテイン 1kg"));

        let writes = plan(&doc, &bundle());
        assert_eq!(writes, vec![(link, Target::Text, "Whey Protein 1kg".to_string())]);
    }
}
