//! Per-item search plan: which sources to consult, in what order.
//!
//! The order is fixed by cost: the local archive is free, the
//! manufacturer's own site is the most likely hit for a known vendor, and
//! the general retailers are the fallback. The engine walks the plan and
//! stops at the first source that yields a candidate.

use url::Url;

use crate::item::Item;

/// Source id of the local archive collaborator.
pub const ARCHIVE_SOURCE_ID: &str = "archive";

/// Retailer search pages consulted after the archive and manufacturer.
const RETAILERS: &[(&str, &str)] = &[
    ("retailer:bazaarly", "https://www.bazaarly.com/search"),
    ("retailer:shopgrid", "https://shopgrid.io/products/search"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Local archive lookup; no network call.
    Archive,
    /// A search page fetched over HTTP.
    Web,
}

/// One entry in an item's search plan.
#[derive(Debug, Clone)]
pub struct SearchSource {
    pub id: String,
    pub kind: SourceKind,
    /// Search page to fetch; `None` for the archive.
    pub query_url: Option<String>,
}

/// Build the ordered plan for an item.
pub fn plan_for(item: &Item) -> Vec<SearchSource> {
    let mut plan = vec![SearchSource {
        id: ARCHIVE_SOURCE_ID.to_string(),
        kind: SourceKind::Archive,
        query_url: None,
    }];

    if !item.vendor.trim().is_empty()
        && let Some(url) = manufacturer_query(item)
    {
        plan.push(SearchSource {
            id: format!("manufacturer:{}", vendor_slug(&item.vendor)),
            kind: SourceKind::Web,
            query_url: Some(url),
        });
    }

    for (id, base) in RETAILERS {
        if let Some(url) = search_query(base, &format!("{} {}", item.title, item.vendor)) {
            plan.push(SearchSource {
                id: (*id).to_string(),
                kind: SourceKind::Web,
                query_url: Some(url),
            });
        }
    }

    plan
}

/// Lowercase, alphanumeric-only slug with single dashes between words.
fn vendor_slug(vendor: &str) -> String {
    let mut slug = String::with_capacity(vendor.len());
    let mut pending_dash = false;
    for c in vendor.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn manufacturer_query(item: &Item) -> Option<String> {
    // Vendor sites are addressed by convention; brand-specific overrides
    // belong in the extraction adapter, not here.
    let domain_slug: String = vendor_slug(&item.vendor).replace('-', "");
    if domain_slug.is_empty() {
        return None;
    }
    search_query(
        &format!("https://www.{domain_slug}.com/search"),
        &item.title,
    )
}

fn search_query(base: &str, terms: &str) -> Option<String> {
    let terms = terms.trim();
    if terms.is_empty() {
        return None;
    }
    let mut url = Url::parse(base).ok()?;
    url.query_pairs_mut().append_pair("q", terms);
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{CatalogRecord, Item};

    fn item(vendor: &str, title: &str) -> Item {
        Item::from_record(
            &CatalogRecord {
                key: "k".to_string(),
                title: title.to_string(),
                vendor: vendor.to_string(),
                price: 10.0,
                category: String::new(),
                has_artifact: false,
            },
            0,
            50,
        )
    }

    #[test]
    fn test_plan_starts_with_archive() {
        let plan = plan_for(&item("Aurelia", "Walnut Side Table"));
        assert_eq!(plan[0].id, ARCHIVE_SOURCE_ID);
        assert_eq!(plan[0].kind, SourceKind::Archive);
        assert!(plan[0].query_url.is_none());
    }

    #[test]
    fn test_known_vendor_adds_manufacturer_before_retailers() {
        let plan = plan_for(&item("Halcyon Supply", "Brass Desk Lamp"));
        assert_eq!(plan[1].id, "manufacturer:halcyon-supply");
        let url = plan[1].query_url.as_deref().unwrap();
        assert!(url.starts_with("https://www.halcyonsupply.com/search?"));
        assert!(url.contains("q=Brass+Desk+Lamp"));
        assert!(plan[2].id.starts_with("retailer:"));
    }

    #[test]
    fn test_unknown_vendor_skips_manufacturer() {
        let plan = plan_for(&item("   ", "Brass Desk Lamp"));
        assert_eq!(plan.len(), 1 + RETAILERS.len());
        assert!(plan.iter().all(|s| !s.id.starts_with("manufacturer:")));
    }

    #[test]
    fn test_retailer_queries_include_vendor_terms() {
        let plan = plan_for(&item("Fernwood", "Oak Bookshelf"));
        let retailer = plan
            .iter()
            .find(|s| s.id == "retailer:bazaarly")
            .expect("retailer in plan");
        let url = retailer.query_url.as_deref().unwrap();
        assert!(url.contains("q=Oak+Bookshelf+Fernwood"));
    }

    #[test]
    fn test_vendor_slug() {
        assert_eq!(vendor_slug("Grover & Sons"), "grover-sons");
        assert_eq!(vendor_slug("  Aurelia  "), "aurelia");
        assert_eq!(vendor_slug("B&O"), "b-o");
    }
}
