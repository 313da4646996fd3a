//! Priority scoring for the work queue.
//!
//! Each item gets a 0–100 score once, when it is first seen; the queue is
//! processed in descending score order with catalog order breaking ties.

use crate::item::{CatalogRecord, Item};

const PRICE_WEIGHT: f64 = 0.40;
const BRAND_WEIGHT: f64 = 0.25;
const CATEGORY_WEIGHT: f64 = 0.20;
/// Flat reward for having inventory data at all.
const BASE_WEIGHT: f64 = 0.15;

/// Price at which the price signal saturates.
const PRICE_CEILING: f64 = 500.0;

const DEFAULT_BRAND_REPUTATION: f64 = 0.50;
const DEFAULT_CATEGORY_VALUE: f64 = 0.40;

/// Vendors whose product pages historically yield usable imagery.
const BRAND_REPUTATION: &[(&str, f64)] = &[
    ("aurelia", 0.95),
    ("novakraft", 0.90),
    ("brightline", 0.85),
    ("fernwood", 0.80),
    ("halcyon supply", 0.75),
    ("tidecraft", 0.65),
    ("grover & sons", 0.60),
];

/// Category keywords matched against title and category text.
const CATEGORY_VALUE: &[(&str, f64)] = &[
    ("furniture", 1.0),
    ("sofa", 1.0),
    ("jewelry", 0.95),
    ("appliance", 0.90),
    ("electronics", 0.85),
    ("lighting", 0.75),
    ("tool", 0.70),
    ("apparel", 0.60),
    ("accessory", 0.45),
];

fn brand_reputation(vendor: &str) -> f64 {
    let vendor = vendor.trim().to_lowercase();
    BRAND_REPUTATION
        .iter()
        .find(|(name, _)| *name == vendor)
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_BRAND_REPUTATION)
}

fn category_value(text: &str) -> f64 {
    let text = text.to_lowercase();
    CATEGORY_VALUE
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_CATEGORY_VALUE)
}

/// Score a record on the 0–100 scale.
///
/// Weighted sum of four normalized signals: price (saturating at the
/// ceiling), vendor reputation, category value, and a flat base.
pub fn score(record: &CatalogRecord) -> u8 {
    let price_signal = (record.price / PRICE_CEILING).clamp(0.0, 1.0);
    let brand = brand_reputation(&record.vendor);
    let category = category_value(&format!("{} {}", record.title, record.category));

    let sum = price_signal * PRICE_WEIGHT
        + brand * BRAND_WEIGHT
        + category * CATEGORY_WEIGHT
        + BASE_WEIGHT;

    (sum * 100.0).round() as u8
}

/// Order pending work: descending score, catalog order on ties.
///
/// Returns item keys in processing order. The tie-break relies on a stable
/// sort over items pre-ordered by catalog ordinal.
pub fn rank<'a>(items: impl Iterator<Item = &'a Item>) -> Vec<String> {
    let mut ordered: Vec<&Item> = items.collect();
    ordered.sort_by_key(|item| item.ordinal);
    ordered.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    ordered.into_iter().map(|item| item.key.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemStatus;

    fn record(vendor: &str, price: f64, category: &str) -> CatalogRecord {
        CatalogRecord {
            key: "k".to_string(),
            title: "Some Product".to_string(),
            vendor: vendor.to_string(),
            price,
            category: category.to_string(),
            has_artifact: false,
        }
    }

    fn item(key: &str, ordinal: usize, priority_score: u8) -> Item {
        Item {
            key: key.to_string(),
            title: key.to_string(),
            vendor: String::new(),
            price: 0.0,
            category: String::new(),
            ordinal,
            priority_score,
            status: ItemStatus::Pending,
            attempts: 0,
            last_attempt_at: None,
            sources_tried: Default::default(),
            found_artifacts: Vec::new(),
            selected_artifact: None,
            last_error: None,
        }
    }

    #[test]
    fn test_worked_example_scores_75() {
        // price 200 -> 0.40 signal; aurelia -> 0.95; furniture -> 1.0.
        let r = record("aurelia", 200.0, "furniture");
        assert_eq!(score(&r), 75);
    }

    #[test]
    fn test_price_signal_saturates_at_ceiling() {
        let cheap = record("unknown", 500.0, "misc");
        let absurd = record("unknown", 50_000.0, "misc");
        assert_eq!(score(&cheap), score(&absurd));
    }

    #[test]
    fn test_defaults_apply_for_unknown_vendor_and_category() {
        // 0 price + 0.50 brand + 0.40 category + base
        // = 0.0 + 0.125 + 0.08 + 0.15 = 0.355
        let r = record("no-such-vendor", 0.0, "mystery goods");
        assert_eq!(score(&r), 36);
    }

    #[test]
    fn test_category_matches_title_text_too() {
        let mut r = record("unknown", 0.0, "");
        r.title = "Mid-century Sofa, walnut legs".to_string();
        let sofa = score(&r);
        r.title = "Mystery object".to_string();
        assert!(sofa > score(&r));
    }

    #[test]
    fn test_rank_descending_with_stable_tie_break() {
        let items = [
            item("low", 3, 10),
            item("tie-a", 1, 40),
            item("top", 0, 75),
            item("tie-b", 2, 40),
        ];
        let order = rank(items.iter());
        assert_eq!(order, vec!["top", "tie-a", "tie-b", "low"]);
    }

    #[test]
    fn test_rank_preserves_catalog_order_on_full_tie() {
        let items = [item("c", 2, 50), item("a", 0, 50), item("b", 1, 50)];
        let order = rank(items.iter());
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
