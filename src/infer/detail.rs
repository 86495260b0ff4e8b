use crate::profile::SelectorSet;
use scraper::{Html, Selector};
use serde_json::Value;

/// Generic detail-page selectors, applied only when structured data marks
/// the page as a product
const NAME_FALLBACK: &str = "h1";
const PRICE_FALLBACK: &str = r#".price, .product-price, [itemprop="price"]"#;
const DESCRIPTION_FALLBACK: &str =
    r#".description, .product-description, [itemprop="description"]"#;
const IMAGE_FALLBACK: &str = r#".product-image img, .product-gallery img, [itemprop="image"]"#;

/// Fills unset detail-page selectors when the page carries a JSON-LD block
/// typed as a product
///
/// Bespoke per-field inference is not attempted: the structured-data hint
/// is the signal that generic selectors are likely to hit, and without it
/// the fields stay unset.
pub fn infer_detail_fields(document: &Html, inferred: &mut SelectorSet) {
    if !has_product_json_ld(document) {
        return;
    }

    let fallbacks = SelectorSet {
        name: Some(NAME_FALLBACK.to_string()),
        price: Some(PRICE_FALLBACK.to_string()),
        description: Some(DESCRIPTION_FALLBACK.to_string()),
        image: Some(IMAGE_FALLBACK.to_string()),
        ..SelectorSet::default()
    };
    inferred.merge_inferred(&fallbacks);
}

/// Checks for a `script[type="application/ld+json"]` block whose `@type`
/// is (or contains) `Product`, including inside `@graph` arrays
fn has_product_json_ld(document: &Html) -> bool {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return false;
    };

    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if contains_product(&value) {
                return true;
            }
        }
    }

    false
}

fn contains_product(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(contains_product),
        Value::Object(map) => {
            if let Some(kind) = map.get("@type") {
                if type_is_product(kind) {
                    return true;
                }
            }
            map.get("@graph").is_some_and(contains_product)
        }
        _ => false,
    }
}

fn type_is_product(kind: &Value) -> bool {
    match kind {
        Value::String(s) => s.eq_ignore_ascii_case("Product"),
        Value::Array(items) => items.iter().any(|item| {
            item.as_str()
                .map(|s| s.eq_ignore_ascii_case("Product"))
                .unwrap_or(false)
        }),
        _ => false,
    }
}
