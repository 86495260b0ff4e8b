use crate::urls::resolve_href;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Fixed candidate selectors for product links, tried in order before any
/// structural analysis
const LINK_CANDIDATES: &[&str] = &[
    r#"a[href*="/product"]"#,
    r#"a[href*="/produkt"]"#,
    r#"a[href*="/p/"]"#,
    ".product-item a[href]",
    ".product-card a[href]",
    ".product-list-item a[href]",
    ".product-grid-item a[href]",
    "li.product a[href]",
    "[data-product-id] a[href]",
];

/// Plausibility band for candidate match counts: too few suggests a wrong
/// selector, too many suggests navigation or footer links
const MIN_MATCHES: usize = 5;
const MAX_MATCHES: usize = 100;

/// How far above a price text node to look for a product card container
const MAX_ANCESTOR_HOPS: usize = 4;

/// Text that looks like a price: digits adjacent to a currency marker
const PRICE_TEXT_PATTERN: &str =
    r"(?i)[$€£]\s*\d|\d\s*[$€£]|\d[\d\s.,]*\s*(?:kr|sek|nok|dkk|eur|usd|gbp)\b";

/// Infers a selector for product links on a listing page
///
/// Tries the fixed candidate list first; if no candidate's match count
/// falls within the plausibility band, falls back to the structural card
/// heuristic.
pub fn infer_product_link(document: &Html, page_url: &Url) -> Option<String> {
    fixed_candidate(document).or_else(|| card_class_heuristic(document, page_url))
}

/// Accepts the first fixed candidate with a plausible number of matches
fn fixed_candidate(document: &Html) -> Option<String> {
    for candidate in LINK_CANDIDATES {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let count = document.select(&selector).count();
        if (MIN_MATCHES..MAX_MATCHES).contains(&count) {
            tracing::debug!(
                "Inferred product link selector '{}' ({} matches)",
                candidate,
                count
            );
            return Some((*candidate).to_string());
        }
    }
    None
}

/// Structural heuristic: locate price-looking text nodes, walk up a bounded
/// number of ancestors looking for containers with exactly one anchor and
/// at least one image, then synthesize a selector from the class those
/// containers share most often
fn card_class_heuristic(document: &Html, page_url: &Url) -> Option<String> {
    let price_re = Regex::new(PRICE_TEXT_PATTERN).ok()?;
    let anchor_selector = Selector::parse("a[href]").ok()?;
    let image_selector = Selector::parse("img").ok()?;

    let mut card_ids = HashSet::new();
    let mut cards: Vec<ElementRef> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        if !price_re.is_match(text) {
            continue;
        }

        for ancestor in node.ancestors().take(MAX_ANCESTOR_HOPS) {
            let Some(element) = ElementRef::wrap(ancestor) else {
                continue;
            };
            if is_product_card(&element, &anchor_selector, &image_selector, page_url) {
                if card_ids.insert(element.id()) {
                    cards.push(element);
                }
                break;
            }
        }
    }

    if cards.len() < 2 {
        return None;
    }

    let mut class_counts: HashMap<&str, usize> = HashMap::new();
    for card in &cards {
        for class in card.value().classes() {
            *class_counts.entry(class).or_default() += 1;
        }
    }

    let (class, count) = class_counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))?;

    // The shared class must cover at least half the candidate cards
    if count * 2 < cards.len() {
        return None;
    }

    let selector = format!(".{} a[href]", class);
    tracing::debug!(
        "Inferred product link selector '{}' from {} candidate cards",
        selector,
        cards.len()
    );
    Some(selector)
}

/// A product card holds exactly one followable anchor and at least one image
fn is_product_card(
    element: &ElementRef,
    anchor_selector: &Selector,
    image_selector: &Selector,
    page_url: &Url,
) -> bool {
    let mut anchors = element.select(anchor_selector);
    let Some(anchor) = anchors.next() else {
        return false;
    };
    if anchors.next().is_some() {
        return false;
    }

    let followable = anchor
        .value()
        .attr("href")
        .and_then(|href| resolve_href(href, page_url))
        .is_some();

    followable && element.select(image_selector).next().is_some()
}
