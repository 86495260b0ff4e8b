use scraper::{ElementRef, Html, Selector};

/// Fixed candidate selectors for the "next page" link
const NEXT_CANDIDATES: &[&str] = &[
    r#"a[rel="next"]"#,
    r#"link[rel="next"]"#,
    ".pagination a.next",
    ".pagination .next a",
    "a.pagination__next",
    ".pagination-next a",
    "a.next-page",
];

/// Anchor texts that mean "next page", including common localized forms
const NEXT_TEXTS: &[&str] = &[
    "next", "next page", "nästa", "næste", "neste", "weiter", "suivant", "volgende", "›", "»",
];

/// Infers a selector for the pagination "next" link
///
/// Fixed candidates are tried first; a candidate is accepted only when it
/// matches exactly one element, since an ambiguous pagination selector
/// would make the crawl jump unpredictably. As a fallback, anchors whose
/// text is a known "next" word are considered; a selector is synthesized
/// from the anchor's class and accepted under the same uniqueness rule.
pub fn infer_pagination_next(document: &Html) -> Option<String> {
    for candidate in NEXT_CANDIDATES {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if document.select(&selector).count() == 1 {
            tracing::debug!("Inferred pagination selector '{}'", candidate);
            return Some((*candidate).to_string());
        }
    }

    next_text_anchor(document)
}

/// Looks for a single anchor labeled with a "next" word and synthesizes a
/// class-based selector for it
fn next_text_anchor(document: &Html) -> Option<String> {
    let anchor_selector = Selector::parse("a[href]").ok()?;

    let mut matches = document.select(&anchor_selector).filter(|element| {
        let text = element.text().collect::<String>().trim().to_lowercase();
        NEXT_TEXTS.contains(&text.as_str())
    });

    let anchor = matches.next()?;
    if matches.next().is_some() {
        return None;
    }

    let synthesized = synthesize_anchor_selector(&anchor)?;
    let selector = Selector::parse(&synthesized).ok()?;
    if document.select(&selector).count() != 1 {
        return None;
    }

    tracing::debug!("Inferred pagination selector '{}'", synthesized);
    Some(synthesized)
}

/// Builds a selector from the anchor's first class, if it has one
///
/// A classless anchor cannot be expressed as a reusable selector, so no
/// selector is produced for it.
fn synthesize_anchor_selector(anchor: &ElementRef) -> Option<String> {
    let class = anchor.value().classes().next()?;
    Some(format!("a.{}", class))
}
