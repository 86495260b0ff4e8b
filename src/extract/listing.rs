use crate::profile::ExtractionProfile;
use crate::urls::resolve_href;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Links discovered on a product listing page
#[derive(Debug, Clone, Default)]
pub struct ListingLinks {
    /// Candidate product detail URLs, deduplicated within this page
    pub product_links: Vec<Url>,

    /// The next pagination URL, if the profile follows pagination and the
    /// selector matched
    pub next_page_url: Option<Url>,
}

/// Extracts product links and the pagination link from a listing page
///
/// Applies `selectors.product_link` to collect candidate anchors and
/// resolves each `href` against the page origin. Duplicates are removed
/// within this call only; cross-page deduplication is the orchestrator's
/// job via the visited-set.
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `page_url` - The URL the page was fetched from, used for resolution
/// * `profile` - The extraction profile supplying the selectors
///
/// # Returns
///
/// The resolved product links and, when pagination is followed and the
/// selector matched, the next page URL
pub fn extract_listing_links(
    html: &str,
    page_url: &Url,
    profile: &ExtractionProfile,
) -> ListingLinks {
    let document = Html::parse_document(html);
    let mut links = ListingLinks::default();
    let mut seen = HashSet::new();

    if let Some(selector) = parse_selector(profile.selectors.product_link.as_deref()) {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(resolved) = resolve_href(href, page_url) else {
                continue;
            };
            if seen.insert(resolved.to_string()) {
                links.product_links.push(resolved);
            }
        }
    }

    if profile.follow_pagination {
        if let Some(selector) = parse_selector(profile.selectors.pagination_next.as_deref()) {
            links.next_page_url = document
                .select(&selector)
                .find_map(|element| element.value().attr("href"))
                .and_then(|href| resolve_href(href, page_url));
        }
    }

    links
}

/// Parses an optional selector string, treating unset or invalid selectors
/// as "matches nothing"
fn parse_selector(raw: Option<&str>) -> Option<Selector> {
    raw.and_then(|s| Selector::parse(s).ok())
}
