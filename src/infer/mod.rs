//! Heuristic selector inference
//!
//! When an extraction profile is missing selectors, this module proposes
//! them by analyzing the page itself: fixed candidate selectors first, then
//! a structural heuristic built around price-looking text, shared ancestor
//! classes, and structured-data hints. Every strategy is best-effort and
//! independent; no confident signal simply leaves the corresponding
//! selector unset, and downstream extraction yields empty values for it.

mod detail;
mod listing;
mod pagination;

pub use detail::infer_detail_fields;
pub use listing::infer_product_link;
pub use pagination::infer_pagination_next;

use crate::profile::SelectorSet;
use scraper::Html;
use url::Url;

/// Proposes selectors for a page whose profile is absent or incomplete
///
/// Strategies run in priority order and each fills only the fields the
/// previous ones left unset. The caller merges the result under the
/// explicit profile: explicit configuration always wins field-by-field.
///
/// # Arguments
///
/// * `html` - The fetched page to analyze
/// * `page_url` - The URL the page was fetched from, used to judge
///   whether candidate anchors are followable
///
/// # Returns
///
/// A partial selector set; fields without a confident signal stay unset
pub fn infer_selectors(html: &str, page_url: &Url) -> SelectorSet {
    let document = Html::parse_document(html);
    let mut inferred = SelectorSet::default();

    inferred.product_link = listing::infer_product_link(&document, page_url);
    inferred.pagination_next = pagination::infer_pagination_next(&document);
    detail::infer_detail_fields(&document, &mut inferred);

    if inferred == SelectorSet::default() {
        tracing::debug!("Selector inference found no confident signal on {}", page_url);
    }

    inferred
}
