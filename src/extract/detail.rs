use crate::extract::price::normalize_price;
use crate::extract::Product;
use crate::profile::ExtractionProfile;
use crate::urls::resolve_href;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Fallback sub-selectors for specification rows, matching the row
/// structures real product pages use (tables and definition lists)
const SPEC_LABEL_FALLBACK: &str = "th, dt, strong";
const SPEC_VALUE_FALLBACK: &str = "td, dd";

/// Extracts a structured product record from a detail page
///
/// # Arguments
///
/// * `html` - The detail page HTML
/// * `page_url` - The URL the page was fetched from; becomes the product's
///   `source_url` and the base for image resolution
/// * `profile` - The extraction profile supplying selectors, the price
///   format, and the default category
///
/// # Returns
///
/// * `Some(Product)` - A usable record was extracted
/// * `None` - The name selector matched nothing or the price did not
///   normalize to a positive value; callers treat this as "insufficient
///   data", not an error
pub fn extract_product(
    html: &str,
    page_url: &Url,
    profile: &ExtractionProfile,
) -> Option<Product> {
    let document = Html::parse_document(html);
    let selectors = &profile.selectors;

    let name = first_text(&document, selectors.name.as_deref());
    if name.is_empty() {
        return None;
    }

    let price = normalize_price(
        &first_text(&document, selectors.price.as_deref()),
        profile.price_format,
    );
    if price <= 0.0 {
        return None;
    }

    let description = first_text(&document, selectors.description.as_deref());
    let image_urls = extract_images(&document, page_url, selectors.image.as_deref());
    let specifications = extract_specifications(&document, selectors);

    Some(Product {
        source_url: page_url.to_string(),
        name,
        price,
        description,
        image_urls,
        specifications,
        category: profile
            .default_category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string()),
    })
}

/// Returns the trimmed text of the first match, or an empty string
fn first_text(document: &Html, selector: Option<&str>) -> String {
    parse_selector(selector)
        .and_then(|sel| document.select(&sel).next().map(|el| element_text(&el)))
        .unwrap_or_default()
}

/// Collects image URLs from `src` or `data-src` attributes, resolved to
/// absolute form
fn extract_images(document: &Html, page_url: &Url, selector: Option<&str>) -> Vec<String> {
    let Some(selector) = parse_selector(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"))
        })
        .filter_map(|src| resolve_href(src, page_url))
        .map(|url| url.to_string())
        .collect()
}

/// Iterates specification rows, pairing a label sub-selector with a value
/// sub-selector per row; rows where either side is empty are skipped
fn extract_specifications(
    document: &Html,
    selectors: &crate::profile::SelectorSet,
) -> BTreeMap<String, String> {
    let mut specifications = BTreeMap::new();

    let Some(row_selector) = parse_selector(selectors.specifications.as_deref()) else {
        return specifications;
    };
    let Some(label_selector) =
        parse_selector(Some(selectors.spec_label.as_deref().unwrap_or(SPEC_LABEL_FALLBACK)))
    else {
        return specifications;
    };
    let Some(value_selector) =
        parse_selector(Some(selectors.spec_value.as_deref().unwrap_or(SPEC_VALUE_FALLBACK)))
    else {
        return specifications;
    };

    for row in document.select(&row_selector) {
        let label = row
            .select(&label_selector)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();
        let value = row
            .select(&value_selector)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();

        if !label.is_empty() && !value.is_empty() {
            specifications.insert(label, value);
        }
    }

    specifications
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_selector(raw: Option<&str>) -> Option<Selector> {
    raw.and_then(|s| Selector::parse(s).ok())
}
