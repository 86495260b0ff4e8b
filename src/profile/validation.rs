use crate::profile::types::{ExtractionProfile, SelectorSet};
use crate::ProfileError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates an extraction profile after deserialization
///
/// Checks that the base URL and seed URLs parse, that the product URL
/// pattern compiles as a regex, and that every configured selector is a
/// parseable CSS selector. Missing selectors are fine — they trigger
/// inference or yield empty fields downstream.
pub fn validate(profile: &ExtractionProfile) -> Result<(), ProfileError> {
    Url::parse(&profile.base_url)
        .map_err(|e| ProfileError::InvalidUrl(format!("baseUrl '{}': {}", profile.base_url, e)))?;

    for seed in &profile.start_urls {
        Url::parse(seed)
            .map_err(|e| ProfileError::InvalidUrl(format!("startUrl '{}': {}", seed, e)))?;
    }

    if let Some(pattern) = &profile.product_url_pattern {
        Regex::new(pattern).map_err(|e| ProfileError::InvalidPattern(e.to_string()))?;
    }

    validate_selectors(&profile.selectors)?;

    Ok(())
}

/// Validates every configured selector in a selector set
fn validate_selectors(selectors: &SelectorSet) -> Result<(), ProfileError> {
    let fields: [(&'static str, &Option<String>); 9] = [
        ("productLink", &selectors.product_link),
        ("paginationNext", &selectors.pagination_next),
        ("name", &selectors.name),
        ("price", &selectors.price),
        ("description", &selectors.description),
        ("image", &selectors.image),
        ("specifications", &selectors.specifications),
        ("specLabel", &selectors.spec_label),
        ("specValue", &selectors.spec_value),
    ];

    for (field, value) in fields {
        if let Some(raw) = value {
            Selector::parse(raw).map_err(|e| ProfileError::InvalidSelector {
                field,
                message: e.to_string(),
            })?;
        }
    }

    Ok(())
}
