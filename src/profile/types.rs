use serde::{Deserialize, Serialize};

/// Declarative per-site description of how to extract products
///
/// Field names follow the camelCase convention of the JSON profile
/// documents supplied by the store-management collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionProfile {
    /// Display name of the site; also the key under which products are stored
    #[serde(default)]
    pub site: Option<String>,

    /// Base URL of the site
    pub base_url: String,

    /// Regex tested against a URL to decide whether it is a product detail page
    #[serde(default)]
    pub product_url_pattern: Option<String>,

    /// Whether to follow pagination links on listing pages
    #[serde(default = "default_true")]
    pub follow_pagination: bool,

    /// Price format used by the site
    #[serde(default)]
    pub price_format: PriceFormat,

    /// Category assigned to extracted products
    #[serde(default)]
    pub default_category: Option<String>,

    /// CSS selectors for listing and detail pages
    #[serde(default)]
    pub selectors: SelectorSet,

    /// Seed URLs to start crawling from (a CLI start URL overrides these)
    #[serde(default)]
    pub start_urls: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ExtractionProfile {
    /// Returns the key identifying this site toward the product store
    pub fn site_key(&self) -> &str {
        match &self.site {
            Some(site) if !site.is_empty() => site,
            _ => &self.base_url,
        }
    }
}

/// How prices are written on the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFormat {
    /// Comma as thousands separator, period as decimal point ("1,299.50")
    #[default]
    Standard,

    /// Period as thousands separator, comma as decimal point ("1.299,50")
    European,
}

/// Optional CSS selectors for listing and detail pages
///
/// Every field is an explicit optional so that missing-vs-present is a
/// typed state; unset fields are candidates for inference, and extraction
/// for an unset field yields empty values rather than erroring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSet {
    /// Anchors on a listing page that lead to product detail pages
    #[serde(default)]
    pub product_link: Option<String>,

    /// The "next page" link on a paginated listing
    #[serde(default)]
    pub pagination_next: Option<String>,

    /// Product name on a detail page
    #[serde(default)]
    pub name: Option<String>,

    /// Product price on a detail page
    #[serde(default)]
    pub price: Option<String>,

    /// Product description on a detail page
    #[serde(default)]
    pub description: Option<String>,

    /// Product images on a detail page (`src` or `data-src` is read)
    #[serde(default)]
    pub image: Option<String>,

    /// Specification rows on a detail page
    #[serde(default)]
    pub specifications: Option<String>,

    /// Label element within a specification row
    #[serde(default)]
    pub spec_label: Option<String>,

    /// Value element within a specification row
    #[serde(default)]
    pub spec_value: Option<String>,
}

impl SelectorSet {
    /// Fills unset fields from an inferred set
    ///
    /// Explicit configuration always wins field-by-field; only `None`
    /// fields are taken from `inferred`.
    pub fn merge_inferred(&mut self, inferred: &SelectorSet) {
        merge_field(&mut self.product_link, &inferred.product_link);
        merge_field(&mut self.pagination_next, &inferred.pagination_next);
        merge_field(&mut self.name, &inferred.name);
        merge_field(&mut self.price, &inferred.price);
        merge_field(&mut self.description, &inferred.description);
        merge_field(&mut self.image, &inferred.image);
        merge_field(&mut self.specifications, &inferred.specifications);
        merge_field(&mut self.spec_label, &inferred.spec_label);
        merge_field(&mut self.spec_value, &inferred.spec_value);
    }

    /// Returns true if the selectors a crawl cannot start without are present
    pub fn is_complete_for_listing(&self) -> bool {
        self.product_link.is_some()
    }

    /// Returns true if the selectors needed on detail pages are present
    pub fn is_complete_for_detail(&self) -> bool {
        self.name.is_some() && self.price.is_some()
    }
}

fn merge_field(target: &mut Option<String>, inferred: &Option<String>) {
    if target.is_none() {
        target.clone_from(inferred);
    }
}
