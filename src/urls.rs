//! URL resolution and normalization helpers
//!
//! Links and image sources found in HTML are resolved against the origin of
//! the page they appeared on; the visited-set operates on the normalized
//! absolute form produced here.

use url::Url;

/// Resolves an `href` or `src` attribute value to an absolute URL
///
/// A value that is already `http(s)://` is parsed as-is; everything else is
/// joined against the origin of `page_url` (so `/a/b.jpg` on
/// `https://shop.example/se/products` becomes `https://shop.example/a/b.jpg`).
///
/// Returns `None` for values that should never be followed: empty strings,
/// fragment-only anchors, `javascript:`/`mailto:`/`tel:` links, data URIs,
/// and anything that does not resolve to an HTTP(S) URL.
pub fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = if href.starts_with("http://") || href.starts_with("https://") {
        Url::parse(href).ok()?
    } else {
        origin_of(page_url).join(href).ok()?
    };

    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved)
    } else {
        None
    }
}

/// Returns the origin of a URL as a URL with path `/` and no query/fragment
fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// Normalizes a URL to the canonical form used for visited-set deduplication
///
/// Fragments never change the fetched document, so they are stripped; the
/// rest of the URL is kept verbatim.
pub fn normalize(url: &Url) -> String {
    if url.fragment().is_none() {
        return url.to_string();
    }
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped.to_string()
}
