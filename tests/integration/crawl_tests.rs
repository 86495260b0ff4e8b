//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up mock shops and exercise the full
//! crawl cycle end-to-end: robots gating, listing traversal, pagination,
//! product extraction, persistence accounting, and failure handling.

use prospector::crawler::{
    CrawlJob, CrawlLimits, CrawlOptions, CrawlOutcome, JobStatus, Orchestrator,
};
use prospector::profile::{parse_profile, ExtractionProfile};
use prospector::store::{MemoryStore, ProductStore};
use std::sync::Arc;
use std::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Profile for a mock shop where listings link products under /d/ and
/// detail pages use h1.name / .price
fn shop_profile(product_link: Option<&str>) -> ExtractionProfile {
    let product_link = match product_link {
        Some(selector) => format!(r#""productLink": "{}","#, selector),
        None => String::new(),
    };
    parse_profile(&format!(
        r#"{{
            "site": "Mock Shop",
            "baseUrl": "https://shop.example",
            "productUrlPattern": "/d/",
            "priceFormat": "european",
            "defaultCategory": "Testware",
            "selectors": {{
                {product_link}
                "paginationNext": "a[rel=\"next\"]",
                "name": "h1.name",
                "price": ".price",
                "description": ".description"
            }}
        }}"#
    ))
    .unwrap()
}

/// Limits tuned for tests: no politeness pauses, single fetch attempt
fn fast_limits() -> CrawlLimits {
    CrawlLimits {
        request_delay_ms: 0,
        max_retries: 1,
        timeout_ms: 5_000,
        ..CrawlLimits::default()
    }
}

fn test_options() -> CrawlOptions {
    CrawlOptions {
        user_agent: "TestBot/1.0".to_string(),
        respect_robots: true,
        infer_selectors: false,
    }
}

async fn run_job(
    profile: ExtractionProfile,
    limits: CrawlLimits,
    options: CrawlOptions,
    start_urls: Vec<String>,
    store: Option<Arc<MemoryStore>>,
) -> CrawlOutcome {
    let job = CrawlJob::new(profile, limits, start_urls);
    let mut orchestrator = Orchestrator::new(job, options).expect("failed to build orchestrator");
    if let Some(store) = store {
        orchestrator = orchestrator.with_store(store);
    }
    orchestrator.run().await.expect("crawl failed")
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content.to_string()))
        .mount(server)
        .await;
}

async fn mount_html(server: &MockServer, url_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn product_page(name: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="name">{name}</h1>
            <span class="price">{price}</span>
            <div class="description">Description of {name}</div>
        </body></html>"#
    )
}

#[tokio::test]
async fn test_listing_crawl_with_pagination() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    // Page 1: three product anchors and a rel="next" link
    mount_html(
        &server,
        "/catalog",
        format!(
            r#"<html><body>
                <div class="grid">
                    <a class="item" href="/d/alpha">Alpha</a>
                    <a class="item" href="/d/beta">Beta</a>
                    <a class="item" href="/d/gamma">Gamma</a>
                </div>
                <a rel="next" href="{}/catalog-page2">Next</a>
            </body></html>"#,
            server.uri()
        ),
    )
    .await;

    // Page 2: one more product, no further pagination
    mount_html(
        &server,
        "/catalog-page2",
        r#"<html><body>
            <div class="grid"><a class="item" href="/d/delta">Delta</a></div>
        </body></html>"#
            .to_string(),
    )
    .await;

    for (slug, price) in [
        ("alpha", "199,00 kr"),
        ("beta", "249,00 kr"),
        ("gamma", "1.299,50 kr"),
        ("delta", "99,00 kr"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/d/{slug}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(product_page(slug, price)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert_eq!(outcome.job.counters.pages_crawled, 6);
    assert_eq!(outcome.job.counters.products_found, 4);
    assert!(outcome.errors.is_empty());

    let gamma = outcome
        .products
        .iter()
        .find(|p| p.name == "gamma")
        .expect("gamma missing");
    assert_eq!(gamma.price, 1299.50);
    assert_eq!(gamma.category, "Testware");
}

#[tokio::test]
async fn test_rediscovered_url_fetched_once() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    // The same product is linked twice on page 1 and again from page 2
    mount_html(
        &server,
        "/catalog",
        format!(
            r#"<html><body>
                <div class="grid">
                    <a class="item" href="/d/alpha">Alpha</a>
                    <a class="item" href="/d/alpha">Alpha again</a>
                </div>
                <a rel="next" href="{}/catalog-page2">Next</a>
            </body></html>"#,
            server.uri()
        ),
    )
    .await;
    mount_html(
        &server,
        "/catalog-page2",
        r#"<div class="grid"><a class="item" href="/d/alpha">Alpha yet again</a></div>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/d/alpha"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("alpha", "199,00 kr")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    assert_eq!(outcome.job.counters.products_found, 1);
}

#[tokio::test]
async fn test_robots_disallow_skips_without_error() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /d/").await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid">
            <a class="item" href="/d/alpha">Alpha</a>
            <a class="item" href="/d/beta">Beta</a>
        </div>"#
            .to_string(),
    )
    .await;

    // Disallowed product pages must never be fetched
    Mock::given(method("GET"))
        .and(path("/d/alpha"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d/beta"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    // A robots denial is a skip, not an error
    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.robots_denied, 2);
    assert_eq!(outcome.job.counters.products_found, 0);
}

#[tokio::test]
async fn test_robots_toggle_off_fetches_disallowed_pages() {
    let server = MockServer::start().await;

    // robots.txt disallows everything, but the toggle is off and the file
    // must not even be requested
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid"><a class="item" href="/d/alpha">Alpha</a></div>"#.to_string(),
    )
    .await;
    mount_html(&server, "/d/alpha", product_page("alpha", "199,00 kr")).await;

    let options = CrawlOptions {
        respect_robots: false,
        ..test_options()
    };
    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        options,
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    assert_eq!(outcome.job.counters.products_found, 1);
}

#[tokio::test]
async fn test_unreachable_robots_is_permissive() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid"><a class="item" href="/d/alpha">Alpha</a></div>"#.to_string(),
    )
    .await;
    mount_html(&server, "/d/alpha", product_page("alpha", "199,00 kr")).await;

    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    // Crawling must not halt because robots.txt is unreachable
    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert_eq!(outcome.job.counters.products_found, 1);
}

#[tokio::test]
async fn test_failed_start_urls_are_fatal() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    // The only start URL always fails; with max_retries = 2 exactly two
    // attempts are made, then the job is fatal
    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let limits = CrawlLimits {
        max_retries: 2,
        ..fast_limits()
    };
    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        limits,
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    assert!(outcome.is_fatal());
    assert_eq!(outcome.job.status, JobStatus::Failed);
    assert!(outcome.job.last_error.is_some());
    assert_eq!(outcome.errors.len(), 1);
}

#[tokio::test]
async fn test_failed_discovered_url_is_not_fatal() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid">
            <a class="item" href="/d/alpha">Alpha</a>
            <a class="item" href="/d/broken">Broken</a>
        </div>"#
            .to_string(),
    )
    .await;
    mount_html(&server, "/d/alpha", product_page("alpha", "199,00 kr")).await;
    Mock::given(method("GET"))
        .and(path("/d/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    // One page failed, but the job as a whole succeeded
    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert_eq!(outcome.job.counters.products_found, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].url.ends_with("/d/broken"));
}

#[tokio::test]
async fn test_product_without_name_is_not_counted() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid"><a class="item" href="/d/nameless">Nameless</a></div>"#.to_string(),
    )
    .await;
    // No h1.name on the page: extraction yields no product, and that is
    // not an error
    mount_html(
        &server,
        "/d/nameless",
        r#"<html><body><span class="price">199,00 kr</span></body></html>"#.to_string(),
    )
    .await;

    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert_eq!(outcome.job.counters.products_found, 0);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn test_inference_discovers_product_links() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    // Twelve product cards sharing class "card", each with exactly one
    // anchor, one image, and a price-looking text, plus unrelated
    // navigation links
    let cards: String = (1..=12)
        .map(|i| {
            format!(
                r#"<div class="card">
                    <a class="item-link" href="/d/{i}"><img src="/img/{i}.jpg"></a>
                    <span class="amount">{i}99 kr</span>
                </div>"#
            )
        })
        .collect();
    mount_html(
        &server,
        "/catalog",
        format!(
            r#"<html><body>
                <nav><a href="/about">About</a><a href="/contact">Contact</a></nav>
                <div class="grid">{cards}</div>
            </body></html>"#
        ),
    )
    .await;

    for i in 1..=12 {
        mount_html(
            &server,
            &format!("/d/{i}"),
            product_page(&format!("item-{i}"), &format!("{i}99,00 kr")),
        )
        .await;
    }

    // The navigation pages must not be crawled
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // No productLink selector in the profile: inference must find the cards
    let options = CrawlOptions {
        infer_selectors: true,
        ..test_options()
    };
    let outcome = run_job(
        shop_profile(None),
        fast_limits(),
        options,
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    assert_eq!(outcome.job.counters.products_found, 12);
}

#[tokio::test]
async fn test_persist_inserts_then_updates() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid">
            <a class="item" href="/d/alpha">Alpha</a>
            <a class="item" href="/d/beta">Beta</a>
        </div>"#
            .to_string(),
    )
    .await;
    mount_html(&server, "/d/alpha", product_page("alpha", "199,00 kr")).await;
    mount_html(&server, "/d/beta", product_page("beta", "249,00 kr")).await;

    let store = Arc::new(MemoryStore::new());

    let first = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        Some(Arc::clone(&store)),
    )
    .await;
    assert_eq!(first.job.counters.products_added, 2);
    assert_eq!(first.job.counters.products_updated, 0);

    // A second job over the same shop updates instead of inserting
    let second = run_job(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        Some(Arc::clone(&store)),
    )
    .await;
    assert_eq!(second.job.counters.products_added, 0);
    assert_eq!(second.job.counters.products_updated, 2);

    assert_eq!(store.len(), 2);
    let stored = store
        .find_existing("Mock Shop", &format!("{}/d/alpha", server.uri()))
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_listing_page_cap_stops_pagination() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    // An endless pagination chain: /page/1 -> /page/2 -> /page/3 -> ...
    for i in 1..=3 {
        mount_html(
            &server,
            &format!("/page/{i}"),
            format!(
                r#"<div class="grid"></div>
                <a rel="next" href="{}/page/{}">Next</a>"#,
                server.uri(),
                i + 1
            ),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/page/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let limits = CrawlLimits {
        max_pages: 2,
        ..fast_limits()
    };
    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        limits,
        test_options(),
        vec![format!("{}/page/1", server.uri())],
        None,
    )
    .await;

    assert_eq!(outcome.job.counters.pages_crawled, 2);
}

#[tokio::test]
async fn test_product_limit_stops_crawl() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let anchors: String = (1..=8)
        .map(|i| format!(r#"<a class="item" href="/d/{i}">Item {i}</a>"#))
        .collect();
    mount_html(&server, "/catalog", format!(r#"<div class="grid">{anchors}</div>"#)).await;
    for i in 1..=8 {
        mount_html(
            &server,
            &format!("/d/{i}"),
            product_page(&format!("item-{i}"), "199,00 kr"),
        )
        .await;
    }

    let limits = CrawlLimits {
        max_products: Some(3),
        concurrency: 1,
        ..fast_limits()
    };
    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        limits,
        test_options(),
        vec![format!("{}/catalog", server.uri())],
        None,
    )
    .await;

    // With one worker, the crawl stops as soon as the limit is reached
    assert_eq!(outcome.job.counters.products_found, 3);
    assert_eq!(outcome.job.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn test_concurrency_bound_is_respected() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    for i in 1..=6 {
        Mock::given(method("GET"))
            .and(path(format!("/d/{i}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(product_page(&format!("item-{i}"), "199,00 kr"))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .mount(&server)
            .await;
    }

    let seeds: Vec<String> = (1..=6).map(|i| format!("{}/d/{}", server.uri(), i)).collect();
    let limits = CrawlLimits {
        concurrency: 2,
        ..fast_limits()
    };

    let started = Instant::now();
    let outcome = run_job(
        shop_profile(Some(".grid a.item")),
        limits,
        test_options(),
        seeds,
        None,
    )
    .await;
    let elapsed = started.elapsed();

    assert_eq!(outcome.job.counters.products_found, 6);
    // Six 100ms responses through two workers take at least three rounds
    assert!(
        elapsed >= std::time::Duration::from_millis(300),
        "elapsed {:?} implies more than 2 fetches in flight",
        elapsed
    );
}

#[tokio::test]
async fn test_cancellation_stops_between_dequeues() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let anchors: String = (1..=20)
        .map(|i| format!(r#"<a class="item" href="/d/{i}">Item {i}</a>"#))
        .collect();
    mount_html(&server, "/catalog", format!(r#"<div class="grid">{anchors}</div>"#)).await;
    for i in 1..=20 {
        mount_html(
            &server,
            &format!("/d/{i}"),
            product_page(&format!("item-{i}"), "199,00 kr"),
        )
        .await;
    }

    let job = CrawlJob::new(
        shop_profile(Some(".grid a.item")),
        CrawlLimits {
            concurrency: 1,
            ..fast_limits()
        },
        vec![format!("{}/catalog", server.uri())],
    );
    let orchestrator = Orchestrator::new(job, test_options()).unwrap();

    // Cancel before the job starts: the flag is observed between dequeues,
    // so nothing is fetched
    orchestrator.cancel_flag().store(true, std::sync::atomic::Ordering::Relaxed);
    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome.job.counters.pages_crawled, 0);
    assert_eq!(outcome.job.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn test_progress_snapshots_are_published() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    mount_html(
        &server,
        "/catalog",
        r#"<div class="grid"><a class="item" href="/d/alpha">Alpha</a></div>"#.to_string(),
    )
    .await;
    mount_html(&server, "/d/alpha", product_page("alpha", "199,00 kr")).await;

    let job = CrawlJob::new(
        shop_profile(Some(".grid a.item")),
        fast_limits(),
        vec![format!("{}/catalog", server.uri())],
    );
    let orchestrator = Orchestrator::new(job, test_options()).unwrap();
    let progress = orchestrator.progress();

    let outcome = orchestrator.run().await.unwrap();

    let last = progress.borrow();
    assert_eq!(last.status, JobStatus::Succeeded);
    assert_eq!(last.counters.products_found, 1);
    assert!(last.ended_at.is_some());
    assert_eq!(last.counters.pages_crawled, outcome.job.counters.pages_crawled);
}
