//! Robots.txt compliance
//!
//! Per-origin fetching, caching, and evaluation of robots.txt rules. The
//! guard is deliberately permissive on failure: an unreachable or
//! unparseable robots.txt must not halt the crawl, so such origins are
//! cached as allow-all.

mod ruleset;

pub use ruleset::RobotsRuleset;

use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Per-origin robots.txt gate shared by all crawl workers
///
/// Rulesets are fetched lazily on the first URL seen for an origin and
/// cached for the remainder of the job; there is no expiry within a job.
/// Only the cache lookup/insert happens under the lock — the robots.txt
/// fetch itself does not block other workers.
pub struct RobotsGuard {
    client: Client,
    user_agent: String,
    enabled: bool,
    cache: Mutex<HashMap<String, RobotsRuleset>>,
}

impl RobotsGuard {
    /// Creates a guard; when `enabled` is false every URL is allowed and
    /// no robots.txt is ever fetched
    pub fn new(client: Client, user_agent: impl Into<String>, enabled: bool) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            enabled,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether the crawler may fetch `url`
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL about to be fetched
    ///
    /// # Returns
    ///
    /// * `true` - The URL is allowed (or the guard is disabled, or the
    ///   origin's robots.txt could not be fetched)
    /// * `false` - An explicit robots.txt rule disallows the URL
    pub async fn is_allowed(&self, url: &Url) -> bool {
        if !self.enabled {
            return true;
        }

        let origin = url.origin().ascii_serialization();

        if let Some(ruleset) = self.cache.lock().await.get(&origin) {
            return ruleset.is_allowed(url.as_str(), &self.user_agent);
        }

        // Fetch outside the lock; a concurrent worker racing on the same
        // origin at worst fetches the same rules once more
        let ruleset = self.fetch_ruleset(&origin).await;
        let allowed = ruleset.is_allowed(url.as_str(), &self.user_agent);
        self.cache.lock().await.insert(origin, ruleset);
        allowed
    }

    /// Fetches and parses `{origin}/robots.txt`, falling back to allow-all
    /// on any failure
    async fn fetch_ruleset(&self, origin: &str) -> RobotsRuleset {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching robots.txt from {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => RobotsRuleset::from_content(&body),
                Err(e) => {
                    tracing::warn!("Failed to read robots.txt from {}: {}", robots_url, e);
                    RobotsRuleset::allow_all()
                }
            },
            Ok(response) => {
                tracing::warn!(
                    "robots.txt request for {} returned HTTP {}, allowing all",
                    robots_url,
                    response.status()
                );
                RobotsRuleset::allow_all()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch robots.txt from {}: {}, allowing all",
                    robots_url,
                    e
                );
                RobotsRuleset::allow_all()
            }
        }
    }
}
