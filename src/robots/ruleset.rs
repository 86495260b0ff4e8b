use robotstxt::DefaultMatcher;

/// A per-origin robots.txt decision function
///
/// Wraps the `robotstxt` crate's matcher behind the two states the crawler
/// cares about: parsed rules, or permissive allow-all (also used when
/// robots.txt could not be fetched).
#[derive(Debug, Clone)]
pub struct RobotsRuleset {
    content: String,
    allow_all: bool,
}

impl RobotsRuleset {
    /// Creates a ruleset from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ruleset that allows every URL
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
