//! URL detection and recording.

use regex::Regex;
use std::sync::OnceLock;

use crate::graph::LinkGraph;

/// Characters allowed after the scheme of a detected URL.
pub(crate) const URL_CHARS: &str = r"[-_.!~*'()a-zA-Z0-9;/?:@&=+$,%#]";

/// Index set collecting every recorded URL.
pub const URL_INDEX: &str = "url";
/// Index set collecting every recorded domain.
pub const DOMAIN_INDEX: &str = "domain";

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| {
        Regex::new(&format!(r"https?://{URL_CHARS}+"))
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// URLs in `text`, in order of appearance, duplicates kept.
#[must_use]
pub fn find_urls(text: &str) -> Vec<&str> {
    url_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

/// Host part of a URL: everything between `://` and the next `/`.
#[must_use]
pub fn domain_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

impl LinkGraph {
    /// Record every URL found in `text` under its domain and the index sets.
    pub async fn record_urls(&self, text: &str) -> anyhow::Result<Vec<String>> {
        let urls = find_urls(text);
        for url in &urls {
            let domain = domain_of(url);
            self.record_pair(URL_INDEX, url).await?;
            self.record_pair(domain, url).await?;
            self.record_pair(DOMAIN_INDEX, domain).await?;
        }
        Ok(urls.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_find_urls_in_order() {
        let urls = find_urls("see http://example.com/x and http://example.com/y");
        assert_eq!(urls, vec!["http://example.com/x", "http://example.com/y"]);
    }

    #[test]
    fn test_find_urls_keeps_duplicates_and_stops_at_whitespace() {
        let urls = find_urls("https://a.io/p?q=1#f https://a.io/p?q=1#f\nnot a url");
        assert_eq!(urls, vec!["https://a.io/p?q=1#f", "https://a.io/p?q=1#f"]);
        assert!(find_urls("ftp://a.io nothing here").is_empty());
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("http://example.com/x/y"), "example.com");
        assert_eq!(domain_of("https://example.com"), "example.com");
        assert_eq!(domain_of("https://a.io:8080/p"), "a.io:8080");
    }

    #[tokio::test]
    async fn test_record_urls_fills_index_sets() {
        let graph = LinkGraph::new(Arc::new(MemoryStore::new()));

        let urls = graph
            .record_urls("see http://example.com/x and http://example.com/y")
            .await
            .unwrap();

        assert_eq!(urls, vec!["http://example.com/x", "http://example.com/y"]);
        assert_eq!(
            graph.members(URL_INDEX).await.unwrap(),
            vec!["http://example.com/x", "http://example.com/y"]
        );
        assert_eq!(
            graph.members("example.com").await.unwrap(),
            vec!["domain", "http://example.com/x", "http://example.com/y"]
        );
        assert_eq!(
            graph.members(DOMAIN_INDEX).await.unwrap(),
            vec!["example.com"]
        );
    }
}
