//! Proxy finder, builds a candidate list from public proxy-list sites
//!
//! Fetches each source, extracts `host:port` candidates by line parsing
//! with a regex fallback for HTML pages, and deduplicates the result.
//! A source that fails to fetch is skipped; the run only fails when no
//! source produced anything.

use crate::proxy::models::{Proxy, ProxyScheme};
use crate::proxy::parser::ProxyParser;
use crate::Result;
use anyhow::bail;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for source fetches in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default user agent for source fetches
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Matches IP:PORT patterns embedded in arbitrary text
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})\b").expect("Invalid IP:PORT regex")
});

/// What fetching a single source produced
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Name of the source that was fetched
    pub source: String,
    /// Candidates extracted from it
    pub proxies: Vec<Proxy>,
    /// Error message if the fetch failed
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn success(source: String, proxies: Vec<Proxy>) -> Self {
        Self {
            source,
            proxies,
            error: None,
        }
    }

    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            proxies: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for the proxy finder
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Timeout for each source fetch
    pub timeout: Duration,
    /// User agent sent with source fetches
    pub user_agent: String,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FinderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// A website that publishes proxy lists
#[derive(Debug, Clone)]
pub struct ProxySource {
    /// Name of the proxy source
    pub name: String,
    /// URL to fetch candidates from
    pub url: String,
    /// Scheme assigned to candidates from this source
    pub scheme: ProxyScheme,
}

impl ProxySource {
    pub fn new(name: &str, url: &str, scheme: ProxyScheme) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            scheme,
        }
    }
}

/// The built-in set of public proxy-list sources
pub fn builtin_sources() -> Vec<ProxySource> {
    vec![
        ProxySource::new(
            "proxyscrape HTTP",
            "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=all&ssl=all&anonymity=all",
            ProxyScheme::Http,
        ),
        ProxySource::new(
            "proxy-list.download HTTP",
            "https://www.proxy-list.download/api/v1/get?type=http",
            ProxyScheme::Http,
        ),
        ProxySource::new(
            "proxy-list.download HTTPS",
            "https://www.proxy-list.download/api/v1/get?type=https",
            ProxyScheme::Https,
        ),
        ProxySource::new(
            "free-proxy-list.net",
            "https://free-proxy-list.net/",
            ProxyScheme::Http,
        ),
    ]
}

/// Fetches candidate lists from proxy-list websites
pub struct ProxyFinder {
    client: Client,
}

impl ProxyFinder {
    /// Create a finder with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FinderConfig::default())
    }

    /// Create a finder with custom configuration
    pub fn with_config(config: FinderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch one source and extract its candidates
    pub async fn fetch_source(&self, source: &ProxySource) -> Result<Vec<Proxy>> {
        let response = self.client.get(&source.url).send().await?;
        let content = response.text().await?;
        Ok(Self::extract_candidates(&content, source.scheme))
    }

    /// Fetch every source, skipping the ones that fail
    pub async fn fetch_sources(&self, sources: &[ProxySource]) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::new();

        for source in sources {
            let outcome = match self.fetch_source(source).await {
                Ok(proxies) => FetchOutcome::success(source.name.clone(), proxies),
                Err(e) => FetchOutcome::failure(source.name.clone(), e.to_string()),
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Fetch all sources and collapse the outcomes into one deduplicated
    /// candidate set.
    ///
    /// Errors only when every source failed or nothing was extracted;
    /// per-source failures are reported in the returned outcomes.
    pub async fn run(&self, sources: &[ProxySource]) -> Result<(Vec<Proxy>, Vec<FetchOutcome>)> {
        let outcomes = self.fetch_sources(sources).await;

        if outcomes.iter().all(|o| !o.is_success()) {
            bail!("all {} proxy sources failed", sources.len());
        }

        let mut proxies: Vec<Proxy> = outcomes
            .iter()
            .flat_map(|o| o.proxies.iter().cloned())
            .collect();
        proxies = Self::dedup(proxies);

        if proxies.is_empty() {
            bail!("no proxy candidates extracted from any source");
        }

        Ok((proxies, outcomes))
    }

    /// Extract candidates from raw source content.
    ///
    /// Plain-text lists parse line by line; when that yields nothing the
    /// content is probably HTML, so fall back to regex extraction.
    pub fn extract_candidates(content: &str, scheme: ProxyScheme) -> Vec<Proxy> {
        let mut proxies = ProxyParser::parse_string(content, scheme);

        if proxies.is_empty() {
            proxies = Self::extract_with_regex(content, scheme);
        }

        Self::dedup(proxies)
    }

    /// Extract IP:PORT candidates embedded in arbitrary text
    fn extract_with_regex(content: &str, scheme: ProxyScheme) -> Vec<Proxy> {
        IP_PORT_REGEX
            .captures_iter(content)
            .filter_map(|cap| {
                let host = cap.get(1)?.as_str().to_string();
                let port: u16 = cap.get(2)?.as_str().parse().ok()?;

                for octet in host.split('.') {
                    let num: u32 = octet.parse().ok()?;
                    if num > 255 {
                        return None;
                    }
                }

                if port == 0 {
                    return None;
                }

                Some(Proxy::new(host, port, scheme))
            })
            .collect()
    }

    /// Deduplicate by `host:port`
    fn dedup(mut proxies: Vec<Proxy>) -> Vec<Proxy> {
        proxies.sort_by(|a, b| a.endpoint().cmp(&b.endpoint()));
        proxies.dedup_by(|a, b| a.host == b.host && a.port == b.port);
        proxies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finder_config_default() {
        let config = FinderConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_finder_config_builder() {
        let config = FinderConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("Custom Agent".to_string());

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "Custom Agent");
    }

    #[test]
    fn test_builtin_sources() {
        let sources = builtin_sources();
        assert!(!sources.is_empty());
        for source in &sources {
            assert!(!source.name.is_empty());
            assert!(source.url.starts_with("http"));
        }
    }

    #[test]
    fn test_fetch_outcome() {
        let proxies = vec![Proxy::new("1.2.3.4".to_string(), 8080, ProxyScheme::Http)];
        let ok = FetchOutcome::success("a-source".to_string(), proxies);
        assert!(ok.is_success());
        assert_eq!(ok.proxies.len(), 1);

        let failed = FetchOutcome::failure("a-source".to_string(), "connect error".to_string());
        assert!(!failed.is_success());
        assert!(failed.proxies.is_empty());
        assert_eq!(failed.error.as_deref(), Some("connect error"));
    }

    #[test]
    fn test_extract_candidates_plain_list() {
        let content = "192.168.1.1:8080\n192.168.1.2:3128\n10.0.0.1:1080\n";
        let proxies = ProxyFinder::extract_candidates(content, ProxyScheme::Http);
        assert_eq!(proxies.len(), 3);
    }

    #[test]
    fn test_extract_candidates_html_fallback() {
        let content = r#"
<html>
<body>
<table>
<tr><td>192.168.1.1</td><td>8080</td></tr>
</table>
Some text with 10.0.0.1:3128 embedded
</body>
</html>
"#;
        let proxies = ProxyFinder::extract_candidates(content, ProxyScheme::Http);
        assert!(proxies
            .iter()
            .any(|p| p.host == "10.0.0.1" && p.port == 3128));
    }

    #[test]
    fn test_extract_candidates_deduplicates() {
        let content = "192.168.1.1:8080\n192.168.1.1:8080\n192.168.1.2:3128\n192.168.1.1:8080\n";
        let proxies = ProxyFinder::extract_candidates(content, ProxyScheme::Http);
        assert_eq!(proxies.len(), 2);
    }

    #[test]
    fn test_extract_candidates_idempotent() {
        let content = "192.168.1.1:8080\n192.168.1.2:3128\n";
        let first = ProxyFinder::extract_candidates(content, ProxyScheme::Http);
        let second = ProxyFinder::extract_candidates(content, ProxyScheme::Http);
        assert_eq!(first, second);

        // Feeding the output back in adds nothing new
        let rendered: String = first.iter().map(|p| p.endpoint() + "\n").collect();
        let reparsed = ProxyFinder::extract_candidates(&rendered, ProxyScheme::Http);
        assert_eq!(reparsed, first);
    }

    #[test]
    fn test_regex_rejects_invalid_octets() {
        let content = "Invalid IP: 999.999.999.999:8080";
        let proxies = ProxyFinder::extract_with_regex(content, ProxyScheme::Http);
        assert!(proxies.is_empty());
    }

    #[test]
    fn test_regex_rejects_zero_port() {
        let content = "Zero port: 192.168.1.1:0";
        let proxies = ProxyFinder::extract_with_regex(content, ProxyScheme::Http);
        assert!(proxies.is_empty());
    }

    #[tokio::test]
    async fn test_run_all_sources_unreachable() {
        let finder = ProxyFinder::with_config(
            FinderConfig::new().with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        // Reserved TEST-NET-1 address, nothing listens there
        let sources = vec![ProxySource::new(
            "unreachable",
            "http://192.0.2.1:9/",
            ProxyScheme::Http,
        )];

        assert!(finder.run(&sources).await.is_err());
    }
}
