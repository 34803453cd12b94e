//! Liveness checking for proxy candidates

use crate::proxy::models::{CheckResult, Proxy, ProxyScheme};
use crate::Result;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Proxy as ReqwestProxy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Default timeout for each liveness check in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 20;

/// Default endpoint to test candidates against
const DEFAULT_TEST_URL: &str = "http://httpbin.org/ip";

/// Configuration for the proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each check
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// Endpoint to test candidates against
    pub test_url: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }
}

/// Checks whether proxy candidates are alive
#[derive(Clone)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a checker with default configuration
    pub fn new() -> Self {
        Self {
            config: CheckerConfig::default(),
        }
    }

    /// Create a checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Check a single candidate.
    ///
    /// Alive means one GET to the test endpoint, routed through the
    /// candidate, came back 2xx within the timeout. Everything else is
    /// dead or timeout; per-candidate failure is never an error.
    pub async fn check_one(&self, proxy: &Proxy) -> CheckResult {
        let start = Instant::now();

        let client = match self.build_client(proxy) {
            Ok(client) => client,
            Err(e) => return CheckResult::dead(proxy.clone(), e.to_string()),
        };

        let attempt = async {
            let response = client.get(&self.config.test_url).send().await?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(self.config.timeout, attempt).await {
            Ok(Ok((status, body))) => {
                if status.is_success() {
                    let elapsed = start.elapsed().as_millis() as u64;
                    CheckResult::alive(proxy.clone(), elapsed, Self::extract_origin(&body))
                } else {
                    CheckResult::dead(proxy.clone(), format!("HTTP status: {}", status))
                }
            }
            Ok(Err(e)) => CheckResult::dead(proxy.clone(), e.to_string()),
            Err(_) => CheckResult::timeout(proxy.clone()),
        }
    }

    /// Check all candidates with bounded parallelism.
    ///
    /// Checks run out of order but results come back in input order.
    pub async fn check_all(&self, proxies: Vec<Proxy>) -> Vec<CheckResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

        let mut indexed = stream::iter(proxies.into_iter().enumerate())
            .map(|(index, proxy)| {
                let sem = Arc::clone(&semaphore);
                let checker = self.clone();
                async move {
                    // Acquire only fails if the semaphore is closed, which
                    // can't happen while we hold the Arc.
                    let _permit = sem.acquire().await.expect("Semaphore closed unexpectedly");
                    (index, checker.check_one(&proxy).await)
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect::<Vec<_>>()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// Keep only the alive results, preserving order
    pub fn alive(results: Vec<CheckResult>) -> Vec<CheckResult> {
        results.into_iter().filter(|r| r.is_alive()).collect()
    }

    /// Build a reqwest client routed through the candidate
    fn build_client(&self, proxy: &Proxy) -> Result<Client> {
        let proxy_url = proxy.url();

        let reqwest_proxy = match proxy.scheme {
            ProxyScheme::Http | ProxyScheme::Https => ReqwestProxy::http(&proxy_url)?,
            ProxyScheme::Socks4 | ProxyScheme::Socks5 => ReqwestProxy::all(&proxy_url)?,
        };

        let client = Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.config.timeout)
            .build()?;

        Ok(client)
    }

    /// Pull the `origin` field out of an httpbin-style JSON body
    fn extract_origin(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value.get("origin")?.as_str().map(|s| s.to_string())
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_config_default() {
        let config = CheckerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.test_url, DEFAULT_TEST_URL);
    }

    #[test]
    fn test_checker_config_builder() {
        let config = CheckerConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_concurrency(50)
            .with_test_url("http://example.com".to_string());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.test_url, "http://example.com");
    }

    #[test]
    fn test_extract_origin() {
        assert_eq!(
            ProxyChecker::extract_origin(r#"{"origin": "1.2.3.4"}"#),
            Some("1.2.3.4".to_string())
        );
        assert_eq!(ProxyChecker::extract_origin("not json"), None);
        assert_eq!(ProxyChecker::extract_origin(r#"{"other": true}"#), None);
    }

    #[test]
    fn test_alive_filter_preserves_order() {
        let a = Proxy::new("1.2.3.4".to_string(), 8080, ProxyScheme::Http);
        let b = Proxy::new("5.6.7.8".to_string(), 3128, ProxyScheme::Http);
        let c = Proxy::new("9.9.9.9".to_string(), 80, ProxyScheme::Http);

        let results = vec![
            CheckResult::alive(a.clone(), 10, None),
            CheckResult::timeout(b),
            CheckResult::alive(c.clone(), 20, None),
        ];

        let alive = ProxyChecker::alive(results);
        assert_eq!(alive.len(), 2);
        assert_eq!(alive[0].proxy, a);
        assert_eq!(alive[1].proxy, c);
    }

    #[tokio::test]
    async fn test_check_all_empty_input() {
        let checker = ProxyChecker::new();
        let results = checker.check_all(Vec::new()).await;
        assert!(results.is_empty());
    }
}
