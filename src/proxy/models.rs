//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme a proxy candidate speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProxyScheme {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyScheme::Http => write!(f, "http"),
            ProxyScheme::Https => write!(f, "https"),
            ProxyScheme::Socks4 => write!(f, "socks4"),
            ProxyScheme::Socks5 => write!(f, "socks5"),
        }
    }
}

/// A proxy candidate parsed from text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub scheme: ProxyScheme,
}

impl Proxy {
    pub fn new(host: String, port: u16, scheme: ProxyScheme) -> Self {
        Self { host, port, scheme }
    }

    /// Full proxy URL, e.g. `http://1.2.3.4:8080`
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Bare `host:port` form, also the deduplication key
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Outcome of a single liveness check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CheckStatus {
    Alive,
    Dead(String),
    Timeout,
}

/// A proxy candidate plus the result of checking it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub proxy: Proxy,
    pub status: CheckStatus,
    pub latency_ms: Option<u64>,
    /// IP the test endpoint saw the request coming from, when it reported one
    pub exit_ip: Option<String>,
}

impl CheckResult {
    pub fn alive(proxy: Proxy, latency_ms: u64, exit_ip: Option<String>) -> Self {
        Self {
            proxy,
            status: CheckStatus::Alive,
            latency_ms: Some(latency_ms),
            exit_ip,
        }
    }

    pub fn dead(proxy: Proxy, reason: String) -> Self {
        Self {
            proxy,
            status: CheckStatus::Dead(reason),
            latency_ms: None,
            exit_ip: None,
        }
    }

    pub fn timeout(proxy: Proxy) -> Self {
        Self {
            proxy,
            status: CheckStatus::Timeout,
            latency_ms: None,
            exit_ip: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.status, CheckStatus::Alive)
    }
}
