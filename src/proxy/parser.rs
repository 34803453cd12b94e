//! Candidate list parsing and writing

use crate::proxy::models::{Proxy, ProxyScheme};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Matches `scheme://host:port` lines
static URL_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|socks[45])://([^:/\s]+):(\d{1,5})/?$").expect("Invalid proxy URL regex")
});

/// Parses `host:port` candidate lists
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single line into a candidate.
    ///
    /// Supports `host:port` and `scheme://host:port`. Blank lines, `#`
    /// comments, and anything malformed yield `None` so callers can skip
    /// them without aborting the run.
    pub fn parse_line(line: &str, default_scheme: ProxyScheme) -> Option<Proxy> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        if let Some(proxy) = Self::parse_url_line(line) {
            return Some(proxy);
        }

        Self::parse_endpoint_line(line, default_scheme)
    }

    /// Parse `scheme://host:port`
    fn parse_url_line(line: &str) -> Option<Proxy> {
        let caps = URL_LINE_REGEX.captures(line)?;

        let scheme = match &caps[1] {
            "http" => ProxyScheme::Http,
            "https" => ProxyScheme::Https,
            "socks4" => ProxyScheme::Socks4,
            "socks5" => ProxyScheme::Socks5,
            _ => return None,
        };

        let host = caps[2].to_string();
        let port = Self::parse_port(&caps[3])?;

        Some(Proxy::new(host, port, scheme))
    }

    /// Parse bare `host:port`
    fn parse_endpoint_line(line: &str, default_scheme: ProxyScheme) -> Option<Proxy> {
        let (host, port_str) = line.rsplit_once(':')?;
        if host.is_empty() || host.contains(':') || host.contains(char::is_whitespace) {
            return None;
        }
        let port = Self::parse_port(port_str)?;

        Some(Proxy::new(host.to_string(), port, default_scheme))
    }

    fn parse_port(s: &str) -> Option<u16> {
        let port: u16 = s.parse().ok()?;
        if port == 0 {
            return None;
        }
        Some(port)
    }

    /// Parse candidates from a string, skipping lines that don't parse
    pub fn parse_string(content: &str, default_scheme: ProxyScheme) -> Vec<Proxy> {
        content
            .lines()
            .filter_map(|line| Self::parse_line(line, default_scheme))
            .collect()
    }

    /// Parse candidates from a file
    pub fn parse_file<P: AsRef<Path>>(path: P, default_scheme: ProxyScheme) -> Result<Vec<Proxy>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_string(&content, default_scheme))
    }

    /// Write candidates to a file, one `host:port` per line
    pub fn save_to_file<P: AsRef<Path>>(proxies: &[Proxy], path: P) -> Result<()> {
        let mut content: String = proxies
            .iter()
            .map(|p| p.endpoint())
            .collect::<Vec<_>>()
            .join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        fs::write(path, content)?;
        Ok(())
    }
}
