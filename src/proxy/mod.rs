//! Proxy finding and checking
//!
//! This module provides functionality for:
//! - Parsing proxy candidates from `host:port` lists
//! - Fetching candidate lists from public proxy-list websites
//! - Checking candidate liveness with bounded parallelism

pub mod checker;
pub mod finder;
pub mod models;
pub mod parser;

pub use checker::{CheckerConfig, ProxyChecker};
pub use finder::{builtin_sources, FetchOutcome, FinderConfig, ProxyFinder, ProxySource};
pub use models::{CheckResult, CheckStatus, Proxy, ProxyScheme};
pub use parser::ProxyParser;
