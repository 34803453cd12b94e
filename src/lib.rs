//! Proxy Scout - Proxy Finder and Checker
//!
//! Builds proxy candidate lists from public proxy-list websites and
//! checks which candidates are alive by routing a test request through
//! each one.

pub mod proxy;

pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
