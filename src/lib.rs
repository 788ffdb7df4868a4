#![deny(missing_docs)]
//! Bypass relay
//!
//! A Telegram bot that resolves direct-download links through third-party
//! bypass APIs and scrapes OTT posters, normalizing the many upstream JSON
//! shapes into one result form.

/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// Error taxonomy
pub mod error;
/// URL extraction from chat messages
pub mod extract;
/// Upstream HTTP fetchers and caches
pub mod fetch;
/// Response normalization
pub mod normalize;
/// Service registry
pub mod services;
/// Utility functions
pub mod utils;
