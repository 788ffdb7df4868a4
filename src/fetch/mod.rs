//! Upstream fetching: HTTP transport, result caching, retries and the two
//! fetchers built on them.

/// Bypass fetcher
pub mod bypass;
/// Result cache
pub mod cache;
/// HTTP transport
pub mod http;
/// Poster fetcher
pub mod poster;
/// Retry policy
pub mod retry;

pub use bypass::{BulkResult, BypassFetcher};
pub use cache::ResultCache;
pub use http::{HttpReply, HttpTransport, ReqwestTransport};
pub use poster::PosterFetcher;
pub use retry::RetryPolicy;

use crate::error::RelayError;

/// Accepts only absolute `http`/`https` URLs with a host.
///
/// # Errors
///
/// Returns `RelayError::InvalidUrl` otherwise.
///
/// # Examples
///
/// ```
/// use bypass_relay::fetch::validate_url;
///
/// assert!(validate_url("https://gdflix.dev/file/abc").is_ok());
/// assert!(validate_url("notaurl").is_err());
/// ```
pub fn validate_url(raw: &str) -> Result<url::Url, RelayError> {
    let parsed = url::Url::parse(raw.trim()).map_err(|_| RelayError::InvalidUrl(raw.to_string()))?;
    let scheme_ok = matches!(parsed.scheme(), "http" | "https");
    let host_ok = parsed.host_str().is_some_and(|h| !h.is_empty());
    if scheme_ok && host_ok {
        Ok(parsed)
    } else {
        Err(RelayError::InvalidUrl(raw.to_string()))
    }
}
