//! OTT poster fetcher.

use super::cache::ResultCache;
use super::http::{decode_reply, encode_query_value, HttpTransport};
use super::retry::RetryPolicy;
use super::validate_url;
use crate::error::RelayError;
use crate::normalize::poster::{normalize_poster, PosterInfo};
use crate::services::{ServiceKind, ServiceRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fetches artwork from the poster workers, retrying transport failures
pub struct PosterFetcher {
    registry: Arc<ServiceRegistry>,
    http: Arc<dyn HttpTransport>,
    cache: ResultCache<PosterInfo>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl PosterFetcher {
    /// Creates a poster fetcher.
    #[must_use]
    pub fn new(
        registry: Arc<ServiceRegistry>,
        http: Arc<dyn HttpTransport>,
        cache: ResultCache<PosterInfo>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            http,
            cache,
            retry,
            timeout,
        }
    }

    /// Scrapes poster info for `target_url` through the worker behind `alias`.
    ///
    /// # Errors
    ///
    /// Same taxonomy as the bypass fetcher. Transport errors are returned
    /// only after the retry policy is exhausted.
    pub async fn fetch(&self, alias: &str, target_url: &str) -> Result<PosterInfo, RelayError> {
        let service = self
            .registry
            .resolve(alias)
            .filter(|s| s.kind == ServiceKind::Poster)
            .ok_or_else(|| RelayError::UnknownService(alias.to_string()))?;
        let endpoint = service
            .endpoint
            .as_deref()
            .ok_or_else(|| RelayError::EndpointNotConfigured(service.id.to_string()))?;

        validate_url(target_url)?;

        if let Some(hit) = self.cache.get(service.id, target_url).await {
            return Ok(hit);
        }

        let worker_url = format!("{endpoint}{}", encode_query_value(target_url));
        info!("Fetching poster via [{}] -> {worker_url}", service.id);

        let (http, url, timeout, id) = (&self.http, worker_url.as_str(), self.timeout, service.id);
        let reply = self
            .retry
            .run(|| async move {
                http.get(url, timeout)
                    .await
                    .inspect_err(|e| warn!("[{id}] poster request failed: {e}"))
            })
            .await?;

        let data = decode_reply(service.id, &reply)?;
        let info = normalize_poster(&data, service.display_name)
            .ok_or_else(|| RelayError::Rejected("Could not parse poster info.".to_string()))?;

        self.cache
            .insert(service.id, target_url, info.clone())
            .await;
        Ok(info)
    }
}
