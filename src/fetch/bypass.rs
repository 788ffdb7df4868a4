//! Bypass fetcher: single links, multi-variant links and bulk batches.

use super::cache::ResultCache;
use super::http::{decode_reply, encode_query_value, HttpTransport};
use super::validate_url;
use crate::error::RelayError;
use crate::normalize::{
    is_truthy, normalize, value_to_string, LinkMap, Normalized, NormalizedResult,
};
use crate::services::{RequestShape, ServiceDescriptor, ServiceKind, ServiceRegistry, BULK_SERVICE_ID};
use lazy_regex::regex_captures;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Terabox mirror hosts rewritten to [`TERABOX_CANONICAL_HOST`].
const TERABOX_MIRRORS: &[&str] = &[
    "1024terabox.com",
    "1024tera.com",
    "teraboxapp.com",
    "terabox.app",
    "terabox.fun",
    "teraboxlink.com",
    "terasharelink.com",
    "teraboxshare.com",
    "freeterabox.com",
    "4funbox.com",
    "mirrobox.com",
    "nephobox.com",
    "momerybox.com",
    "tibibox.com",
];

/// Canonical Terabox host.
pub const TERABOX_CANONICAL_HOST: &str = "terabox.com";

/// Upstream answer to a bulk request, kept as the upstream shaped it
#[derive(Debug, Clone, PartialEq)]
pub enum BulkResult {
    /// A JSON array (usually one link or error string per input URL)
    List(Vec<Value>),
    /// A JSON object (usually keyed by input URL)
    Mapping(Map<String, Value>),
    /// Anything else
    Opaque(Value),
}

impl From<Value> for BulkResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items),
            Value::Object(map) => Self::Mapping(map),
            other => Self::Opaque(other),
        }
    }
}

/// A prepared upstream request
#[derive(Debug, Clone, PartialEq)]
enum UpstreamRequest {
    Get(String),
    Post(String, Value),
}

/// Rewrites known Terabox mirror hosts to the canonical one.
///
/// Unparseable URLs and foreign hosts are returned unchanged.
#[must_use]
pub fn canonicalize_terabox(target: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(target) else {
        return target.to_string();
    };
    let host = parsed
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_lowercase())
        .unwrap_or_default();

    if TERABOX_MIRRORS.contains(&host.as_str()) && parsed.set_host(Some(TERABOX_CANONICAL_HOST)).is_ok() {
        return parsed.to_string();
    }
    target.to_string()
}

/// Extracts the content id from a `gofile.io/d/<id>` link.
#[must_use]
pub fn gofile_id(target: &str) -> Option<String> {
    regex_captures!(r"gofile\.io/d/([A-Za-z0-9]+)", target).map(|(_, id)| id.to_string())
}

fn prepare_request(
    service: &ServiceDescriptor,
    endpoint: &str,
    target: &str,
) -> Result<UpstreamRequest, RelayError> {
    if service.request == RequestShape::PostJson {
        return Ok(UpstreamRequest::Post(
            endpoint.to_string(),
            json!({ "url": target }),
        ));
    }

    let query = match service.id {
        "gofile" if service.custom => gofile_id(target).ok_or_else(|| {
            RelayError::InvalidInput("Invalid Gofile link. Expected gofile.io/d/<id>.".to_string())
        })?,
        "terabox" => encode_query_value(&canonicalize_terabox(target)),
        _ => encode_query_value(target),
    };
    Ok(UpstreamRequest::Get(format!("{endpoint}{query}")))
}

/// Resolves bypass links through the configured upstream services
pub struct BypassFetcher {
    registry: Arc<ServiceRegistry>,
    http: Arc<dyn HttpTransport>,
    cache: ResultCache<Normalized>,
    timeout: Duration,
    bulk_timeout: Duration,
}

impl BypassFetcher {
    /// Creates a fetcher over `registry`, sending requests through `http`.
    #[must_use]
    pub fn new(
        registry: Arc<ServiceRegistry>,
        http: Arc<dyn HttpTransport>,
        cache: ResultCache<Normalized>,
        timeout: Duration,
        bulk_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            http,
            cache,
            timeout,
            bulk_timeout,
        }
    }

    /// The registry this fetcher resolves aliases with.
    #[must_use]
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    async fn send(&self, service: &str, request: &UpstreamRequest, timeout: Duration) -> Result<Value, RelayError> {
        let reply = match request {
            UpstreamRequest::Get(api_url) => {
                info!("Bypassing via [{service}] -> {api_url}");
                self.http.get(api_url, timeout).await
            }
            UpstreamRequest::Post(api_url, body) => {
                info!("Bypassing via [{service}] -> POST {api_url}");
                self.http.post_json(api_url, body, timeout).await
            }
        }
        .inspect_err(|e| error!("[{service}] bypass HTTP error: {e}"))?;

        decode_reply(service, &reply)
    }

    /// Resolves `target_url` through the service behind `alias`.
    ///
    /// # Errors
    ///
    /// Input errors (unknown alias, invalid URL, bad service-specific input)
    /// are returned before any network call. Transport and protocol failures
    /// of the upstream are returned as-is.
    pub async fn fetch(&self, alias: &str, target_url: &str) -> Result<Normalized, RelayError> {
        let service = self
            .registry
            .resolve(alias)
            .filter(|s| s.kind == ServiceKind::Bypass)
            .ok_or_else(|| RelayError::UnknownService(alias.to_string()))?;
        let endpoint = service
            .endpoint
            .as_deref()
            .ok_or_else(|| RelayError::EndpointNotConfigured(service.id.to_string()))?;

        validate_url(target_url)?;
        let request = prepare_request(service, endpoint, target_url)?;

        if let Some(hit) = self.cache.get(service.id, target_url).await {
            return Ok(hit);
        }

        let data = self.send(service.id, &request, self.timeout).await?;
        let Value::Object(obj) = &data else {
            return Err(RelayError::UnexpectedResponse);
        };

        let result = if service.request == RequestShape::PostJson {
            // Transfer.it answers with a bare `{url}` and nothing else.
            let direct = obj
                .get("url")
                .filter(|v| is_truthy(v))
                .ok_or(RelayError::FileExpired)?;
            let mut result = NormalizedResult::empty(service.id);
            result.links = LinkMap::from_iter([("Direct Link", value_to_string(direct))]);
            Normalized::Single(result)
        } else {
            if obj.get("success").is_some_and(|v| !is_truthy(v)) {
                let message = obj
                    .get("message")
                    .filter(|v| is_truthy(v))
                    .map_or_else(|| "Bypass failed.".to_string(), value_to_string);
                return Err(RelayError::Rejected(message));
            }
            normalize(&data, service.id)
        };

        self.cache
            .insert(service.id, target_url, result.clone())
            .await;
        Ok(result)
    }

    /// Sends every URL to the bulk endpoint in one request.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidBatch` with the number of invalid URLs if
    /// any entry fails validation; no request is made in that case.
    pub async fn fetch_bulk(&self, urls: &[String]) -> Result<BulkResult, RelayError> {
        if urls.is_empty() {
            return Err(RelayError::InvalidInput("No URLs provided.".to_string()));
        }
        let invalid = urls.iter().filter(|u| validate_url(u).is_err()).count();
        if invalid > 0 {
            return Err(RelayError::InvalidBatch(invalid));
        }

        let api_url = self
            .registry
            .by_id(BULK_SERVICE_ID)
            .and_then(|s| s.endpoint.clone())
            .ok_or_else(|| RelayError::EndpointNotConfigured(BULK_SERVICE_ID.to_string()))?;

        info!("Bulk bypassing {} links via {api_url}", urls.len());
        let request = UpstreamRequest::Post(api_url, json!({ "urls": urls }));
        let data = self.send(BULK_SERVICE_ID, &request, self.bulk_timeout).await?;
        Ok(BulkResult::from(data))
    }
}
