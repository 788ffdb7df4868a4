//! End-to-end fetcher tests against a local HTTP server.

use bypass_relay::error::RelayError;
use bypass_relay::fetch::{
    BulkResult, BypassFetcher, HttpTransport, PosterFetcher, ReqwestTransport, ResultCache,
    RetryPolicy,
};
use bypass_relay::normalize::Normalized;
use bypass_relay::services::ServiceRegistry;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry_for(server: &MockServer) -> Arc<ServiceRegistry> {
    let base = server.uri();
    let overrides = HashMap::from([
        ("gdflix".to_string(), format!("{base}/gd.php?url=")),
        ("transfer_it".to_string(), format!("{base}/post")),
        ("bypass_bulk".to_string(), format!("{base}/bulk")),
        ("gofile".to_string(), format!("{base}/gofile/")),
        ("netflix".to_string(), format!("{base}/netflix/?url=")),
    ]);
    Arc::new(ServiceRegistry::new(&overrides))
}

fn bypass_fetcher(server: &MockServer, timeout: Duration) -> BypassFetcher {
    let http: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
    BypassFetcher::new(
        registry_for(server),
        http,
        ResultCache::new(Duration::from_secs(60), 50),
        timeout,
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_single_result_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gd.php"))
        .and(query_param("url", "https://gdflix.example/file/abc"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Movie.mkv",
            "filesize": "1.4 GB",
            "links": {
                "instant_final": "https://instant.example/x",
                "cloud_r2": {"link": "https://r2.example/x"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_secs(5));
    let first = fetcher.fetch("gdf", "https://gdflix.example/file/abc").await;
    let second = fetcher.fetch("gdflix", "https://gdflix.example/file/abc").await;

    let Ok(Normalized::Single(result)) = &first else {
        panic!("expected a single result, got {first:?}");
    };
    assert_eq!(result.title, "Movie.mkv");
    assert_eq!(result.filesize, "1.4 GB");
    assert_eq!(result.links.get("Instant"), Some("https://instant.example/x"));
    assert_eq!(result.links.get("Cloud R2"), Some("https://r2.example/x"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failure_envelope_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gd.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "expired"})),
        )
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_secs(5));
    let err = fetcher.fetch("gdf", "https://gdflix.example/file/old").await;
    assert_eq!(err, Err(RelayError::Rejected("expired".to_string())));
}

#[tokio::test]
async fn test_status_and_body_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("url", "https://gdflix.example/500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("url", "https://gdflix.example/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_secs(5));
    assert_eq!(
        fetcher.fetch("gdf", "https://gdflix.example/500").await,
        Err(RelayError::Status(500))
    );
    assert!(matches!(
        fetcher.fetch("gdf", "https://gdflix.example/html").await,
        Err(RelayError::InvalidJson(_))
    ));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://late.example"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_millis(100));
    assert_eq!(
        fetcher.fetch("gdf", "https://gdflix.example/slow").await,
        Err(RelayError::Timeout)
    );
}

#[tokio::test]
async fn test_transfer_it_posts_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/post"))
        .and(body_json(json!({"url": "https://transfer.it/t/abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://dl.example/abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_secs(5));
    let got = fetcher.fetch("ti", "https://transfer.it/t/abc").await;
    let Ok(Normalized::Single(result)) = got else {
        panic!("expected a single result, got {got:?}");
    };
    assert_eq!(result.links.get("Direct Link"), Some("https://dl.example/abc"));
}

#[tokio::test]
async fn test_gofile_receives_content_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gofile/AbC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"name": "a.zip", "link": "https://store.example/a.zip", "type": "zip"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_secs(5));
    let got = fetcher.fetch("gf", "https://gofile.io/d/AbC123").await;
    let Ok(Normalized::Single(result)) = got else {
        panic!("expected a single result, got {got:?}");
    };
    assert_eq!(result.links.get("zip"), Some("https://store.example/a.zip"));
}

#[tokio::test]
async fn test_bulk_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk"))
        .and(body_json(json!({"urls": ["https://a.example/1", "https://b.example/2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "https://a.example/1": "https://dl.example/1",
            "https://b.example/2": "error: unsupported"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = bypass_fetcher(&server, Duration::from_secs(5));
    let urls = vec![
        "https://a.example/1".to_string(),
        "https://b.example/2".to_string(),
    ];
    let Ok(BulkResult::Mapping(map)) = fetcher.fetch_bulk(&urls).await else {
        panic!("expected a mapping");
    };
    assert_eq!(map.len(), 2);
    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["https://a.example/1", "https://b.example/2"]
    );
}

#[tokio::test]
async fn test_poster_worker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/netflix/"))
        .and(query_param("url", "https://www.netflix.com/title/80057281"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "title": "Stranger Things",
                "year": "2016",
                "images": {
                    "vertical": "https://cdn.example/v.jpg",
                    "horizontal": "https://cdn.example/h.jpg"
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let http: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
    let fetcher = PosterFetcher::new(
        registry_for(&server),
        http,
        ResultCache::new(Duration::from_secs(60), 10),
        RetryPolicy::no_retry(),
        Duration::from_secs(5),
    );

    let info = fetcher
        .fetch("nf", "https://www.netflix.com/title/80057281")
        .await;
    let Ok(info) = info else {
        panic!("expected poster info, got {info:?}");
    };
    assert_eq!(info.title, "Stranger Things");
    assert_eq!(info.year, "2016");
    assert_eq!(info.poster.as_deref(), Some("https://cdn.example/v.jpg"));
    assert_eq!(info.landscape.as_deref(), Some("https://cdn.example/h.jpg"));
    assert_eq!(info.source, "Netflix");
}
