//! Tests for the HTTP transport module

use super::*;
use crate::decode::PageFormat;
use crate::error::Error;
use crate::pagination::PageEnvelope;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = HttpTransportConfig::builder()
        .base_url(server.uri())
        .build();
    HttpTransport::with_config(config).unwrap()
}

#[test]
fn test_http_transport_config_default() {
    let config = HttpTransportConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert!(config.default_headers.is_empty());
    assert_eq!(config.format, PageFormat::Json);
    assert!(config.user_agent.starts_with("recurly-pager/"));
}

#[test]
fn test_http_transport_config_builder() {
    let config = HttpTransportConfig::builder()
        .base_url("https://v3.example.com")
        .timeout(Duration::from_secs(60))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .format(PageFormat::Xml)
        .build();

    assert_eq!(config.base_url, Some("https://v3.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
    assert_eq!(config.format, PageFormat::Xml);
}

#[test]
fn test_build_url() {
    let config = HttpTransportConfig::builder()
        .base_url("https://v3.example.com/")
        .build();
    let transport = HttpTransport::with_config(config).unwrap();

    assert_eq!(
        transport.build_url("/accounts?limit=2"),
        "https://v3.example.com/accounts?limit=2"
    );
    assert_eq!(
        transport.build_url("accounts"),
        "https://v3.example.com/accounts"
    );
    assert_eq!(
        transport.build_url("https://other.example.com/next"),
        "https://other.example.com/next"
    );

    let bare = HttpTransport::new().unwrap();
    assert_eq!(bare.build_url("/accounts"), "/accounts");
}

#[tokio::test]
async fn test_fetch_page_async() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param("limit", "2"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_more": true,
            "data": [{"code": "a"}, {"code": "b"}],
            "next": "/accounts?cursor=p2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let page: PageEnvelope<Value> = transport
        .fetch_page_async("/accounts?limit=2")
        .await
        .unwrap();

    assert!(page.has_more);
    assert_eq!(page.next, "/accounts?cursor=p2");
    assert_eq!(page.data[1]["code"], "b");
}

#[tokio::test]
async fn test_default_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(header("X-Site", "acme"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"has_more": false, "data": []})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpTransportConfig::builder()
        .base_url(mock_server.uri())
        .header("X-Site", "acme")
        .build();
    let transport = HttpTransport::with_config(config).unwrap();

    let page: PageEnvelope<Value> = transport.fetch_page_async("/items").await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let result: crate::Result<PageEnvelope<Value>> = transport.fetch_page_async("/accounts").await;

    match result {
        Err(Error::Transport { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let result: crate::Result<PageEnvelope<Value>> = transport.fetch_page_async("/accounts").await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Transport { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let result: crate::Result<PageEnvelope<Value>> = transport.fetch_page_async("/accounts").await;

    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[tokio::test]
async fn test_fetch_xml_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plans"))
        .and(header("Accept", "application/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<page><has_more>false</has_more><next></next>\
             <data><plan><code>gold</code></plan><plan><code>silver</code></plan></data></page>",
        ))
        .mount(&mock_server)
        .await;

    let config = HttpTransportConfig::builder()
        .base_url(mock_server.uri())
        .format(PageFormat::Xml)
        .build();
    let transport = HttpTransport::with_config(config).unwrap();

    let page: PageEnvelope<Value> = transport.fetch_page_async("/plans").await.unwrap();
    assert!(!page.has_more);
    assert_eq!(page.data, vec![json!({"code": "gold"}), json!({"code": "silver"})]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_page_blocking() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_more": false,
            "data": [1, 2, 3],
            "next": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let page = tokio::task::spawn_blocking(move || {
        let config = HttpTransportConfig::builder().base_url(uri).build();
        let transport = HttpTransport::with_config(config).unwrap();
        transport.fetch_page::<i64>("/items")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(page, PageEnvelope::last(vec![1, 2, 3]));
}

#[tokio::test]
async fn test_cancellable_fetch_abandons_slow_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"has_more": false, "data": []}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let transport = Arc::new(transport_for(&mock_server));
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result: crate::Result<PageEnvelope<Value>> =
        transport.fetch_page_cancellable("/slow", Some(&token)).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellable_fetch_without_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"has_more": false, "data": [5]})),
        )
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let page: PageEnvelope<i64> = transport
        .fetch_page_cancellable("/items", None)
        .await
        .unwrap();
    assert_eq!(page.data, vec![5]);
}
