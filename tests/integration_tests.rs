//! Integration tests using mock HTTP server
//!
//! Tests the full flow: Client → Pager → HttpTransport → paged JSON/XML responses

use futures::TryStreamExt;
use recurly_pager::{Client, ClientConfig, Error, Filters, PageFormat, Pager};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Account {
    code: String,
    email: String,
}

/// Three account pages: 2 elements, 0 elements, 1 element
async fn mount_account_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_more": true,
            "data": [],
            "next": "/accounts?cursor=p3&limit=2"
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param("cursor", "p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_more": false,
            "data": [{"code": "carol", "email": "carol@example.com"}],
            "next": null
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param_is_missing("cursor"))
        .and(query_param("limit", "2"))
        .and(query_param("state", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_more": true,
            "data": [
                {"code": "alice", "email": "alice@example.com"},
                {"code": "bob", "email": "bob@example.com"}
            ],
            "next": "/accounts?cursor=p2&limit=2"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn filters() -> Filters {
    Filters::new().with("state", "active").with("limit", 2_i64)
}

fn codes(accounts: &[Account]) -> Vec<&str> {
    accounts.iter().map(|a| a.code.as_str()).collect()
}

// ============================================================================
// Async path
// ============================================================================

#[tokio::test]
async fn test_async_pager_walks_all_pages() {
    let mock_server = MockServer::start().await;
    mount_account_pages(&mock_server).await;

    let client = Client::new(&ClientConfig::new(mock_server.uri())).unwrap();
    let mut pager: Pager<Account> = client.list("/accounts", Some(&filters()));

    let mut accounts = Vec::new();
    while let Some(account) = pager.advance_async(None).await.unwrap() {
        accounts.push(account);
    }

    assert_eq!(codes(&accounts), vec!["alice", "bob", "carol"]);
    assert_eq!(pager.pages_fetched(), 3);
    assert!(pager.is_exhausted());

    // Exhausted: no more requests
    assert_eq!(pager.advance_async(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_stream_collects_all_pages() {
    let mock_server = MockServer::start().await;
    mount_account_pages(&mock_server).await;

    let client = Client::new(&ClientConfig::new(mock_server.uri())).unwrap();
    let pager: Pager<Account> = client.list("/accounts", Some(&filters()));

    let accounts: Vec<Account> = pager.into_stream(None).try_collect().await.unwrap();
    assert_eq!(codes(&accounts), vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn test_cancel_then_retry_yields_first_element() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plans"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"has_more": false, "data": [{"code": "gold"}]}))
                .set_delay(Duration::from_secs(10)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/plans"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"has_more": false, "data": [{"code": "gold"}]})),
        )
        .mount(&mock_server)
        .await;

    let client = Client::new(&ClientConfig::new(mock_server.uri())).unwrap();
    let mut pager: Pager<Value> = client.list("/plans", None);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = pager.advance_async(Some(&token)).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(pager.pages_fetched(), 0);

    let first = pager.advance_async(None).await.unwrap();
    assert_eq!(first, Some(json!({"code": "gold"})));
}

#[tokio::test]
async fn test_http_error_surfaces_and_pager_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"has_more": false, "data": [1, 2]})),
        )
        .mount(&mock_server)
        .await;

    let client = Client::new(&ClientConfig::new(mock_server.uri())).unwrap();
    let mut pager: Pager<i64> = client.list("/items", None);

    match pager.advance_async(None).await {
        Err(Error::Transport { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal");
        }
        other => panic!("expected transport error, got {other:?}"),
    }

    assert_eq!(pager.advance_async(None).await.unwrap(), Some(1));
    assert_eq!(pager.advance_async(None).await.unwrap(), Some(2));
    assert_eq!(pager.advance_async(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_protocol_violation_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_more": true,
            "data": [1],
            "next": ""
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new(&ClientConfig::new(mock_server.uri())).unwrap();
    let mut pager: Pager<i64> = client.list("/items", None);

    assert!(matches!(
        pager.advance_async(None).await,
        Err(Error::Protocol { .. })
    ));
    assert!(matches!(
        pager.advance_async(None).await,
        Err(Error::Protocol { .. })
    ));
}

#[tokio::test]
async fn test_xml_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<page><has_more>false</has_more><next/>\
             <data><item><code>c</code></item></data></page>",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<page><has_more>true</has_more><next>/items?cursor=2</next>\
             <data><item><code>a</code></item><item><code>b</code></item></data></page>",
        ))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::new(mock_server.uri()).with_format(PageFormat::Xml);
    let client = Client::new(&config).unwrap();
    let mut pager: Pager<Value> = client.list("/items", None);

    let mut out = Vec::new();
    while let Some(item) = pager.advance_async(None).await.unwrap() {
        out.push(item["code"].as_str().unwrap().to_string());
    }
    assert_eq!(out, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_concurrent_pagers_share_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"has_more": false, "data": [1, 2, 3]})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = Client::new(&ClientConfig::new(mock_server.uri())).unwrap();
    let a: Pager<i64> = client.list("/items", None);
    let b: Pager<i64> = client.clone().list("/items", None);

    let (left, right) = tokio::join!(
        a.into_stream(None).try_collect::<Vec<_>>(),
        b.into_stream(None).try_collect::<Vec<_>>()
    );
    assert_eq!(left.unwrap(), vec![1, 2, 3]);
    assert_eq!(right.unwrap(), vec![1, 2, 3]);
}

// ============================================================================
// Blocking path
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_pager_walks_all_pages() {
    let mock_server = MockServer::start().await;
    mount_account_pages(&mock_server).await;

    let uri = mock_server.uri();
    let (accounts, pages) = tokio::task::spawn_blocking(move || {
        let client = Client::new(&ClientConfig::new(uri)).unwrap();
        let mut pager: Pager<Account> = client.list("/accounts", Some(&filters()));
        let accounts: Vec<Account> = pager.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(pager.advance().unwrap(), None);
        (accounts, pager.pages_fetched())
    })
    .await
    .unwrap();

    assert_eq!(codes(&accounts), vec!["alice", "bob", "carol"]);
    assert_eq!(pages, 3);
}

#[test]
fn test_client_rejects_invalid_config() {
    assert!(matches!(
        Client::new(&ClientConfig::new("not a url")),
        Err(Error::InvalidUrl(_))
    ));
}

#[test]
fn test_reset_is_unsupported() {
    let client = Client::new(&ClientConfig::new("https://v3.example.com")).unwrap();
    let mut pager: Pager<Value> = client.list("/accounts", None);
    assert!(matches!(
        pager.reset(),
        Err(Error::UnsupportedOperation { .. })
    ));
}
