//! Sending requests: transport error propagation and end-to-end behavior
//! through the reqwest transport.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use courier::{Body, CourierError, Session};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::MockTransport;

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

#[tokio::test]
async fn test_transport_timeout_propagates_unchanged() {
    let mock = MockTransport::failing(|| CourierError::Timeout("deadline exceeded".to_string()));
    let session = Session::builder().transport(mock).build();

    let err = session
        .get("http://example.com/slow")
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err, CourierError::Timeout(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_transport_failure_skips_post_hooks() {
    let mock = MockTransport::failing(|| CourierError::Connection("refused".to_string()));
    let session = Session::builder().transport(mock).build();

    let post_calls = Arc::new(AtomicUsize::new(0));
    let response_calls = Arc::new(AtomicUsize::new(0));
    let post_counter = post_calls.clone();
    let response_counter = response_calls.clone();

    let err = session
        .get("http://example.com/")
        .on_post_request(move |_| {
            post_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_response(move |_| {
            response_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err, CourierError::Connection(_)));
    assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    assert_eq!(response_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_construction_error_skips_transport() {
    let mock = MockTransport::ok(200, "");
    let sends = mock.sends.clone();
    let session = Session::builder().transport(mock).build();

    let err = session.get("nowhere").send().await.unwrap_err();
    assert!(matches!(err, CourierError::MissingSchema(_)));
    assert_eq!(sends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_response_carries_originating_request() {
    let session = Session::builder()
        .transport(MockTransport::ok(200, "ok"))
        .build();

    let response = session
        .get("http://example.com/items")
        .header("X-Q", "1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.request().method(), "GET");
    assert_eq!(response.request().url().path(), "/items");
    assert_eq!(response.request().header("x-q"), Some("1"));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_merged_headers_sent_on_wire() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("X-Session", "s"))
        .and(header("X-Call", "c"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let session = Session::builder().header("X-Session", "s").build();
    let response = session
        .get(format!("{}/headers", server.uri()))
        .header("X-Call", "c")
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), 200);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_unset_header_absent_on_wire() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let session = Session::builder().header("X-Secret", "1").build();
    session
        .get(format!("{}/plain", server.uri()))
        .unset_header("X-Secret")
        .send()
        .await
        .expect("request should succeed");

    let requests = server.received_requests().await.expect("requests");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-secret").is_none());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_post_body_round_trip() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_string("name=value"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&server)
        .await;

    let session = Session::new();
    let mut response = session
        .post(format!("{}/submit", server.uri()))
        .body(Body::Text("name=value".to_string()))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), 201);
    assert_eq!(response.text().await.unwrap(), "created");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_json_response_deserializes() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 3})),
        )
        .mount(&server)
        .await;

    let session = Session::new();
    let mut response = session
        .get(format!("{}/data", server.uri()))
        .send()
        .await
        .unwrap();

    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["count"], 3);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_prefetch_off_streams_body_on_demand() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string("streamed"))
        .mount(&server)
        .await;

    let session = Session::new();
    let mut response = session
        .get(format!("{}/stream", server.uri()))
        .prefetch(false)
        .send()
        .await
        .unwrap();

    assert!(!response.is_loaded());
    assert_eq!(response.text().await.unwrap(), "streamed");
    assert!(response.is_loaded());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_redirect_followed_for_get_not_head() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/new"),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/new"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let session = Session::new();

    let followed = session
        .get(format!("{}/old", server.uri()))
        .send()
        .await
        .unwrap();
    assert_eq!(followed.status(), 200);

    let unfollowed = session
        .head(format!("{}/old", server.uri()))
        .send()
        .await
        .unwrap();
    assert_eq!(unfollowed.status(), 302);
}

#[tokio::test]
async fn test_session_close_is_idempotent() {
    let session = Session::builder()
        .transport(MockTransport::ok(200, ""))
        .build();
    session.close().await;
    session.close().await;
}
