//! Session cookie persistence and per-request cookie merging.

mod common;

use courier::{Cookie, CookieStore, Session};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::MockTransport;

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

#[test]
fn test_request_cookies_do_not_touch_session_store() {
    let session = Session::builder().cookie("b", "2").build();

    let prepared = session
        .get("http://example.com/")
        .cookie("a", "1")
        .prepare()
        .unwrap();

    assert_eq!(prepared.header("cookie"), Some("b=2; a=1"));
    assert_eq!(session.cookies(), CookieStore::from_mapping([("b", "2")]));
}

#[test]
fn test_dead_cookie_purged_from_request_only() {
    let session = Session::builder().cookie("a", "1").cookie("b", "2").build();

    let prepared = session
        .get("http://example.com/")
        .clear_cookie("a")
        .prepare()
        .unwrap();

    assert_eq!(prepared.header("cookie"), Some("b=2"));
    assert_eq!(
        session.cookies(),
        CookieStore::from_mapping([("a", "1"), ("b", "2")])
    );
}

#[test]
fn test_per_call_cookie_wins_over_session() {
    let session = Session::builder().cookie("a", "session").build();

    let prepared = session
        .get("http://example.com/")
        .cookie("a", "call")
        .prepare()
        .unwrap();

    assert_eq!(prepared.header("cookie"), Some("a=call"));
}

#[test]
fn test_full_jar_override_per_call() {
    let session = Session::builder().cookie("a", "1").build();
    let jar = CookieStore::from_mapping([("c", "3")]);

    let prepared = session
        .get("http://example.com/")
        .cookies(jar)
        .prepare()
        .unwrap();

    assert_eq!(prepared.header("cookie"), Some("a=1; c=3"));
}

#[test]
fn test_session_cookie_management() {
    let session = Session::new();
    session.add_cookie(Cookie::new("a", "1"));
    session.add_cookie(Cookie::new("b", "2"));
    assert_eq!(session.cookies().len(), 2);

    session.remove_cookie("a");
    assert!(!session.cookies().contains_name("a"));

    session.clear_cookies();
    assert!(session.cookies().is_empty());
}

#[test]
fn test_no_cookie_header_when_empty() {
    let session = Session::new();
    let prepared = session.get("http://example.com/").prepare().unwrap();
    assert_eq!(prepared.header("cookie"), None);
}

#[tokio::test]
async fn test_request_does_not_assimilate_transport_cookies() {
    let mock = MockTransport::with_reply(|| {
        Ok(courier::RawResponse::full(
            200,
            vec![("set-cookie".to_string(), "server=1; Path=/".to_string())],
            "ok",
        ))
    });
    let session = Session::builder().cookie("mine", "1").transport(mock).build();

    let response = session.get("http://example.com/").send().await.unwrap();
    assert_eq!(response.header("set-cookie"), Some("server=1; Path=/"));
    // the session store is only written by explicit cookie management
    assert_eq!(session.cookies(), CookieStore::from_mapping([("mine", "1")]));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cookie_header_sent_on_wire() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/needs-cookies"))
        .and(header("cookie", "session=abc; extra=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let session = Session::builder().cookie("session", "abc").build();
    let response = session
        .get(format!("{}/needs-cookies", server.uri()))
        .cookie("extra", "1")
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), 200);
}
