use super::*;

#[test]
fn test_from_mapping_builds_session_cookies() {
    let store = CookieStore::from_mapping([("a", "1"), ("b", "2")]);
    assert_eq!(store.len(), 2);
    let a = store.get("a").expect("cookie a");
    assert_eq!(a.value, "1");
    assert_eq!(a.domain, "");
    assert_eq!(a.path, "/");
}

#[test]
fn test_set_replaces_on_identical_key() {
    let mut store = CookieStore::new();
    store.set(Cookie::new("a", "1"));
    store.set(Cookie::new("a", "2"));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("a").unwrap().value, "2");
}

#[test]
fn test_same_name_different_domain_coexist() {
    let mut store = CookieStore::new();
    store.set(Cookie::new("a", "1").with_domain("example.com"));
    store.set(Cookie::new("a", "2").with_domain("other.com"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_merge_from_overwrites_and_leaves_source_alone() {
    let mut target = CookieStore::from_mapping([("a", "old"), ("b", "2")]);
    let source = CookieStore::from_mapping([("a", "new"), ("c", "3")]);
    let source_before = source.clone();

    target.merge_from(&source);
    assert_eq!(target.get("a").unwrap().value, "new");
    assert_eq!(target.get("b").unwrap().value, "2");
    assert_eq!(target.get("c").unwrap().value, "3");
    assert_eq!(source, source_before);
}

#[test]
fn test_remove_by_name_is_noop_when_absent() {
    let mut store = CookieStore::from_mapping([("a", "1")]);
    store.remove_by_name("missing");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_by_name_removes_all_domains() {
    let mut store = CookieStore::new();
    store.set(Cookie::new("a", "1").with_domain("example.com"));
    store.set(Cookie::new("a", "2").with_domain("other.com"));
    store.set(Cookie::new("b", "3"));
    store.remove_by_name("a");
    assert_eq!(store.len(), 1);
    assert!(store.contains_name("b"));
}

#[test]
fn test_cookie_header_in_store_order() {
    let store = CookieStore::from_mapping([("a", "1"), ("b", "2")]);
    assert_eq!(store.cookie_header().as_deref(), Some("a=1; b=2"));
    assert_eq!(CookieStore::new().cookie_header(), None);
}

#[test]
fn test_request_jar_does_not_touch_session_store() {
    let session = CookieStore::from_mapping([("b", "2")]);
    let call = CookieStore::from_mapping([("a", "1")]);

    let jar = request_jar(&call, &[], &session);
    assert!(jar.contains_name("a"));
    assert!(jar.contains_name("b"));
    assert_eq!(session, CookieStore::from_mapping([("b", "2")]));
}

#[test]
fn test_request_jar_per_call_wins_on_collision() {
    let session = CookieStore::from_mapping([("a", "session")]);
    let call = CookieStore::from_mapping([("a", "call")]);

    let jar = request_jar(&call, &[], &session);
    assert_eq!(jar.get("a").unwrap().value, "call");
}

#[test]
fn test_request_jar_purges_dead_names() {
    let session = CookieStore::from_mapping([("a", "1"), ("b", "2")]);
    let call = CookieStore::new();
    let dead = vec!["a".to_string()];

    let jar = request_jar(&call, &dead, &session);
    assert!(!jar.contains_name("a"));
    assert_eq!(jar.get("b").unwrap().value, "2");
    assert_eq!(session.get("a").unwrap().value, "1");
}
