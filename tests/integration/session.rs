//! Session lifecycle through the data client.

use std::sync::Arc;

use super::common::*;
use bpm_odata::{CookieJar, MemorySessionCache, SessionCache, Timeshift};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_first_data_call_logs_in_silently() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .and(header("Cookie", SESSION_COOKIE))
        .and(header("ForceUseSession", "true"))
        .respond_with(atom(feed(&[entry("1", "<d:Name>Jane</d:Name>")], None)))
        .expect(2)
        .mount(&server)
        .await;

    let mut client = client(&server);
    assert!(!client.sessions().is_authenticated());

    let first = client.get_some_items("Contact", "", 0).await.unwrap();
    let second = client.get_some_items("Contact", "", 0).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(client.sessions().is_authenticated());
    assert_eq!(client.requests_completed(), 2);
}

#[tokio::test]
async fn test_restored_jar_skips_login() {
    let server = MockServer::start().await;
    mount_login(&server, 0).await;

    Mock::given(method("GET"))
        .and(header("Cookie", "BPMSESSIONID=restored"))
        .respond_with(atom(feed(&[], None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut jar = CookieJar::new();
    jar.insert("BPMSESSIONID", "restored");
    let mut client = client(&server).with_restored_jar(jar);

    let records = client.get_some_items("Contact", "", 0).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_session_cache_is_shared_between_clients() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(header("Cookie", SESSION_COOKIE))
        .respond_with(atom(feed(&[], None)))
        .expect(2)
        .mount(&server)
        .await;

    let cache: Arc<dyn SessionCache> = Arc::new(MemorySessionCache::new());
    let max_age = Some(Timeshift::parse("30m").duration());

    let mut first = client(&server).with_session_cache(cache.clone(), LOGIN, max_age);
    first.get_some_items("Contact", "", 0).await.unwrap();
    assert!(cache.get(LOGIN).is_some());

    let mut second = client(&server).with_session_cache(cache.clone(), LOGIN, max_age);
    second.get_some_items("Contact", "", 0).await.unwrap();
}

#[tokio::test]
async fn test_stale_cache_entry_triggers_login() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(header("Cookie", SESSION_COOKIE))
        .respond_with(atom(feed(&[], None)))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemorySessionCache::new());
    let mut stale = CookieJar::new();
    stale.insert("BPMSESSIONID", "stale");
    cache.set_at(
        LOGIN,
        stale,
        chrono::Utc::now() - chrono::Duration::minutes(45),
    );

    let max_age = Some(Timeshift::parse("30m").into());
    let mut client = client(&server).with_session_cache(cache.clone(), LOGIN, max_age);
    client.get_some_items("Contact", "", 0).await.unwrap();

    let refreshed = cache.get(LOGIN).unwrap();
    assert_eq!(refreshed.get(".ASPXAUTH"), Some("abc123"));
}

#[tokio::test]
async fn test_rejected_login_surfaces_on_the_data_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut client = client(&server);
    assert!(!client.try_login().await);

    let err = client.get_some_items("Contact", "", 0).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!client.sessions().is_authenticated());
    assert_eq!(client.error_messages().len(), 1);
}

#[tokio::test]
async fn test_authenticate_other_account_keeps_session() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    let mut client = client(&server);
    assert!(client.authenticate("Auditor", "secret").await);
    assert!(!client.sessions().is_authenticated());
}
