//! Paging and query helpers against a mock data service.

use super::common::*;
use bpm_odata::data::ErrorKind;
use bpm_odata::MatchMode;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_pages_are_followed_until_the_last() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    let collection = format!("{}{SERVICE_PATH}ContactCollection", server.uri());

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .and(query_param("$skiptoken", "guid'2'"))
        .respond_with(atom(feed(&[entry("3", "<d:Name>c</d:Name>")], None)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .respond_with(atom(feed(
            &[entry("1", "<d:Name>a</d:Name>"), entry("2", "<d:Name>b</d:Name>")],
            Some(&format!("{collection}?$skiptoken=guid'2'")),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let records = client.get_all_items_by_query("Contact", "", 10).await.unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_self_referencing_feed_terminates() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    let own = format!("{}{SERVICE_PATH}ContactCollection", server.uri());

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .respond_with(atom(feed(&[entry("1", "<d:Name>a</d:Name>")], Some(&own))))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let records = client.get_all_items_by_query("Contact", "", 10).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_limited_query_selects_and_expands() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .and(query_param("$select", "Id,Name,Owner/Name,Owner/Email"))
        .and(query_param("$expand", "Owner"))
        .respond_with(atom(feed(
            &[r#"<entry><link rel="related" title="Owner"><m:inline><entry><content><m:properties><d:Name>Supervisor</d:Name></m:properties></content></entry></m:inline></link><content><m:properties><d:Id>1</d:Id><d:Name>Jane</d:Name></m:properties></content></entry>"#.to_string()],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let records = client
        .get_all_limited_items_by_query("Contact", "", "Id, Name, Owner/Name, Owner/Email", 10)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].is_read_only());
    assert_eq!(
        records[0].get("Owner__Name").and_then(|v| v.as_text()),
        Some("Supervisor")
    );

    let mut jane = records[0].clone();
    let err = jane.delete(&mut client).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Security { .. }));
}

#[tokio::test]
async fn test_unique_field_lookup_and_dictionary() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .and(query_param("$filter", "Email eq 'jane@example.com'"))
        .respond_with(atom(feed(
            &[entry("1", "<d:Email>jane@example.com</d:Email>")],
            None,
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .and(query_param("$filter", "IsActive eq true"))
        .respond_with(atom(feed(
            &[
                entry("1", "<d:Email>jane@example.com</d:Email>"),
                entry("2", "<d:Email>john@example.com</d:Email>"),
                entry("3", ""),
            ],
            None,
        )))
        .mount(&server)
        .await;

    let mut client = client(&server);
    let jane = client
        .get_first_item_by_unique_field("Contact", "Email", "jane@example.com", MatchMode::Eq)
        .await
        .unwrap();
    assert_eq!(jane.map(|r| r.id().to_string()).as_deref(), Some("1"));

    let by_email = client
        .get_dictionary_by_unique_field("Contact", "Email", "IsActive eq true", 10)
        .await
        .unwrap();
    assert_eq!(by_email.len(), 2);
    assert_eq!(by_email["john@example.com"].id(), "2");
}

#[tokio::test]
async fn test_server_error_carries_envelope_and_is_logged() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?><error xmlns="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"><code></code><message xml:lang="en-US">An error occurred while processing this request.</message><innererror><message>Column by path Foo not found in schema Contact.</message><stacktrace>at Terrasoft.Core.Entities.EntitySchemaQuery.AddColumn</stacktrace></innererror></error>"#,
        ))
        .mount(&server)
        .await;

    let mut client = client(&server);
    let err = client
        .get_some_limited_items("Contact", "", "Foo", 0)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.server_message(),
        Some("Column by path Foo not found in schema Contact.")
    );
    assert!(err.server_stack_trace().is_some());
    assert_eq!(client.error_messages().len(), 1);
}
