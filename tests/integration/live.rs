//! Tests against a real server, configured through `BPM_*` variables.

use bpm_odata::{ODataClient, Record};

fn live_client() -> ODataClient {
    super::common::init_tracing();
    match ODataClient::from_env() {
        Ok(client) => client,
        Err(e) => panic!(
            "\n\nLive tests need BPM_URL, BPM_LOGIN and BPM_PASSWORD \
             (optionally BPM_SOLUTION_ID, BPM_AUTH_METHOD, BPM_AUTH_VERSION).\n\
             Configuration failed: {e}\n\n"
        ),
    }
}

#[tokio::test]
#[ignore]
async fn test_live_login() {
    let mut client = live_client();
    assert!(client.try_login().await, "login should succeed");
    assert!(client.sessions().is_authenticated());
}

#[tokio::test]
#[ignore]
async fn test_live_service_document() {
    let mut client = live_client();
    let collections = client.get_collections().await.expect("service document");
    assert!(collections.iter().any(|c| c == "ContactCollection"));

    let size = client
        .get_collection_size("Contact")
        .await
        .expect("collection size");
    let page = client.get_some_items("Contact", "", 0).await.expect("page");
    assert!(page.len() as u64 <= size);
}

#[tokio::test]
#[ignore]
async fn test_live_contact_lifecycle() {
    let mut client = live_client();
    let name = format!("bpm-odata test {}", chrono::Utc::now().timestamp_millis());

    let mut contact = Record::new_object("Contact");
    contact.set("Name", name.as_str());
    let outcome = contact.update(&mut client).await.expect("create");
    let id = outcome
        .location()
        .and_then(bpm_odata::data::id_from_location)
        .expect("location with id")
        .to_string();

    let mut stored = Record::fetch(&mut client, "Contact", &id).await.expect("fetch");
    assert_eq!(stored.get("Name").and_then(|v| v.as_text()), Some(name.as_str()));

    stored.delete(&mut client).await.expect("delete");
    let err = client.get_record("Contact", &id).await.unwrap_err();
    assert!(matches!(err.kind, bpm_odata::data::ErrorKind::NotFound(_)));
}
