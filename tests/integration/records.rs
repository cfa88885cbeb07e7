//! Record lifecycle against a mock data service.

use super::common::*;
use bpm_odata::data::{id_from_location, SaveOutcome, UploadOptions};
use bpm_odata::{FieldValue, Record};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JANE_ID: &str = "5d2a8a4e-1c8b-4a5f-9f0e-3b7c1e2d4f60";

#[tokio::test]
async fn test_create_then_read_back() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    let location = format!("{}{SERVICE_PATH}ContactCollection(guid'{JANE_ID}')", server.uri());

    Mock::given(method("POST"))
        .and(path(format!("{SERVICE_PATH}ContactCollection/")))
        .and(header("Cookie", SESSION_COOKIE))
        .and(body_string_contains("<d:Name>Jane</d:Name>"))
        .and(body_string_contains("<d:DoNotUseEmail>true</d:DoNotUseEmail>"))
        .and(body_string_contains("<d:Age>42</d:Age>"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", location.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection(guid'{JANE_ID}')")))
        .respond_with(atom(entry(
            JANE_ID,
            r#"<d:Name>Jane</d:Name><d:DoNotUseEmail m:type="Edm.Boolean">true</d:DoNotUseEmail><d:Age m:type="Edm.Int32">42</d:Age><d:AccountId m:type="Edm.Guid">00000000-0000-0000-0000-000000000000</d:AccountId>"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let mut jane = Record::new_object("Contact");
    jane.set("Name", "Jane");
    jane.set("DoNotUseEmail", true);
    jane.set("Age", 42);

    let outcome = jane.update(&mut client).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Created(location.clone()));

    let id = id_from_location(outcome.location().unwrap()).unwrap();
    let stored = Record::fetch(&mut client, "Contact", id).await.unwrap();

    assert!(stored.exists());
    assert_eq!(stored.id(), JANE_ID);
    assert_eq!(stored.get("Name"), Some(&FieldValue::from("Jane")));
    assert_eq!(stored.get("DoNotUseEmail"), Some(&FieldValue::from("1")));
    assert_eq!(stored.get("Age"), Some(&FieldValue::from("42")));
    assert!(!stored.has_property("AccountId"));
}

#[tokio::test]
async fn test_filtered_read_yields_one_record() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE_PATH}ContactCollection")))
        .and(query_param("$filter", "Name eq 'Jane'"))
        .respond_with(atom(feed(&[entry(JANE_ID, "<d:Name>Jane</d:Name>")], None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let records = client
        .get_all_items_by_query("Contact", "Name eq 'Jane'", 10)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), JANE_ID);
    assert!(records[0].exists());
}

#[tokio::test]
async fn test_delete_keeps_fields_and_recreates_on_update() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("DELETE"))
        .and(path(format!("{SERVICE_PATH}ContactCollection(guid'{JANE_ID}')/")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{SERVICE_PATH}ContactCollection/")))
        .and(body_string_contains("<d:Name>Jane</d:Name>"))
        .respond_with(ResponseTemplate::new(201).insert_header(
            "Location",
            format!("{}{SERVICE_PATH}ContactCollection(guid'{JANE_ID}')", server.uri()),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let mut jane = Record::new_object("Contact");
    jane.set_id(JANE_ID);
    jane.set("Name", "Jane");

    jane.delete(&mut client).await.unwrap();
    assert_eq!(jane.id(), "");
    assert!(jane.get("Id").is_some_and(FieldValue::is_null));
    assert_eq!(jane.get("Name"), Some(&FieldValue::from("Jane")));

    let outcome = jane.update(&mut client).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Created(_)));
}

#[tokio::test]
async fn test_attachment_upload_and_download() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    let file_id = "0b7e6c1a-33a4-4a2e-8f57-2d0a1b9c7e11";
    let data_path = format!("{SERVICE_PATH}ContactFileCollection(guid'{file_id}')/Data");

    Mock::given(method("PUT"))
        .and(path(data_path.as_str()))
        .and(header("Content-Type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{SERVICE_PATH}ContactFileCollection(guid'{file_id}')/")))
        .and(body_string_contains("<d:Size>11</d:Size>"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(data_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello world".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let mut file = Record::new_object("ContactFile");
    file.set_id(file_id);
    file.set("Name", "hello.txt");

    let options = UploadOptions {
        save_type_and_size: true,
        save_hash: false,
    };
    let result = file
        .upload_binary(&mut client, b"hello world", options)
        .await
        .unwrap();
    assert_eq!(result, "OK");
    assert!(!file.has_property("Hash"));

    let url = format!("{}{data_path}", server.uri());
    let data = client.get_data(&url).await.unwrap();
    assert_eq!(data, b"hello world");
}
