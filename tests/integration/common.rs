use bpm_odata::{ClientConfig, Credentials, ODataClient, ODataConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOGIN: &str = "Supervisor";
pub const PASSWORD: &str = "Supervisor";
pub const LOGIN_PATH: &str = "/ServiceModel/AuthService.svc/Login";
pub const SERVICE_PATH: &str = "/0/ServiceModel/EntityDataService.svc/";
pub const SESSION_COOKIE: &str = ".ASPXAUTH=abc123";

/// Install a subscriber once so `RUST_LOG=debug` shows client traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(server: &MockServer) -> ODataConfig {
    ODataConfig::builder(server.uri())
        .with_http_config(ClientConfig::builder().with_tracing(true).build())
        .build()
}

/// A client that has not logged in yet.
pub fn client(server: &MockServer) -> ODataClient {
    init_tracing();
    ODataClient::new(config(server), Credentials::new(LOGIN, PASSWORD))
        .expect("client should build")
}

/// Accept logins and hand out the session cookie.
pub async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("{SESSION_COOKIE}; path=/; HttpOnly"))
                .set_body_string(r#"{"Code":0,"Message":""}"#),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub fn atom(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "application/atom+xml;type=feed;charset=utf-8")
        .set_body_string(body.into())
}

pub fn entry(id: &str, properties: &str) -> String {
    format!(
        r#"<entry><id>ContactCollection(guid'{id}')</id><content type="application/xml"><m:properties><d:Id m:type="Edm.Guid">{id}</d:Id>{properties}</m:properties></content></entry>"#
    )
}

pub fn feed(entries: &[String], next: Option<&str>) -> String {
    let next = next
        .map(|href| format!(r#"<link rel="next" href="{href}"/>"#))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?><feed xml:base="http://localhost/0/ServiceModel/EntityDataService.svc/" xmlns="http://www.w3.org/2005/Atom" xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"><title type="text">ContactCollection</title>{}{next}</feed>"#,
        entries.concat()
    )
}
