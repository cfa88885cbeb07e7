//! HTTP response handling with OData-specific extensions.

use bytes::Bytes;

use crate::error::{Error, ErrorKind, Result};
use crate::transport::TransportResponse;
use crate::xml::XmlElement;

/// Wrapper around a buffered transport response.
#[derive(Debug, Clone)]
pub struct Response {
    inner: TransportResponse,
}

impl Response {
    pub(crate) fn new(inner: TransportResponse) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Get a header value (case-insensitive). For repeated headers the first value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated header.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Location header (set by the service on create).
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Raw body.
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Take the body as bytes.
    pub fn bytes(self) -> Bytes {
        self.inner.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.inner.body.to_vec()).map_err(|e| {
            Error::with_source(
                ErrorKind::MalformedResponse("Failed to decode response as UTF-8".to_string()),
                e,
            )
        })
    }

    /// Parse the body as an XML document.
    pub fn xml(&self) -> Result<XmlElement> {
        XmlElement::parse_bytes(&self.inner.body)
    }
}

/// Extension trait for processing OData responses.
pub trait ResponseExt: Sized {
    /// Turn non-success statuses into classified web errors.
    fn check_odata_error(self) -> Result<Response>;
}

impl ResponseExt for Response {
    fn check_odata_error(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }
        Err(parse_error_response(self.status(), self.body()))
    }
}

/// Build a web error from a failure response.
///
/// The server's inner message and stack trace are taken from the OData error
/// envelope (`<error><innererror><message/><stacktrace/></innererror></error>`)
/// when the body holds one; anything unparseable is ignored.
pub(crate) fn parse_error_response(status: u16, body: &[u8]) -> Error {
    let (server_message, server_stack_trace) = parse_error_envelope(body).unwrap_or_default();

    Error::new(ErrorKind::Web {
        status,
        message: status_reason(status).to_string(),
        server_message,
        server_stack_trace,
    })
}

fn parse_error_envelope(body: &[u8]) -> Option<(Option<String>, Option<String>)> {
    let root = XmlElement::parse_bytes(body).ok()?;
    if !root.is("error") {
        return None;
    }

    let inner = root.child("innererror");
    let message = inner
        .and_then(|i| i.child("message"))
        .or_else(|| root.child("message"))
        .map(|m| m.inner_text().trim().to_string())
        .filter(|m| !m.is_empty());
    let stack_trace = inner
        .and_then(|i| i.child("stacktrace"))
        .map(|s| s.inner_text().trim().to_string())
        .filter(|s| !s.is_empty());

    Some((message, stack_trace))
}

fn status_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown status")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> Response {
        Response::new(TransportResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: Bytes::from(body.to_string()),
        })
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let resp = response(
            201,
            &[
                ("location", "https://x/ContactCollection(guid'1')"),
                ("set-cookie", "a=1"),
                ("set-cookie", "b=2"),
            ],
            "",
        );
        assert!(resp.is_success());
        assert_eq!(resp.location(), Some("https://x/ContactCollection(guid'1')"));
        assert_eq!(resp.header("Location"), resp.location());
        assert_eq!(resp.header_values("Set-Cookie").count(), 2);
    }

    #[test]
    fn test_error_envelope_is_parsed() {
        let body = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<error xmlns="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
  <code></code>
  <message xml:lang="en-US">An error occurred while processing this request.</message>
  <innererror>
    <message>Column by path Foo not found in schema Contact.</message>
    <type>Terrasoft.Common.ItemNotFoundException</type>
    <stacktrace>at Terrasoft.Core.Entities.EntitySchemaQuery.AddColumn</stacktrace>
  </innererror>
</error>"#;

        let err = response(400, &[], body).check_odata_error().unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.server_message(),
            Some("Column by path Foo not found in schema Contact.")
        );
        assert_eq!(
            err.server_stack_trace(),
            Some("at Terrasoft.Core.Entities.EntitySchemaQuery.AddColumn")
        );
    }

    #[test]
    fn test_unparseable_error_body_is_swallowed() {
        let err = response(500, &[], "<html>Server Error").check_odata_error().unwrap_err();
        match err.kind {
            ErrorKind::Web {
                status,
                ref message,
                ref server_message,
                ref server_stack_trace,
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
                assert!(server_message.is_none());
                assert!(server_stack_trace.is_none());
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_success_passes_through() {
        let resp = response(204, &[], "").check_odata_error().unwrap();
        assert_eq!(resp.status(), 204);
    }

    #[test]
    fn test_xml_body() {
        let resp = response(200, &[("content-type", "application/atom+xml")], "<feed/>");
        assert_eq!(resp.content_type(), Some("application/atom+xml"));
        assert!(resp.xml().unwrap().is("feed"));
        assert_eq!(resp.text().unwrap(), "<feed/>");
    }
}
