//! HTTP request building with OData-specific headers.

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// Header that makes the service reuse the cookie session instead of
/// opening a new one per request.
pub const FORCE_SESSION_HEADER: &str = "ForceUseSession";

/// Header selecting the read-only session mode.
pub const SESSION_MODE_HEADER: &str = "Bpmonline-Session-Mode";

/// Content type of a single Atom entry payload.
pub const ATOM_ENTRY_CONTENT_TYPE: &str = "application/atom+xml;type=entry";

/// Accept header value for Atom responses.
pub const ATOM_ACCEPT: &str = "application/atom+xml";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }
}

/// Builder for HTTP requests against the data and auth services.
#[derive(Debug)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) body: Option<Bytes>,
    pub(crate) chunked: bool,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
            chunked: false,
        }
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The request URL, without query parameters added via [`RequestBuilder::query`].
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Look up a header value (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing an existing value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Add a query parameter. Values are percent-encoded when the request is sent.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Add the session-forcing header.
    pub fn force_session(self) -> Self {
        self.header(FORCE_SESSION_HEADER, "true")
    }

    /// Add the read-only session mode header.
    pub fn read_only_session(self) -> Self {
        self.header(SESSION_MODE_HEADER, "ReadOnly")
    }

    /// Set the Accept header.
    pub fn accept(self, value: impl Into<String>) -> Self {
        self.header("Accept", value)
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| {
            Error::with_source(ErrorKind::Other("Failed to serialize JSON body".into()), e)
        })?;
        self.body = Some(Bytes::from(bytes));
        Ok(self.header("Content-Type", "application/json"))
    }

    /// Set an Atom entry body.
    pub fn atom_entry(mut self, xml: impl Into<String>) -> Self {
        self.body = Some(Bytes::from(xml.into()));
        self.header("Content-Type", ATOM_ENTRY_CONTENT_TYPE)
            .accept(ATOM_ACCEPT)
    }

    /// Set a raw binary body.
    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self.header("Content-Type", "application/octet-stream")
    }

    /// Send the body with chunked transfer encoding.
    pub fn chunked(mut self) -> Self {
        self.chunked = true;
        self
    }

    /// Final URL with query parameters appended.
    pub(crate) fn full_url(&self) -> Result<String> {
        if self.query_params.is_empty() {
            return Ok(self.url.clone());
        }
        let mut url = url::Url::parse(&self.url)?;
        url.query_pairs_mut()
            .extend_pairs(self.query_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(url.to_string())
    }
}
