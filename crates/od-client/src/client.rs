//! Core HTTP client: attaches the session cookie jar, executes through the
//! transport, captures returned cookies and classifies failures.

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::cookies::CookieJar;
use crate::error::Result;
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::{Response, ResponseExt};
use crate::transport::{ReqwestTransport, Transport, TransportRequest};

/// HTTP client for the OData and auth services.
#[derive(Debug, Clone)]
pub struct OdHttpClient<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
}

impl OdHttpClient<ReqwestTransport> {
    /// Create a new HTTP client backed by `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { transport, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }
}

impl<T: Transport> OdHttpClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Execute a request without interpreting the status code.
    ///
    /// Cookies from the jar are sent with the request and every `Set-Cookie`
    /// in the response is stored back into it.
    #[instrument(skip(self, request, jar), fields(method = ?request.method, url = %request.url))]
    pub async fn execute_raw(
        &self,
        request: RequestBuilder,
        jar: Option<&mut CookieJar>,
    ) -> Result<Response> {
        let url = request.full_url()?;
        let mut headers = request.headers;

        if let Some(cookie_header) = jar.as_ref().and_then(|j| j.header_value()) {
            headers.push(("Cookie".to_string(), cookie_header));
        }

        if self.config.enable_tracing {
            debug!(method = ?request.method, url = %url, "Sending request");
        }

        let response = self
            .transport
            .send(TransportRequest {
                method: request.method,
                url,
                headers,
                body: request.body,
                chunked: request.chunked,
                timeout: self.config.timeout,
            })
            .await?;

        let response = Response::new(response);

        if self.config.enable_tracing {
            let status = response.status();
            let content_length = response.body().len();
            if response.is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        if let Some(jar) = jar {
            for set_cookie in response.header_values("set-cookie") {
                jar.store_set_cookie(set_cookie);
            }
        }

        Ok(response)
    }

    /// Execute a request and turn non-success statuses into web errors.
    pub async fn execute(
        &self,
        request: RequestBuilder,
        jar: Option<&mut CookieJar>,
    ) -> Result<Response> {
        self.execute_raw(request, jar).await?.check_odata_error()
    }
}
