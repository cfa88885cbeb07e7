//! Pluggable transport.
//!
//! The rest of the workspace only talks to the network through [`Transport`]:
//! one request in, one fully buffered response out. [`ReqwestTransport`] is the
//! default implementation.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestMethod;

/// Size of the pieces a chunked body is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// A request as handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: RequestMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Stream the body with chunked transfer encoding instead of a Content-Length.
    pub chunked: bool,
    pub timeout: Duration,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lower-cased; repeated headers (Set-Cookie) appear once per value.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Executes HTTP exchanges.
pub trait Transport: Send + Sync {
    /// Send one request and wait for the complete response.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// network-level failures are errors.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse>> + Send;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate validation is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            req = if request.chunked {
                req.body(reqwest::Body::wrap_stream(futures::stream::iter(
                    split_chunks(body).into_iter().map(Ok::<_, std::io::Error>),
                )))
            } else {
                req.body(body)
            };
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn split_chunks(body: Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(body.len() / UPLOAD_CHUNK_SIZE + 1);
    let mut start = 0;
    while start < body.len() {
        let end = (start + UPLOAD_CHUNK_SIZE).min(body.len());
        chunks.push(body.slice(start..end));
        start = end;
    }
    chunks
}
