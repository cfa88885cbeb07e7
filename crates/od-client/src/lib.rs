//! # od-client
//!
//! Core HTTP infrastructure for BPM OData services.
//!
//! This crate provides the foundational pieces every other crate talks through:
//! - A pluggable [`Transport`] with a `reqwest` default
//! - A serializable session [`CookieJar`] filled from `Set-Cookie`
//! - Request building with the session headers the service expects
//! - Classification of failure responses, including the OData error envelope
//! - A small owned XML tree for Atom documents
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (od-auth SessionManager, od-data ODataClient)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OdHttpClient                             │
//! │  - Attaches and refreshes the session cookie jar            │
//! │  - Turns non-success statuses into classified web errors    │
//! │  - Request/response tracing                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Transport                                │
//! │  - One buffered request/response exchange                   │
//! │  - Timeout, TLS validation toggle, chunked uploads          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use bpm_odata_client::{ClientConfig, CookieJar, OdHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bpm_odata_client::Error> {
//!     let client = OdHttpClient::new(ClientConfig::default())?;
//!     let mut jar = CookieJar::new();
//!
//!     let request = client
//!         .get("https://bpm.example.com/0/ServiceModel/EntityDataService.svc/")
//!         .force_session();
//!     let service = client.execute(request, Some(&mut jar)).await?.xml()?;
//!     println!("{}", service.name());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod cookies;
mod error;
mod request;
mod response;
mod transport;
pub mod xml;

pub use client::OdHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use cookies::CookieJar;
pub use error::{Error, ErrorKind, Result};
pub use request::{
    RequestBuilder, RequestMethod, ATOM_ACCEPT, ATOM_ENTRY_CONTENT_TYPE, FORCE_SESSION_HEADER,
    SESSION_MODE_HEADER,
};
pub use response::{Response, ResponseExt};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use xml::XmlElement;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("bpm-odata/", env!("CARGO_PKG_VERSION"));
