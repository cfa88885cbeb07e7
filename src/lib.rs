//! # bpm-odata
//!
//! An OData client library for BPM/CRM platforms.
//!
//! The service speaks OData v2 with Atom/XML payloads behind a cookie-based
//! login. This library keeps the session alive, turns CRUD and query calls
//! into OData requests and reads the paged Atom responses back into mutable
//! records.
//!
//! ## Security
//!
//! - Passwords and cookie values are redacted in Debug output
//! - Tracing skips credential parameters
//! - Ids and collection names are validated before they reach a URL
//!
//! ## Crates
//!
//! - **bpm-odata-client** - HTTP infrastructure: transport, cookie jar, error envelopes
//! - **bpm-odata-auth** - Login, session management, session cache
//! - **bpm-odata-data** - Entity data service: paging, records, query helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bpm_odata::{Credentials, ODataClient, ODataConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ODataConfig::builder("https://bpm.example.com").build();
//!     let mut client = ODataClient::new(config, Credentials::from_env()?)?;
//!
//!     let contacts = client.get_some_items("Contact", "Name eq 'Jane'", 0).await?;
//!     for contact in contacts {
//!         println!("{contact}: {:?}", contact.get("Name"));
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use bpm_odata_auth as auth;
#[cfg(feature = "client")]
pub use bpm_odata_client as client;
#[cfg(feature = "data")]
pub use bpm_odata_data as data;

#[cfg(feature = "auth")]
pub use bpm_odata_auth::{Credentials, MemorySessionCache, SessionCache, SessionManager, Timeshift};
#[cfg(feature = "client")]
pub use bpm_odata_client::{ClientConfig, CookieJar, OdHttpClient};
#[cfg(feature = "data")]
pub use bpm_odata_data::{FieldValue, MatchMode, ODataClient, ODataConfig, Record};
