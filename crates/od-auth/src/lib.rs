//! # od-auth
//!
//! Session management for BPM OData services.
//!
//! ## Security
//!
//! - Passwords and cookie values are redacted in Debug output
//! - Tracing skips password parameters
//! - A rejected login is reported as `false` and logged without credentials
//!
//! ## Session lifecycle
//!
//! A [`SessionManager`] holds at most one session: the cookie jar captured by
//! the last login of the configured account. Data calls go through
//! [`SessionManager::ensure_authenticated`], which logs in only when no usable
//! jar is held. There is no retry when an established session expires; the
//! resulting web error surfaces to the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bpm_odata_auth::{Credentials, MemorySessionCache, SessionManager, Timeshift};
//! use bpm_odata_client::{ClientConfig, OdHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bpm_odata_auth::Error> {
//!     let http = OdHttpClient::new(ClientConfig::default())?;
//!     let cache = Arc::new(MemorySessionCache::new());
//!
//!     let mut sessions = SessionManager::new(http, "https://bpm.example.com", Credentials::from_env()?)
//!         .with_session_cache(cache, "Supervisor", Some(Timeshift::parse("30m").into()));
//!
//!     if !sessions.ensure_authenticated().await {
//!         eprintln!("login failed");
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod credentials;
mod error;
mod session;

pub use cache::{MemorySessionCache, SessionCache, SessionCacheEntry, Timeshift};
pub use credentials::Credentials;
pub use error::{Error, ErrorKind, Result};
pub use session::{AuthMethod, AuthVersion, Session, SessionManager, LOGIN_PATH};
