//! # od-data
//!
//! Entity data service client for BPM OData services.
//!
//! ## Features
//!
//! - **Paging**: single pages and `rel="next"` chains with a loop guard
//! - **Records**: load, create, replace, delete, unlink, binary payloads
//! - **Query helpers**: unique-field lookups, filtered and limited (`$select`) reads,
//!   dictionaries keyed by a field
//! - **Service documents**: collections, counts and `$metadata`
//! - **Error log**: bounded, timestamped history of failed calls
//!
//! ## Reads and writes
//!
//! Entries are read from Atom feeds into [`Record`]s. Property values are kept
//! as text, and expanded relations are flattened into `<Relation>__<Field>`
//! keys. Records obtained through the limited queries carry only part of the
//! entity and are read-only: every mutating call fails with a security error
//! before anything is sent.
//!
//! Writes send the whole field map as an Atom entry. Creating returns the
//! `Location` of the new entity; use [`id_from_location`] to bind the record
//! to it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bpm_odata_data::{id_from_location, Credentials, MatchMode, ODataClient, ODataConfig, Record};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bpm_odata_data::Error> {
//!     let config = ODataConfig::builder("https://bpm.example.com").build();
//!     let mut client = ODataClient::new(config, Credentials::from_env()?)?;
//!
//!     let mut contact = Record::new_object("Contact");
//!     contact.set("Name", "Jane Doe");
//!     let outcome = contact.update(&mut client).await?;
//!     if let Some(id) = outcome.location().and_then(id_from_location) {
//!         contact.set_id(id);
//!     }
//!
//!     let jane = client
//!         .get_first_item_by_unique_field("Contact", "Name", "Jane Doe", MatchMode::Eq)
//!         .await?;
//!     println!("{:?}", jane.map(|r| r.id().to_string()));
//!     Ok(())
//! }
//! ```

pub mod atom;
mod client;
mod config;
mod error;
mod error_log;
pub mod mapper;
mod query;
mod record;

pub use client::{sha256_hex, ODataClient, Page, UPLOAD_OK};
pub use config::{ODataConfig, ODataConfigBuilder, DATA_SERVICE_PATH, DEFAULT_MAX_ITERATIONS};
pub use error::{Error, ErrorKind, Result};
pub use error_log::{ErrorLog, ErrorLogEntry, DEFAULT_ERROR_LOG_CAPACITY};
pub use query::{escape_literal, expand_paths, select_fields, MatchMode, ODataQuery, COLLECTION_SUFFIX};
pub use record::{
    id_from_location, FieldValue, Record, SaveOutcome, UploadOptions, FILE_TYPE_FILE,
    FILE_TYPE_LINK,
};

pub use bpm_odata_auth::{AuthMethod, AuthVersion, Credentials};
