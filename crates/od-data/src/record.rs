//! Records: mutable entities bound to a collection and an id.
//!
//! A record holds the full field set of an entity. Saving always sends the
//! whole map: a record without id is created with POST, a record with id is
//! replaced with PUT. Records loaded through the limited (`$select`) queries
//! are read-only and reject every mutating call before touching the network.

use std::collections::BTreeMap;
use std::fmt;

use bpm_odata_client::{Transport, XmlElement};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::ODataClient;
use crate::error::{Error, ErrorKind, Result};
use crate::mapper::{data_link, entry_fields};
use crate::query::COLLECTION_SUFFIX;

/// Type id of an uploaded file ("File" in the file type lookup).
pub const FILE_TYPE_FILE: &str = "529bc2f8-0ee0-df11-971b-001d60e938c6";

/// Type id of a link attachment ("Link" in the file type lookup).
pub const FILE_TYPE_LINK: &str = "539bc2f8-0ee0-df11-971b-001d60e938c6";

/// A single field value.
///
/// A missing key means the field is unset; [`FieldValue::Null`] means it is
/// explicitly cleared and is sent as such on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// The text value, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The value as sent to the service; `None` for null.
    ///
    /// Numbers use the shortest decimal form that reads back to the same value.
    pub fn to_wire_string(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Null => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_wire_string() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Extra fields written after a binary upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Set `Size` to the payload length and `TypeId` to [`FILE_TYPE_FILE`].
    pub save_type_and_size: bool,
    /// Set `Hash` to the upper-case hex SHA-256 of the payload.
    pub save_hash: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            save_type_and_size: true,
            save_hash: true,
        }
    }
}

/// Result of [`Record::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The entity was created; holds the `Location` header verbatim.
    Created(String),
    /// The existing entity was replaced.
    Updated,
}

impl SaveOutcome {
    /// Location of a newly created entity.
    pub fn location(&self) -> Option<&str> {
        match self {
            SaveOutcome::Created(location) => Some(location),
            SaveOutcome::Updated => None,
        }
    }
}

/// Extract the GUID from a location such as `.../ContactCollection(guid'…')`.
pub fn id_from_location(location: &str) -> Option<&str> {
    let start = location.rfind("(guid'")? + "(guid'".len();
    let rest = &location[start..];
    let end = rest.find('\'')?;
    Some(&rest[..end]).filter(|id| !id.is_empty())
}

/// An entity of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    collection: String,
    id: String,
    fields: BTreeMap<String, FieldValue>,
    binary_link: String,
    read_only: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    related: BTreeMap<String, Vec<Record>>,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl Record {
    /// Prepare a new, unsaved record. `CreatedOn` and `ModifiedOn` are set to
    /// the current UTC time; call [`Record::update`] to create it.
    pub fn new_object(collection: impl Into<String>) -> Self {
        let now = now_round_trip();
        let mut fields = BTreeMap::new();
        fields.insert("CreatedOn".to_string(), FieldValue::Text(now.clone()));
        fields.insert("ModifiedOn".to_string(), FieldValue::Text(now));

        Self {
            collection: collection.into(),
            fields,
            ..Self::default()
        }
    }

    /// Map an Atom entry into a record of `collection`.
    pub fn from_entry(collection: impl Into<String>, entry: &XmlElement, read_only: bool) -> Self {
        let fields = entry_fields(entry);
        let id = fields
            .get("Id")
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string();

        Self {
            collection: collection.into(),
            id,
            fields,
            binary_link: data_link(entry).unwrap_or_default().to_string(),
            read_only,
            related: BTreeMap::new(),
        }
    }

    /// Fetch a single entity; fails with `NotFound` when it does not exist.
    pub async fn fetch<T: Transport>(
        client: &mut ODataClient<T>,
        collection: &str,
        id: &str,
    ) -> Result<Self> {
        client.get_record(collection, id).await
    }

    /// Collection name, without the `Collection` suffix.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Entity set name as used in URLs.
    pub fn collection_local_name(&self) -> String {
        if self.collection.ends_with(COLLECTION_SUFFIX)
            || self.collection.ends_with("CollectionVersion")
        {
            self.collection.clone()
        } else {
            format!("{}{COLLECTION_SUFFIX}", self.collection)
        }
    }

    /// Entity id; empty when not saved yet.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bind the record to an id, e.g. one taken from a create location.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// True when the record has fields and an id.
    pub fn exists(&self) -> bool {
        !self.fields.is_empty() && !self.id.is_empty()
    }

    /// Whether mutating calls are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Get a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Set a field. Use [`FieldValue::Null`] (or `None`) to clear it on update.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// True when the field is present, null included.
    pub fn has_property(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All fields.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Field values as strings; nulls are left out.
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.to_wire_string().map(|s| (k.clone(), s)))
            .collect()
    }

    /// Remove and return the scratch fields, whose names start with `!`.
    pub fn clean_temp(&mut self) -> BTreeMap<String, FieldValue> {
        let keys: Vec<String> = self
            .fields
            .keys()
            .filter(|k| k.starts_with('!'))
            .cloned()
            .collect();

        keys.into_iter()
            .filter_map(|k| self.fields.remove(&k).map(|v| (k, v)))
            .collect()
    }

    /// True when the entity has a binary payload.
    pub fn has_binary_data(&self) -> bool {
        !self.binary_link.is_empty()
    }

    /// Href of the binary payload; empty when there is none.
    pub fn binary_link(&self) -> &str {
        &self.binary_link
    }

    /// Records cached by [`Record::load_many`] under `collection`.
    pub fn related(&self, collection: &str) -> Option<&[Record]> {
        self.related.get(collection).map(Vec::as_slice)
    }

    /// All cached related records, by collection.
    pub fn related_cache(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.related
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.read_only {
            return Err(Error::security(operation));
        }
        Ok(())
    }

    /// Save the record.
    ///
    /// `ModifiedOn` is refreshed first. Without an id the record is created
    /// and the returned outcome carries the `Location` header; the record's
    /// own id is left unchanged.
    ///
    /// Scratch fields (`!`-prefixed) cannot be written: call [`Record::clean_temp`]
    /// first, otherwise the save fails with `InvalidInput`.
    #[instrument(skip(self, client), fields(collection = %self.collection, id = %self.id))]
    pub async fn update<T: Transport>(&mut self, client: &mut ODataClient<T>) -> Result<SaveOutcome> {
        self.ensure_writable("update")?;
        self.set("ModifiedOn", now_round_trip());

        if self.id.is_empty() {
            let location = client.add_item(&self.collection, &self.fields).await?;
            Ok(SaveOutcome::Created(location))
        } else {
            client
                .update_item(&self.collection, &self.id, &self.fields)
                .await?;
            Ok(SaveOutcome::Updated)
        }
    }

    /// Delete the entity.
    ///
    /// The id is cleared and `Id` set to null; other fields stay, so a later
    /// [`Record::update`] creates the entity again.
    #[instrument(skip(self, client), fields(collection = %self.collection, id = %self.id))]
    pub async fn delete<T: Transport>(&mut self, client: &mut ODataClient<T>) -> Result<()> {
        self.ensure_writable("delete")?;
        if self.id.is_empty() {
            return Ok(());
        }

        client.delete_item(&self.collection, &self.id).await?;
        self.id.clear();
        self.set("Id", FieldValue::Null);
        Ok(())
    }

    /// Upload the binary payload, then optionally save size, type and hash.
    ///
    /// Returns the upper-case hex SHA-256 of `bytes` when the hash is saved,
    /// `"OK"` otherwise.
    #[instrument(skip(self, client, bytes), fields(collection = %self.collection, id = %self.id, size = bytes.len()))]
    pub async fn upload_binary<T: Transport>(
        &mut self,
        client: &mut ODataClient<T>,
        bytes: &[u8],
        options: UploadOptions,
    ) -> Result<String> {
        self.ensure_writable("uploadbinary")?;
        if self.id.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "cannot upload data for a record that is not saved".to_string(),
            )));
        }

        let result = client
            .upload_binary(&self.collection, &self.id, bytes, options.save_hash)
            .await?;

        if options.save_type_and_size {
            self.set("Size", bytes.len());
            self.set("TypeId", FILE_TYPE_FILE);
        }
        if options.save_hash {
            self.set("Hash", result.clone());
        }
        if options.save_type_and_size || options.save_hash {
            self.update(client).await?;
        }

        Ok(result)
    }

    /// Sever the relation to `related` without deleting the related entity.
    /// A `<related>Id` field, when present, is set to null.
    #[instrument(skip(self, client), fields(collection = %self.collection, id = %self.id))]
    pub async fn delete_link<T: Transport>(
        &mut self,
        client: &mut ODataClient<T>,
        related: &str,
    ) -> Result<()> {
        self.ensure_writable("deletelink")?;
        client
            .delete_link(&self.collection, &self.id, related)
            .await?;

        let link_field = format!("{related}Id");
        if self.has_property(&link_field) {
            self.set(link_field, FieldValue::Null);
        }
        Ok(())
    }

    /// Load every record of `related` whose join field points at this record.
    ///
    /// The join field defaults to `<Collection>/Id`. A non-empty result is
    /// cached under `related`; an empty one removes the cached entry.
    /// Returns the number of records loaded.
    #[instrument(skip(self, client), fields(collection = %self.collection, id = %self.id))]
    pub async fn load_many<T: Transport>(
        &mut self,
        client: &mut ODataClient<T>,
        related: &str,
        join_field: Option<&str>,
    ) -> Result<usize> {
        let join_field = join_field
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/Id", self.collection));
        let filter = format!("{join_field} eq guid'{}'", self.id);
        let max_iterations = client.config().max_iterations;

        let records = client
            .get_all_items_by_query(related, &filter, max_iterations)
            .await?;

        let count = records.len();
        if records.is_empty() {
            self.related.remove(related);
        } else {
            self.related.insert(related.to_string(), records);
        }
        Ok(count)
    }

    /// Download the binary payload; empty when the record has none.
    pub async fn get_data<T: Transport>(&self, client: &mut ODataClient<T>) -> Result<Vec<u8>> {
        if !self.has_binary_data() {
            return Ok(Vec::new());
        }
        let url = client.resolve_url(&self.binary_link);
        client.get_data(&url).await
    }
}

fn now_round_trip() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
