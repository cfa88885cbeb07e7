use std::collections::BTreeMap;

use bpm_odata_client::{RequestMethod, Transport};
use tracing::{info, instrument};

use super::{check_collection, check_id};
use crate::atom::{build_entry, EntryKind};
use crate::error::{Error, ErrorKind, Result};
use crate::record::{FieldValue, Record};

impl<T: Transport> super::ODataClient<T> {
    /// Create an entity and return the `Location` header of the response.
    ///
    /// Null fields are left out of the create body. Only `201 Created`
    /// counts as success.
    #[instrument(skip(self, fields), fields(fields = fields.len()))]
    pub async fn add_item(
        &mut self,
        collection: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<String> {
        check_collection(collection)?;
        let body = build_entry(fields, EntryKind::Create)?;
        let url = format!("{}/", self.collection_url(collection));
        let request = self.data_request(RequestMethod::Post, &url).atom_entry(body);
        let response = self.send(request, "Failed to create item").await?;

        if response.status() != 201 {
            self.error_log
                .push(format!("Unexpected status {} creating item @ {url}", response.status()));
            return Err(Error::new(ErrorKind::Web {
                status: response.status(),
                message: "expected 201 Created".to_string(),
                server_message: None,
                server_stack_trace: None,
            }));
        }

        let location = response
            .location()
            .ok_or_else(|| {
                Error::new(ErrorKind::MalformedResponse(
                    "create response has no Location header".to_string(),
                ))
            })?
            .to_string();

        self.count_request();
        info!(location = %location, "Item created");
        Ok(location)
    }

    /// Replace an entity with `fields`. Null fields are sent as explicit nulls.
    #[instrument(skip(self, fields), fields(fields = fields.len()))]
    pub async fn update_item(
        &mut self,
        collection: &str,
        id: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<()> {
        check_collection(collection)?;
        check_id(id)?;
        let body = build_entry(fields, EntryKind::Update)?;
        let url = format!("{}/", self.entity_url(collection, id));
        let request = self.data_request(RequestMethod::Put, &url).atom_entry(body);
        self.send(request, "Failed to update item").await?;
        self.count_request();
        Ok(())
    }

    /// Delete an entity.
    #[instrument(skip(self))]
    pub async fn delete_item(&mut self, collection: &str, id: &str) -> Result<()> {
        check_collection(collection)?;
        check_id(id)?;
        let url = format!("{}/", self.entity_url(collection, id));
        let request = self.data_request(RequestMethod::Delete, &url);
        self.send(request, "Failed to delete item").await?;
        Ok(())
    }

    /// Remove the link from an entity to `related`. The related entity stays.
    #[instrument(skip(self))]
    pub async fn delete_link(&mut self, collection: &str, id: &str, related: &str) -> Result<()> {
        check_collection(collection)?;
        check_id(id)?;
        check_collection(related)?;
        let url = format!("{}/$links/{related}", self.entity_url(collection, id));
        let request = self.data_request(RequestMethod::Delete, &url);
        self.send(request, "Failed to delete link").await?;
        Ok(())
    }

    /// Fetch one entity by id.
    ///
    /// Fails with `NotFound` when the service answers 404 or returns no
    /// usable entry.
    #[instrument(skip(self))]
    pub async fn get_record(&mut self, collection: &str, id: &str) -> Result<Record> {
        check_collection(collection)?;
        check_id(id)?;
        let url = self.entity_url(collection, id);
        let identity = format!("{collection}Collection(guid'{id}')");

        let page = match self.get_page(&url).await {
            Ok(page) => page,
            Err(e) if e.status() == Some(404) => {
                return Err(Error::new(ErrorKind::NotFound(identity)))
            }
            Err(e) => return Err(e),
        };

        let record = page
            .entries()
            .first()
            .map(|entry| Record::from_entry(collection, entry, false))
            .filter(|record| !record.fields().is_empty() && !record.id().is_empty());

        record.ok_or_else(|| Error::new(ErrorKind::NotFound(identity)))
    }
}
