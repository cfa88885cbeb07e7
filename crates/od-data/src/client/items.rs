use std::collections::HashMap;

use bpm_odata_client::Transport;
use tracing::{debug, instrument};

use super::check_collection;
use crate::error::Result;
use crate::query::{MatchMode, ODataQuery};
use crate::record::Record;

/// Filter sent when a single-page query has no condition.
const MATCH_ALL: &str = "1 eq 1";

impl<T: Transport> super::ODataClient<T> {
    /// First record whose `field` matches `value`.
    #[instrument(skip(self))]
    pub async fn get_first_item_by_unique_field(
        &mut self,
        collection: &str,
        field: &str,
        value: &str,
        mode: MatchMode,
    ) -> Result<Option<Record>> {
        let filter = mode.filter(field, value);
        self.get_first_item_by_query(collection, &filter).await
    }

    /// First record matching `filter`, from the first page only.
    #[instrument(skip(self))]
    pub async fn get_first_item_by_query(
        &mut self,
        collection: &str,
        filter: &str,
    ) -> Result<Option<Record>> {
        let mut records = self.get_some_items(collection, filter, 0).await?;
        Ok((!records.is_empty()).then(|| records.swap_remove(0)))
    }

    /// One page of records matching `filter`, starting after `skip` entries.
    #[instrument(skip(self))]
    pub async fn get_some_items(
        &mut self,
        collection: &str,
        filter: &str,
        skip: usize,
    ) -> Result<Vec<Record>> {
        self.single_page(collection, filter, "", skip, false).await
    }

    /// One page of records with only `fields` selected. The records are
    /// read-only.
    #[instrument(skip(self))]
    pub async fn get_some_limited_items(
        &mut self,
        collection: &str,
        filter: &str,
        fields: &str,
        skip: usize,
    ) -> Result<Vec<Record>> {
        self.single_page(collection, filter, fields, skip, true).await
    }

    /// Every record matching `filter`, following at most `max_iterations`
    /// pages.
    #[instrument(skip(self))]
    pub async fn get_all_items_by_query(
        &mut self,
        collection: &str,
        filter: &str,
        max_iterations: usize,
    ) -> Result<Vec<Record>> {
        let entries = self
            .get_all_pages(collection, filter, "", max_iterations)
            .await?;
        Ok(entries
            .iter()
            .map(|entry| Record::from_entry(collection, entry, false))
            .collect())
    }

    /// Every record matching `filter` with only `fields` selected. The
    /// records are read-only.
    #[instrument(skip(self))]
    pub async fn get_all_limited_items_by_query(
        &mut self,
        collection: &str,
        filter: &str,
        fields: &str,
        max_iterations: usize,
    ) -> Result<Vec<Record>> {
        let entries = self
            .get_all_pages(collection, filter, fields, max_iterations)
            .await?;
        Ok(entries
            .iter()
            .map(|entry| Record::from_entry(collection, entry, true))
            .collect())
    }

    /// Records matching `filter`, keyed by the value of `field`.
    ///
    /// Records without the field are skipped. When two records share a
    /// value the later one wins.
    #[instrument(skip(self))]
    pub async fn get_dictionary_by_unique_field(
        &mut self,
        collection: &str,
        field: &str,
        filter: &str,
        max_iterations: usize,
    ) -> Result<HashMap<String, Record>> {
        let records = self
            .get_all_items_by_query(collection, filter, max_iterations)
            .await?;

        let mut dictionary = HashMap::with_capacity(records.len());
        for record in records {
            let Some(key) = record.get(field).and_then(|v| v.to_wire_string()) else {
                continue;
            };
            if dictionary.insert(key, record).is_some() {
                debug!(field, "Duplicate key, keeping the later record");
            }
        }
        Ok(dictionary)
    }

    async fn single_page(
        &mut self,
        collection: &str,
        filter: &str,
        fields: &str,
        skip: usize,
        read_only: bool,
    ) -> Result<Vec<Record>> {
        check_collection(collection)?;
        let filter = if filter.trim().is_empty() {
            MATCH_ALL
        } else {
            filter
        };
        let url = ODataQuery::new(collection)
            .select(fields)
            .filter(filter)
            .skip(skip)
            .to_url(&self.data_service_url);

        let page = self.get_page(&url).await?;
        Ok(page
            .entries()
            .iter()
            .map(|entry| Record::from_entry(collection, entry, read_only))
            .collect())
    }
}
