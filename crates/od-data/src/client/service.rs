use bpm_odata_client::{RequestMethod, Transport, XmlElement};
use tracing::instrument;

use super::check_collection;
use crate::error::Result;
use crate::query::ODataQuery;

impl<T: Transport> super::ODataClient<T> {
    /// Names of the entity sets published by the service document, in
    /// document order and without duplicates.
    #[instrument(skip(self))]
    pub async fn get_collections(&mut self) -> Result<Vec<String>> {
        let url = self.data_service_url.clone();
        let request = self.data_request(RequestMethod::Get, &url);
        let response = self.send(request, "Failed to retrieve service document").await?;
        let root = self.parse_xml(&response, &url)?;
        self.count_request();

        Ok(collection_names(&root))
    }

    /// Total number of entities in a collection, from `$inlinecount`.
    /// An unreadable count is reported as zero.
    #[instrument(skip(self))]
    pub async fn get_collection_size(&mut self, collection: &str) -> Result<u64> {
        check_collection(collection)?;
        let url = ODataQuery::new(collection)
            .select("Id")
            .top(1)
            .inline_count()
            .to_url(&self.data_service_url);
        let page = self.get_page(&url).await?;
        Ok(page.count().unwrap_or(0))
    }

    /// The raw `$metadata` document.
    #[instrument(skip(self))]
    pub async fn get_metadata(&mut self) -> Result<String> {
        let url = format!("{}$metadata", self.data_service_url);
        let request = self.data_request(RequestMethod::Get, &url);
        let response = self.send(request, "Failed to retrieve metadata").await?;
        let text = response.text()?;
        self.count_request();
        Ok(text)
    }
}

fn collection_names(service: &XmlElement) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for workspace in service.children_named("workspace") {
        for collection in workspace.children_named("collection") {
            if let Some(href) = collection.attr("href") {
                if !names.iter().any(|n| n == href) {
                    names.push(href.to_string());
                }
            }
        }
    }
    names
}
