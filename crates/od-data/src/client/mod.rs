//! OData data service client.
//!
//! This client wraps a [`SessionManager`] from `od-auth` and provides the
//! paged reads, CRUD verbs and query helpers of the entity data service.

use std::collections::HashSet;
use std::sync::Arc;

use bpm_odata_auth::{Credentials, SessionCache, SessionManager};
use bpm_odata_client::{
    CookieJar, OdHttpClient, ReqwestTransport, RequestBuilder, RequestMethod, Response,
    Transport, XmlElement,
};
use chrono::Duration;
use tracing::{debug, error, instrument};

use crate::config::ODataConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::error_log::ErrorLog;
use crate::query::{ODataQuery, COLLECTION_SUFFIX};

mod binary;
mod crud;
mod items;
mod service;

pub use binary::{sha256_hex, UPLOAD_OK};

/// One fetched page: the entries and, for feeds, the feed-level links.
#[derive(Debug, Clone, Default)]
pub struct Page {
    entries: Vec<XmlElement>,
    links: Vec<XmlElement>,
    count: Option<u64>,
}

impl Page {
    /// Split a feed or single-entry document into a page. Any other root
    /// yields an empty page.
    pub fn from_document(root: XmlElement) -> Self {
        let mut page = Page::default();

        if root.is("feed") {
            for child in root.into_children() {
                if child.is("entry") {
                    page.entries.push(child);
                } else if child.is("link") {
                    page.links.push(child);
                } else if child.is("count") {
                    page.count = child.text().trim().parse().ok();
                }
            }
        } else if root.is("entry") {
            page.entries.push(root);
        }

        page
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[XmlElement] {
        &self.entries
    }

    /// Feed-level links (`next`, `self`).
    pub fn links(&self) -> &[XmlElement] {
        &self.links
    }

    /// Total count reported with `$inlinecount=allpages`.
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Href of the `rel="next"` link, if the feed continues.
    pub fn next_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.attr("rel") == Some("next"))
            .and_then(|link| link.attr("href"))
    }

    /// True when the page holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the entries.
    pub fn into_entries(self) -> Vec<XmlElement> {
        self.entries
    }
}

/// Client for the entity data service.
///
/// Every call first makes sure a session exists, logging in silently when
/// needed. Calls are sequential; the client is meant for one caller at a time.
///
/// # Example
///
/// ```rust,ignore
/// use bpm_odata_data::{Credentials, ODataClient, ODataConfig, Record};
///
/// let config = ODataConfig::builder("https://bpm.example.com").build();
/// let mut client = ODataClient::new(config, Credentials::new("Supervisor", "secret"))?;
///
/// let mut contact = Record::new_object("Contact");
/// contact.set("Name", "Jane");
/// let location = contact.update(&mut client).await?;
///
/// let janes = client.get_some_items("Contact", "Name eq 'Jane'", 0).await?;
/// ```
#[derive(Debug)]
pub struct ODataClient<T = ReqwestTransport> {
    sessions: SessionManager<T>,
    config: ODataConfig,
    data_service_url: String,
    requests_completed: u64,
    error_log: ErrorLog,
}

impl ODataClient<ReqwestTransport> {
    /// Create a client backed by `reqwest`. No request is sent yet.
    pub fn new(config: ODataConfig, credentials: Credentials) -> Result<Self> {
        let http = OdHttpClient::new(config.http.clone())?;
        Ok(Self::with_http(http, config, credentials))
    }

    /// Create a client from `BPM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ODataConfig::from_env()?, Credentials::from_env()?)
    }
}

impl<T: Transport> ODataClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: T, config: ODataConfig, credentials: Credentials) -> Self {
        let http = OdHttpClient::with_transport(transport, config.http.clone());
        Self::with_http(http, config, credentials)
    }

    /// Create a client from an existing HTTP client.
    pub fn with_http(http: OdHttpClient<T>, config: ODataConfig, credentials: Credentials) -> Self {
        let sessions = SessionManager::new(http, config.base_url.clone(), credentials)
            .with_auth_method(config.auth_method)
            .with_auth_version(config.auth_version)
            .with_force_session(config.force_session);

        Self {
            sessions,
            data_service_url: config.data_service_url(),
            error_log: ErrorLog::with_capacity(config.error_log_capacity),
            requests_completed: 0,
            config,
        }
    }

    /// Start from a previously captured session jar instead of logging in.
    pub fn with_restored_jar(mut self, jar: CookieJar) -> Self {
        self.sessions.restore_session(jar);
        self
    }

    /// Share sessions through `cache` under `key`; see
    /// [`SessionManager::with_session_cache`].
    pub fn with_session_cache(
        mut self,
        cache: Arc<dyn SessionCache>,
        key: impl Into<String>,
        max_age: Option<Duration>,
    ) -> Self {
        self.sessions = self.sessions.with_session_cache(cache, key, max_age);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ODataConfig {
        &self.config
    }

    /// Get the session manager.
    pub fn sessions(&self) -> &SessionManager<T> {
        &self.sessions
    }

    /// Get the session manager mutably, e.g. to restore or clear a session.
    pub fn sessions_mut(&mut self) -> &mut SessionManager<T> {
        &mut self.sessions
    }

    /// Root URL of the OData service, with trailing slash.
    pub fn data_service_url(&self) -> &str {
        &self.data_service_url
    }

    /// Number of successful data-returning calls so far.
    pub fn requests_completed(&self) -> u64 {
        self.requests_completed
    }

    /// Get the error log.
    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Recorded failures, oldest first.
    pub fn error_messages(&self) -> Vec<String> {
        self.error_log.messages()
    }

    /// Forget recorded failures.
    pub fn reset_error_messages(&mut self) {
        self.error_log.clear();
    }

    /// Check a login; see [`SessionManager::authenticate`].
    pub async fn authenticate(&mut self, login: &str, password: &str) -> bool {
        self.sessions.authenticate(login, password).await
    }

    /// Log in with the configured credentials.
    pub async fn try_login(&mut self) -> bool {
        self.sessions.try_login().await
    }

    /// URL of a collection: `<service>/<name>Collection`.
    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}{collection}{COLLECTION_SUFFIX}", self.data_service_url)
    }

    /// URL of one entity: `<service>/<name>Collection(guid'<id>')`.
    pub fn entity_url(&self, collection: &str, id: &str) -> String {
        format!("{}(guid'{id}')", self.collection_url(collection))
    }

    /// Turn an href from a response into an absolute URL. Relative hrefs
    /// are taken relative to the service root.
    pub fn resolve_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.data_service_url, href.trim_start_matches('/'))
        }
    }

    /// Rewrite `http://` links to `https://` when the server is configured
    /// over HTTPS; the service sometimes returns plain-http absolute links.
    fn upgrade_scheme(&self, url: &str) -> String {
        match url.strip_prefix("http://") {
            Some(rest) if self.config.uses_https() => format!("https://{rest}"),
            _ => url.to_string(),
        }
    }

    fn data_request(&self, method: RequestMethod, url: &str) -> RequestBuilder {
        let mut request = RequestBuilder::new(method, self.upgrade_scheme(url));
        if self.config.force_session {
            request = request.force_session();
        }
        if self.config.read_only_session {
            request = request.read_only_session();
        }
        request
    }

    /// Execute with the session attached; failures are logged and raised.
    async fn send(&mut self, request: RequestBuilder, failure: &str) -> Result<Response> {
        let url = request.url().to_string();
        match self.sessions.execute(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(url = %url, error = %e, "{}", failure);
                self.error_log.push(format!("{failure} @ {url}"));
                Err(e.into())
            }
        }
    }

    fn parse_xml(&mut self, response: &Response, url: &str) -> Result<XmlElement> {
        response.xml().map_err(|e| {
            error!(url = %url, error = %e, "Error in XML");
            self.error_log.push(format!("Error in XML page @ {url}"));
            e.into()
        })
    }

    fn count_request(&mut self) {
        self.requests_completed += 1;
    }

    /// Fetch one page.
    ///
    /// A feed yields its entries and links, a single entry yields itself.
    #[instrument(skip(self))]
    pub async fn get_page(&mut self, url: &str) -> Result<Page> {
        let url = self.upgrade_scheme(url);
        let request = self.data_request(RequestMethod::Get, &url);
        let response = self.send(request, "Failed to retrieve page").await?;
        let root = self.parse_xml(&response, &url)?;
        self.count_request();

        let page = Page::from_document(root);
        debug!(entries = page.entries().len(), "Page retrieved");
        Ok(page)
    }

    /// Fetch the entries of a collection across pages.
    ///
    /// `filter` and `fields` may be empty. At most `max_iterations` pages are
    /// fetched.
    pub async fn get_all_pages(
        &mut self,
        collection: &str,
        filter: &str,
        fields: &str,
        max_iterations: usize,
    ) -> Result<Vec<XmlElement>> {
        check_collection(collection)?;
        let url = ODataQuery::new(collection)
            .select(fields)
            .filter(filter)
            .to_url(&self.data_service_url);
        self.get_all_pages_from(&url, max_iterations).await
    }

    /// Follow `rel="next"` links from `url`, collecting entries.
    ///
    /// Stops when there is no next link, when the next link is one already
    /// fetched, or after `max_iterations` fetches.
    #[instrument(skip(self))]
    pub async fn get_all_pages_from(
        &mut self,
        url: &str,
        max_iterations: usize,
    ) -> Result<Vec<XmlElement>> {
        let mut entries = Vec::new();
        let mut current = self.upgrade_scheme(url);
        let mut visited = HashSet::from([current.clone()]);

        for _ in 0..max_iterations {
            let page = self.get_page(&current).await?;
            // Compare links in the form they are fetched in.
            let next = page
                .next_link()
                .map(|href| self.upgrade_scheme(&self.resolve_url(href)));
            entries.extend(page.into_entries());

            match next {
                Some(next) if visited.insert(next.clone()) => current = next,
                Some(next) => {
                    debug!(next = %next, "Next link already visited, stopping");
                    break;
                }
                None => break,
            }
        }

        Ok(entries)
    }
}

/// Collection names go into URLs unescaped.
pub(crate) fn check_collection(collection: &str) -> Result<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::new(ErrorKind::InvalidInput(format!(
            "invalid collection name: {collection:?}"
        ))));
    }
    Ok(())
}

/// Entity ids go into `guid'…'` literals unescaped.
pub(crate) fn check_id(id: &str) -> Result<()> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
    if !valid {
        return Err(Error::new(ErrorKind::InvalidInput(format!(
            "invalid entity id: {id:?}"
        ))));
    }
    Ok(())
}
