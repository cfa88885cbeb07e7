//! Session manager: login against the auth service and the "ensure
//! authenticated" guard every data call goes through.

use std::str::FromStr;
use std::sync::Arc;

use bpm_odata_client::{
    CookieJar, OdHttpClient, ReqwestTransport, RequestBuilder, Response, Transport,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::SessionCache;
use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};

/// Path of the login endpoint relative to the server base URL.
pub const LOGIN_PATH: &str = "/ServiceModel/AuthService.svc/Login";

/// Solution name sent by the query-string login.
const GET_LOGIN_SOLUTION: &str = "TSBpm";

/// How credentials are sent to the login endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// JSON body.
    #[default]
    Post,
    /// Query string.
    Get,
}

impl FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "GET" => Ok(Self::Get),
            other => Err(Error::new(ErrorKind::Config(format!(
                "unknown auth method: {other}"
            )))),
        }
    }
}

/// Platform version, which selects the login body layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthVersion {
    /// `{UserLogin, UserPassword, ...}`
    V5_1,
    /// `{UserName, UserPassword, ...}`
    #[default]
    V5_4,
}

impl FromStr for AuthVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "5.1" => Ok(Self::V5_1),
            "5.4" => Ok(Self::V5_4),
            other => Err(Error::new(ErrorKind::Config(format!(
                "unknown auth version: {other}"
            )))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoginBodyV51<'a> {
    user_login: &'a str,
    user_password: &'a str,
    language: &'static str,
    time_zone_offset: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoginBodyV54<'a> {
    user_name: &'a str,
    user_password: &'a str,
    language: &'static str,
    time_zone_offset: i32,
}

/// An authenticated session: the cookie jar returned by login.
#[derive(Debug, Clone)]
pub struct Session {
    jar: CookieJar,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Wrap a jar, stamped with the current time.
    pub fn new(jar: CookieJar) -> Self {
        Self {
            jar,
            created_at: Utc::now(),
        }
    }

    /// The session cookies.
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// When the session was established or restored.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// A session with no cookies is not usable.
    pub fn is_empty(&self) -> bool {
        self.jar.is_empty()
    }
}

struct CacheBinding {
    cache: Arc<dyn SessionCache>,
    key: String,
    max_age: Option<Duration>,
}

impl std::fmt::Debug for CacheBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBinding")
            .field("key", &self.key)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

/// Owns the credentials and the current session of one client.
///
/// The session is replaced wholesale on every login by the configured
/// account and never merged with a previous one.
#[derive(Debug)]
pub struct SessionManager<T = ReqwestTransport> {
    http: OdHttpClient<T>,
    base_url: String,
    credentials: Credentials,
    method: AuthMethod,
    version: AuthVersion,
    force_session: bool,
    session: Option<Session>,
    cache: Option<CacheBinding>,
}

impl<T: Transport> SessionManager<T> {
    /// Create a manager for the server at `base_url`. No request is sent yet.
    pub fn new(http: OdHttpClient<T>, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            method: AuthMethod::default(),
            version: AuthVersion::default(),
            force_session: true,
            session: None,
            cache: None,
        }
    }

    /// Set the login method.
    pub fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the login body version.
    pub fn with_auth_version(mut self, version: AuthVersion) -> Self {
        self.version = version;
        self
    }

    /// Whether requests carry the session-forcing header.
    pub fn with_force_session(mut self, force: bool) -> Self {
        self.force_session = force;
        self
    }

    /// Start from a previously captured jar instead of logging in.
    pub fn with_restored_jar(mut self, jar: CookieJar) -> Self {
        self.restore_session(jar);
        self
    }

    /// Share sessions through `cache` under `key`.
    ///
    /// Before logging in, the manager looks for a cached jar (no older than
    /// `max_age` when given); a successful login stores its jar there.
    pub fn with_session_cache(
        mut self,
        cache: Arc<dyn SessionCache>,
        key: impl Into<String>,
        max_age: Option<Duration>,
    ) -> Self {
        self.cache = Some(CacheBinding {
            cache,
            key: key.into(),
            max_age,
        });
        self
    }

    /// The HTTP client used for all calls.
    pub fn http(&self) -> &OdHttpClient<T> {
        &self.http
    }

    /// Server base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Configured login method.
    pub fn auth_method(&self) -> AuthMethod {
        self.method
    }

    /// Configured login body version.
    pub fn auth_version(&self) -> AuthVersion {
        self.version
    }

    /// Whether the session-forcing header is sent.
    pub fn force_session(&self) -> bool {
        self.force_session
    }

    /// Full URL of the login endpoint.
    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The current cookie jar, if any.
    pub fn jar(&self) -> Option<&CookieJar> {
        self.session.as_ref().map(Session::jar)
    }

    /// True when a non-empty cookie jar is held.
    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Replace the current session with `jar`.
    pub fn restore_session(&mut self, jar: CookieJar) {
        self.session = Some(Session::new(jar));
    }

    /// Forget the current session; the next data call logs in again.
    pub fn clear_session(&mut self) {
        self.session = None;
    }

    /// Store the current jar in the bound session cache.
    pub fn save_to_cache(&self) {
        if let (Some(binding), Some(session)) = (&self.cache, &self.session) {
            if !session.is_empty() {
                binding.cache.set(&binding.key, session.jar.clone());
            }
        }
    }

    /// Log in with the given credentials.
    ///
    /// When `login` is the configured account, a fresh jar captures the
    /// response cookies and becomes the current session. Any failure,
    /// including an unreachable server, is reported as `false`.
    #[instrument(skip(self, password), fields(method = ?self.method))]
    pub async fn authenticate(&mut self, login: &str, password: &str) -> bool {
        let own_account = login == self.credentials.login();

        let request = match self.login_request(login, password, own_account) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to build login request");
                return false;
            }
        };

        let mut jar = CookieJar::new();
        let result = self
            .http
            .execute_raw(request, own_account.then_some(&mut jar))
            .await;

        if own_account {
            self.session = Some(Session::new(jar));
        }

        match result {
            Ok(response) if response.status() == 200 => {
                info!(login, "Login succeeded");
                if own_account {
                    self.save_to_cache();
                }
                true
            }
            Ok(response) => {
                warn!(login, status = response.status(), "Login rejected");
                false
            }
            Err(e) => {
                warn!(login, error = %e, "Login request failed");
                false
            }
        }
    }

    /// Log in with the configured credentials.
    pub async fn try_login(&mut self) -> bool {
        let credentials = self.credentials.clone();
        self.authenticate(credentials.login(), credentials.password())
            .await
    }

    /// Make sure a session exists before a data call.
    ///
    /// An absent or empty jar is first looked up in the session cache and
    /// otherwise replaced by a silent login. Returns whether a usable
    /// session is held afterwards.
    pub async fn ensure_authenticated(&mut self) -> bool {
        if self.is_authenticated() {
            return true;
        }

        if let Some(jar) = self.cached_jar() {
            debug!("Restored session from cache");
            self.session = Some(Session::new(jar));
            return true;
        }

        self.try_login().await && self.is_authenticated()
    }

    /// Send a data request with the session attached.
    ///
    /// Cookies refreshed by the server are kept in the current jar. Failure
    /// statuses come back as classified web errors.
    pub async fn execute(
        &mut self,
        request: RequestBuilder,
    ) -> bpm_odata_client::Result<Response> {
        self.ensure_authenticated().await;
        let jar = self.session.as_mut().map(|s| &mut s.jar);
        self.http.execute(request, jar).await
    }

    fn cached_jar(&self) -> Option<CookieJar> {
        let binding = self.cache.as_ref()?;
        let jar = match binding.max_age {
            Some(max_age) => binding.cache.get_fresh(&binding.key, max_age),
            None => binding.cache.get(&binding.key),
        }?;
        (!jar.is_empty()).then_some(jar)
    }

    fn login_request(
        &self,
        login: &str,
        password: &str,
        own_account: bool,
    ) -> Result<RequestBuilder> {
        let url = self.login_url();
        let request = match self.method {
            AuthMethod::Post => {
                let request = self.http.post(url);
                match self.version {
                    AuthVersion::V5_1 => request.json(&LoginBodyV51 {
                        user_login: login,
                        user_password: password,
                        language: "Ru-ru",
                        time_zone_offset: 0,
                    })?,
                    AuthVersion::V5_4 => request.json(&LoginBodyV54 {
                        user_name: login,
                        user_password: password,
                        language: "ru-Ru",
                        time_zone_offset: 0,
                    })?,
                }
            }
            AuthMethod::Get => self
                .http
                .get(url)
                .query("UserName", login)
                .query("UserPassword", password)
                .query("SolutionName", GET_LOGIN_SOLUTION)
                .header("Content-Type", "application/json"),
        };

        Ok(if own_account && self.force_session {
            request.force_session()
        } else {
            request
        })
    }
}
