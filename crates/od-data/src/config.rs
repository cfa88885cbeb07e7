//! Data client configuration.

use bpm_odata_auth::{AuthMethod, AuthVersion};
use bpm_odata_client::ClientConfig;

use crate::error::{Error, ErrorKind, Result};
use crate::error_log::DEFAULT_ERROR_LOG_CAPACITY;

/// Path of the OData service below the server (and solution) root.
pub const DATA_SERVICE_PATH: &str = "/ServiceModel/EntityDataService.svc/";

/// Default cap on page fetches for multi-page reads.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Configuration for [`crate::ODataClient`].
#[derive(Debug, Clone)]
pub struct ODataConfig {
    /// Server root, e.g. `https://bpm.example.com`.
    pub base_url: String,
    /// Solution (workspace) number inserted before the service path.
    pub solution_id: Option<u32>,
    pub auth_method: AuthMethod,
    pub auth_version: AuthVersion,
    /// Send `Bpmonline-Session-Mode: ReadOnly` with data calls.
    pub read_only_session: bool,
    /// Send `ForceUseSession: true`.
    pub force_session: bool,
    /// Page fetch cap used by the helpers that take no explicit limit.
    pub max_iterations: usize,
    pub error_log_capacity: usize,
    /// HTTP settings.
    pub http: ClientConfig,
}

impl ODataConfig {
    /// Create a config builder for the server at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ODataConfigBuilder {
        ODataConfigBuilder {
            config: ODataConfig {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                solution_id: None,
                auth_method: AuthMethod::default(),
                auth_version: AuthVersion::default(),
                read_only_session: false,
                force_session: true,
                max_iterations: DEFAULT_MAX_ITERATIONS,
                error_log_capacity: DEFAULT_ERROR_LOG_CAPACITY,
                http: ClientConfig::default(),
            },
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `BPM_URL`
    ///
    /// Optional:
    /// - `BPM_SOLUTION_ID`
    /// - `BPM_AUTH_METHOD` (`POST` or `GET`, default `POST`)
    /// - `BPM_AUTH_VERSION` (`5.1` or `5.4`, default `5.4`)
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = var("BPM_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput("BPM_URL is not set".to_string())))?;

        let mut builder = Self::builder(base_url);

        if let Some(solution_id) = var("BPM_SOLUTION_ID") {
            let solution_id = solution_id.trim().parse::<u32>().map_err(|e| {
                Error::with_source(
                    ErrorKind::InvalidInput(format!("BPM_SOLUTION_ID is not a number: {solution_id}")),
                    e,
                )
            })?;
            builder = builder.with_solution_id(solution_id);
        }
        if let Some(method) = var("BPM_AUTH_METHOD") {
            builder = builder.with_auth_method(method.parse()?);
        }
        if let Some(version) = var("BPM_AUTH_VERSION") {
            builder = builder.with_auth_version(version.parse()?);
        }

        Ok(builder.build())
    }

    /// Root URL of the OData service, with trailing slash.
    ///
    /// Version 5.4 servers always have a solution segment; `0` is used when
    /// none is configured.
    pub fn data_service_url(&self) -> String {
        let solution_id = match (self.solution_id, self.auth_version) {
            (Some(id), _) => Some(id),
            (None, AuthVersion::V5_4) => Some(0),
            (None, AuthVersion::V5_1) => None,
        };

        match solution_id {
            Some(id) => format!("{}/{id}{DATA_SERVICE_PATH}", self.base_url),
            None => format!("{}{DATA_SERVICE_PATH}", self.base_url),
        }
    }

    /// True when the server is reached over HTTPS.
    pub fn uses_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Builder for [`ODataConfig`].
#[derive(Debug, Clone)]
pub struct ODataConfigBuilder {
    config: ODataConfig,
}

impl ODataConfigBuilder {
    /// Set the solution number.
    pub fn with_solution_id(mut self, solution_id: u32) -> Self {
        self.config.solution_id = Some(solution_id);
        self
    }

    /// Set the login method.
    pub fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.config.auth_method = method;
        self
    }

    /// Set the login body version.
    pub fn with_auth_version(mut self, version: AuthVersion) -> Self {
        self.config.auth_version = version;
        self
    }

    /// Use the read-only session mode.
    pub fn with_read_only_session(mut self, read_only: bool) -> Self {
        self.config.read_only_session = read_only;
        self
    }

    /// Send the session-forcing header.
    pub fn with_force_session(mut self, force: bool) -> Self {
        self.config.force_session = force;
        self
    }

    /// Set the default page fetch cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set how many failures the error log keeps.
    pub fn with_error_log_capacity(mut self, capacity: usize) -> Self {
        self.config.error_log_capacity = capacity;
        self
    }

    /// Set the HTTP configuration.
    pub fn with_http_config(mut self, http: ClientConfig) -> Self {
        self.config.http = http;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ODataConfig {
        self.config
    }
}
