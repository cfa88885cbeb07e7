//! Error types for od-client.

/// Result type alias for od-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for od-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the server answered with a non-success status.
    pub fn is_web_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Web { .. })
    }

    /// Returns the HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Web { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the server-side error message parsed from the OData error envelope.
    pub fn server_message(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Web { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }

    /// Returns the server-side stack trace parsed from the OData error envelope.
    pub fn server_stack_trace(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Web {
                server_stack_trace, ..
            } => server_stack_trace.as_deref(),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The server answered with a non-success status.
    #[error("HTTP error: {status} {message}{}", .server_message.as_ref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Web {
        status: u16,
        message: String,
        server_message: Option<String>,
        server_stack_trace: Option<String>,
    },

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response body could not be parsed.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if err.is_builder() {
            ErrorKind::InvalidUrl(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::with_source(ErrorKind::MalformedResponse(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}
