//! Error types for od-data.

use std::fmt;

/// Result type alias for od-data operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for od-data operations.
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

    /// Security error for a mutating call on a read-only record.
    pub fn security(operation: &str) -> Self {
        Self::new(ErrorKind::Security {
            operation: operation.to_string(),
        })
    }

    /// Returns the HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Web { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server message parsed from the OData error envelope.
    pub fn server_message(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Web { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }

    /// Server stack trace parsed from the OData error envelope.
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
    /// The service answered with a failure status.
    #[error("Web error: {status} {message}{}", ServerMessage(.server_message))]
    Web {
        status: u16,
        message: String,
        server_message: Option<String>,
        server_stack_trace: Option<String>,
    },

    /// The request never got an answer (timeout, connection failure).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be parsed.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A mutating operation was attempted on a read-only record.
    #[error("Security violation: {operation} is not allowed on a read-only record")]
    Security { operation: String },

    /// A single entity lookup found nothing.
    #[error("{0} not found")]
    NotFound(String),

    /// Session setup failed.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

struct ServerMessage<'a>(&'a Option<String>);

impl fmt::Display for ServerMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(message) => write!(f, " ({message})"),
            None => Ok(()),
        }
    }
}

impl From<bpm_odata_client::Error> for Error {
    fn from(err: bpm_odata_client::Error) -> Self {
        use bpm_odata_client::ErrorKind as ClientKind;

        let kind = match &err.kind {
            ClientKind::Web {
                status,
                message,
                server_message,
                server_stack_trace,
            } => ErrorKind::Web {
                status: *status,
                message: message.clone(),
                server_message: server_message.clone(),
                server_stack_trace: server_stack_trace.clone(),
            },
            ClientKind::MalformedResponse(message) => ErrorKind::MalformedResponse(message.clone()),
            ClientKind::InvalidUrl(message) => ErrorKind::InvalidInput(message.clone()),
            _ => ErrorKind::Transport(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<bpm_odata_auth::Error> for Error {
    fn from(err: bpm_odata_auth::Error) -> Self {
        Error::with_source(ErrorKind::Auth(err.to_string()), err)
    }
}
