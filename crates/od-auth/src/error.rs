//! Error types for od-auth.
//!
//! Error messages never include passwords or cookie values.

/// Result type alias for od-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for od-auth operations.
///
/// A rejected login is not an error; [`crate::SessionManager::authenticate`]
/// reports it as `false`.
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
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Error from the HTTP layer.
    #[error("Client error: {0}")]
    Client(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bpm_odata_client::Error> for Error {
    fn from(err: bpm_odata_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.to_string()), err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::with_source(ErrorKind::EnvVar(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        let err = ErrorKind::EnvVar("BPM_LOGIN".to_string());
        assert_eq!(err.to_string(), "Environment variable not set: BPM_LOGIN");

        let err = ErrorKind::InvalidCredentials("login is empty".to_string());
        assert_eq!(err.to_string(), "Invalid credentials: login is empty");
    }

    #[test]
    fn test_client_error_conversion() {
        let client_err = bpm_odata_client::Error::new(bpm_odata_client::ErrorKind::Timeout);
        let err: Error = client_err.into();
        assert!(matches!(err.kind, ErrorKind::Client(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
