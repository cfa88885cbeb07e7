//! Login credentials.
//!
//! The password is redacted in Debug output.

use crate::error::{Error, ErrorKind, Result};

/// Login and password for the auth service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Create new credentials.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `BPM_LOGIN`
    /// - `BPM_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let login = std::env::var("BPM_LOGIN")
            .map_err(|_| Error::new(ErrorKind::EnvVar("BPM_LOGIN".to_string())))?;
        let password = std::env::var("BPM_PASSWORD")
            .map_err(|_| Error::new(ErrorKind::EnvVar("BPM_PASSWORD".to_string())))?;

        let creds = Self::new(login, password);
        creds.validate()?;
        Ok(creds)
    }

    /// The login name.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// The password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns an error when the login is empty.
    pub fn validate(&self) -> Result<()> {
        if self.login.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "login is empty".to_string(),
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("Supervisor", "super-secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("Supervisor"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_validate() {
        assert!(Credentials::new("Supervisor", "").validate().is_ok());
        let err = Credentials::new("  ", "pw").validate().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidCredentials(_)));
    }
}
