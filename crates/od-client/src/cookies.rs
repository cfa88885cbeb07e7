//! Session cookie jar.
//!
//! The jar is the whole of an authenticated session: login fills it from
//! `Set-Cookie` headers and every later request sends it back. It is
//! serializable so an application can park it in an external cache.

use std::collections::BTreeMap;

use cookie::Cookie;
use serde::{Deserialize, Serialize};

/// Name → value store of session cookies.
///
/// Cookie values are redacted in Debug output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar")
            .field("names", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cookies held.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// True when no cookie is held; such a jar does not represent a session.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Get a cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Insert or overwrite a cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Cookie names currently held.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// Absorb one `Set-Cookie` header value.
    ///
    /// A cookie with an empty value or `Max-Age=0` removes the stored cookie.
    /// Unparseable headers are ignored.
    pub fn store_set_cookie(&mut self, header: &str) {
        let Ok(parsed) = Cookie::parse(header.to_string()) else {
            tracing::debug!("Ignoring unparseable Set-Cookie header");
            return;
        };

        let expired = parsed
            .max_age()
            .map(|age| age.is_zero() || age.is_negative())
            .unwrap_or(false);

        if parsed.value().is_empty() || expired {
            self.cookies.remove(parsed.name());
        } else {
            self.cookies
                .insert(parsed.name().to_string(), parsed.value().to_string());
        }
    }

    /// Value for the outgoing `Cookie` header, if any cookie is held.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
