//! Session cache service.
//!
//! Applications that open many short-lived clients against the same account
//! can park the session cookie jar here and skip the login round trip. The
//! cache is a caller-owned collaborator: nothing in the workspace keeps a
//! process-wide instance.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bpm_odata_client::CookieJar;
use chrono::{DateTime, Duration, Utc};

/// Keyed store of session cookie jars.
///
/// Keys are unique and the most recent write wins. Entries are never evicted
/// on their own; stale entries are simply reported as misses by
/// [`SessionCache::get_fresh`] until the caller drops them.
pub trait SessionCache: Send + Sync {
    /// Get the jar stored under `key`, regardless of age.
    fn get(&self, key: &str) -> Option<CookieJar>;

    /// Get the jar stored under `key` only if it was stored at most `max_age` ago.
    fn get_fresh(&self, key: &str, max_age: Duration) -> Option<CookieJar>;

    /// Store a jar under `key`, stamped with the current time.
    fn set(&self, key: &str, jar: CookieJar);

    /// Remove the entry under `key`.
    fn drop_key(&self, key: &str);
}

/// A cached jar and the moment it was stored.
#[derive(Debug, Clone)]
pub struct SessionCacheEntry {
    pub jar: CookieJar,
    pub stored_at: DateTime<Utc>,
}

impl SessionCacheEntry {
    /// True when the entry is no older than `max_age` at `now`.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.stored_at <= max_age
    }
}

/// In-memory [`SessionCache`].
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    entries: Mutex<HashMap<String, SessionCacheEntry>>,
}

impl MemorySessionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a jar with an explicit timestamp.
    pub fn set_at(&self, key: &str, jar: CookieJar, stored_at: DateTime<Utc>) {
        self.lock()
            .insert(key.to_string(), SessionCacheEntry { jar, stored_at });
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &str) -> Option<SessionCacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Lock the entries, recovering from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionCacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionCache for MemorySessionCache {
    fn get(&self, key: &str) -> Option<CookieJar> {
        self.entry(key).map(|e| e.jar)
    }

    fn get_fresh(&self, key: &str, max_age: Duration) -> Option<CookieJar> {
        self.entry(key)
            .filter(|e| e.is_fresh(max_age, Utc::now()))
            .map(|e| e.jar)
    }

    fn set(&self, key: &str, jar: CookieJar) {
        self.set_at(key, jar, Utc::now());
    }

    fn drop_key(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Maximum session age written as `<n>m`, `<n>h` or `<n>d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeshift(Duration);

impl Timeshift {
    /// Parse a timeshift such as `"30m"`, `"2h"` or `"1d"`.
    ///
    /// An unknown suffix or an unparseable count yields a zero duration.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let count = |suffix: char| {
            value
                .strip_suffix(suffix)
                .and_then(|n| n.trim().parse::<i64>().ok())
        };

        let duration = if let Some(minutes) = count('m') {
            Duration::try_minutes(minutes)
        } else if let Some(hours) = count('h') {
            Duration::try_hours(hours)
        } else if let Some(days) = count('d') {
            Duration::try_days(days)
        } else {
            None
        };

        Self(duration.unwrap_or_else(Duration::zero))
    }

    /// The parsed duration.
    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl From<Timeshift> for Duration {
    fn from(value: Timeshift) -> Self {
        value.0
    }
}
