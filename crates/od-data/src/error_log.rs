//! Rolling log of failed data calls.
//!
//! Transport and parse failures are raised to the caller and also recorded
//! here, so the history can be inspected after the fact.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};

/// Default number of entries kept.
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 100;

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl fmt::Display for ErrorLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.at.format("%d.%m.%Y %H:%M:%S"), self.message)
    }
}

/// Bounded log; the oldest entry is dropped when full.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    capacity: usize,
    entries: VecDeque<ErrorLogEntry>,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ERROR_LOG_CAPACITY)
    }
}

impl ErrorLog {
    /// Create a log keeping at most `capacity` entries. Zero disables logging.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_ERROR_LOG_CAPACITY)),
        }
    }

    /// Record a failure stamped with the current time.
    pub fn push(&mut self, message: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ErrorLogEntry {
            at: Utc::now(),
            message: message.into(),
        });
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ErrorLogEntry> {
        self.entries.iter()
    }

    /// Formatted entries, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
