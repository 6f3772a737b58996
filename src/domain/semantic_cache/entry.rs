//! Cache entries and their identifiers

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Fingerprint;

/// Store-generated entry identifier.
///
/// Identifiers are opaque to callers and never reused within a process, so a
/// stale index reference can never resolve to an unrelated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sem:{}", self.0)
    }
}

/// An entry waiting for the store to assign it an id
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub fingerprint: Fingerprint,
    pub response: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub ttl: Option<Duration>,
}

/// A cached (fingerprint, response) pair.
///
/// Entries are immutable once stored: a later store of the same query creates
/// a new entry rather than overwriting this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    id: EntryId,
    fingerprint: Fingerprint,
    response: String,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    ttl: Option<Duration>,
}

impl Entry {
    /// Materialize a pending entry under the given id
    pub fn from_new(id: EntryId, new: NewEntry) -> Self {
        Self {
            id,
            fingerprint: new.fingerprint,
            response: new.response,
            metadata: new.metadata,
            created_at: new.created_at,
            ttl: new.ttl,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Get the stored prompt text
    pub fn prompt(&self) -> &str {
        self.fingerprint.source_text()
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// When the entry stops being servable, if it expires at all
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.ttl?).unwrap_or(chrono::Duration::MAX);

        Some(
            self.created_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// An entry is expired once strictly more than its TTL has elapsed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}
