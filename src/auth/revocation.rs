// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Revoked-credential set.
//!
//! Tokens are never stored in clear: an entry is the SHA-256 hex digest of
//! the raw token plus the last second at which the verifier could still
//! accept it (`exp + leeway`). Entries are written once and dropped by
//! [`RevocationStore::prune_expired`] only once that second has passed.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use super::error::StoreError;

/// Stable content hash of a raw token.
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A revoked credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub token_hash: String,
    /// Last Unix second the token can still pass expiry validation
    pub retain_until: i64,
    pub revoked_at: DateTime<Utc>,
}

/// Lookup capability over the revocation set.
///
/// Implementations must make a completed `revoke` visible to every
/// subsequent `is_revoked` call, from any thread.
pub trait RevocationStore: Send + Sync {
    /// Membership check by token hash.
    fn is_revoked(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Add an entry kept through `retain_until`. Returns `false` if the hash
    /// was already revoked.
    fn revoke(&self, token_hash: String, retain_until: i64) -> Result<bool, StoreError>;

    /// Drop entries whose `retain_until` is strictly before `now`. Returns the
    /// count removed.
    fn prune_expired(&self, now: i64) -> Result<usize, StoreError>;

    /// Number of entries currently held.
    fn len(&self) -> Result<usize, StoreError>;
}

/// In-process revocation set backed by a sharded concurrent map.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: DashMap<String, RevocationEntry>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, token_hash: &str) -> Option<RevocationEntry> {
        self.entries.get(token_hash).map(|e| e.value().clone())
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn is_revoked(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(token_hash))
    }

    fn revoke(&self, token_hash: String, retain_until: i64) -> Result<bool, StoreError> {
        let mut inserted = false;
        self.entries.entry(token_hash.clone()).or_insert_with(|| {
            inserted = true;
            RevocationEntry {
                token_hash,
                retain_until,
                revoked_at: Utc::now(),
            }
        });
        Ok(inserted)
    }

    fn prune_expired(&self, now: i64) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.retain_until >= now);
        Ok(before.saturating_sub(self.entries.len()))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}
