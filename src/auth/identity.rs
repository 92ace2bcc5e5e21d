// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity store and resolver.
//!
//! A valid token only proves who the caller was at issuance. The resolver
//! re-reads the account on every request so deleted users are rejected even
//! while their tokens are still unexpired.

use std::sync::Arc;

use dashmap::DashMap;

use super::claims::{UserClaims, UserIdentity};
use super::error::{AuthError, StoreError};

/// Read/write access to user records.
pub trait IdentityStore: Send + Sync {
    fn find(&self, user_id: &str) -> Result<Option<UserIdentity>, StoreError>;

    /// All identities, ordered by ID.
    fn list(&self) -> Result<Vec<UserIdentity>, StoreError>;

    /// Insert or replace a user; `totp_secret` enrolls the user for TOTP.
    fn upsert(&self, identity: UserIdentity, totp_secret: Option<Vec<u8>>)
        -> Result<(), StoreError>;

    /// Delete a user. Returns `false` if no such user existed.
    fn remove(&self, user_id: &str) -> Result<bool, StoreError>;

    fn totp_secret(&self, user_id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Record the outcome of a second-factor check. Returns the updated identity.
    fn set_second_factor(
        &self,
        user_id: &str,
        verified: bool,
    ) -> Result<Option<UserIdentity>, StoreError>;
}

struct UserRecord {
    identity: UserIdentity,
    totp_secret: Option<Vec<u8>>,
}

/// In-process identity store.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: DashMap<String, UserRecord>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn find(&self, user_id: &str) -> Result<Option<UserIdentity>, StoreError> {
        Ok(self.users.get(user_id).map(|r| r.identity.clone()))
    }

    fn list(&self) -> Result<Vec<UserIdentity>, StoreError> {
        let mut users: Vec<UserIdentity> =
            self.users.iter().map(|r| r.identity.clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    fn upsert(
        &self,
        identity: UserIdentity,
        totp_secret: Option<Vec<u8>>,
    ) -> Result<(), StoreError> {
        self.users.insert(
            identity.id.clone(),
            UserRecord {
                identity,
                totp_secret,
            },
        );
        Ok(())
    }

    fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.users.remove(user_id).is_some())
    }

    fn totp_secret(&self, user_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .users
            .get(user_id)
            .and_then(|r| r.totp_secret.clone()))
    }

    fn set_second_factor(
        &self,
        user_id: &str,
        verified: bool,
    ) -> Result<Option<UserIdentity>, StoreError> {
        Ok(self.users.get_mut(user_id).map(|mut r| {
            r.identity.second_factor_verified = verified;
            r.identity.clone()
        }))
    }
}

/// Maps verified claims to a live user record.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Resolve the token subject. A store failure is a denial, not a pass.
    pub fn resolve(&self, claims: &UserClaims) -> Result<UserIdentity, AuthError> {
        self.store
            .find(&claims.sub)?
            .ok_or(AuthError::UserNotFound)
    }
}
