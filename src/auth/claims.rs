// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the resolved user identity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried by a gate credential.
///
/// Role and second-factor state are not carried here; they are read from
/// the identity store on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

/// A live user record, as resolved from the identity store.
///
/// Attached to request extensions once the guard allows a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserIdentity {
    /// Canonical user ID (token `sub`)
    pub id: String,
    /// User's role
    pub role: Role,
    /// Whether the user has passed TOTP verification
    pub second_factor_verified: bool,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            second_factor_verified: false,
        }
    }

    pub fn with_second_factor(mut self, verified: bool) -> Self {
        self.second_factor_verified = verified;
        self
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
