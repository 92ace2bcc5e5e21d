// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles and per-route audiences.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account
    Standard,
    /// Administrative account (metrics, admin actions)
    Admin,
}

impl Default for Role {
    /// Least privilege.
    fn default() -> Self {
        Role::Standard
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Standard => write!(f, "standard"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Capability declared by a route when the guard is attached.
///
/// - `Public` - no credential required; the guard does not run
/// - `Authenticated` - any live identity that passes the environment gate
/// - `Admin` - admin role with a verified second factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RouteAudience {
    Public,
    Authenticated,
    Admin,
}

impl RouteAudience {
    pub const ALL: [RouteAudience; 3] = [
        RouteAudience::Public,
        RouteAudience::Authenticated,
        RouteAudience::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteAudience::Public => "public",
            RouteAudience::Authenticated => "authenticated",
            RouteAudience::Admin => "admin",
        }
    }

    /// Whether requests to this audience go through the guard at all.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, RouteAudience::Public)
    }
}
