// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access policy engine.
//!
//! ## Gates
//!
//! Evaluated in order; the first failing gate decides the response.
//!
//! 1. **Authentication** - any upstream verifier/resolver failure (401)
//! 2. **Environment** - restricted deployments admit admins only (403)
//! 3. **Role / second factor** - admin routes need `role = admin` and a
//!    verified TOTP (403)
//!
//! On admin routes in a restricted deployment both gate 2 and gate 3 apply:
//! a non-admin receives the environment denial, an admin still needs the
//! second factor.

use axum::http::StatusCode;

use super::claims::UserIdentity;
use super::environment::EnvironmentClass;
use super::error::AuthError;
use super::roles::RouteAudience;

/// Outcome of a single policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allow: bool,
    pub status: StatusCode,
    /// The failing gate, when denied.
    pub denial: Option<AuthError>,
}

impl AccessDecision {
    fn allow() -> Self {
        Self {
            allow: true,
            status: StatusCode::OK,
            denial: None,
        }
    }

    fn deny(err: AuthError) -> Self {
        Self {
            allow: false,
            status: err.status_code(),
            denial: Some(err),
        }
    }

    /// Short human-readable reason.
    pub fn reason(&self) -> &'static str {
        match &self.denial {
            Some(err) => err.reason(),
            None => "allowed",
        }
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self.denial {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Policy engine bound to a deployment's environment class.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    environment: EnvironmentClass,
}

impl AccessPolicy {
    pub fn new(environment: EnvironmentClass) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> EnvironmentClass {
        self.environment
    }

    /// Decide access for an identity-resolution outcome on a route.
    pub fn decide(
        &self,
        identity: Result<&UserIdentity, &AuthError>,
        audience: RouteAudience,
    ) -> AccessDecision {
        let identity = match identity {
            Ok(identity) => identity,
            Err(err) => return AccessDecision::deny(err.clone()),
        };

        if self.environment.is_restricted() && !identity.is_admin() {
            return AccessDecision::deny(AuthError::RestrictedEnvironment);
        }

        if audience == RouteAudience::Admin {
            if !identity.is_admin() {
                return AccessDecision::deny(AuthError::NotAdmin);
            }
            if !identity.second_factor_verified {
                return AccessDecision::deny(AuthError::SecondFactorRequired);
            }
        }

        AccessDecision::allow()
    }
}
