// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.
//!
//! Every failure of the gate is a per-request denial. The response body is
//! always `{"error": "..."}`; the restricted-environment denial also names
//! the environment.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Label reported for restricted deployments in denial bodies.
pub const RESTRICTED_ENVIRONMENT_LABEL: &str = "staging";

/// Gate failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential in the cookie or the Authorization header
    NoToken,
    /// Malformed token or signature mismatch
    InvalidToken,
    /// Token is past its `exp`
    ExpiredToken,
    /// Token hash is present in the revocation set
    RevokedToken,
    /// Token subject no longer exists in the identity store
    UserNotFound,
    /// Admin route, non-admin identity
    NotAdmin,
    /// Admin identity without a verified second factor
    SecondFactorRequired,
    /// Restricted deployment, non-admin identity
    RestrictedEnvironment,
    /// A backing store could not answer; treated as an authentication failure
    LookupUnavailable(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<&'static str>,
}

impl AuthError {
    /// Every reason code, in gate order. Used to pre-register metric series.
    pub const REASONS: [&'static str; 9] = [
        "no_token",
        "invalid_token",
        "expired_token",
        "revoked_token",
        "user_not_found",
        "lookup_unavailable",
        "restricted_environment",
        "not_admin",
        "second_factor_required",
    ];

    /// Stable reason code for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NoToken => "no_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::RevokedToken => "revoked_token",
            AuthError::UserNotFound => "user_not_found",
            AuthError::LookupUnavailable(_) => "lookup_unavailable",
            AuthError::RestrictedEnvironment => "restricted_environment",
            AuthError::NotAdmin => "not_admin",
            AuthError::SecondFactorRequired => "second_factor_required",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::RevokedToken
            | AuthError::UserNotFound
            | AuthError::LookupUnavailable(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotAdmin
            | AuthError::SecondFactorRequired
            | AuthError::RestrictedEnvironment => StatusCode::FORBIDDEN,
        }
    }

    /// Whether this is an authentication (401) rather than authorization failure.
    pub fn is_authentication(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }

    /// Client-facing message.
    ///
    /// Expired tokens and store outages share the invalid-token message so
    /// the body does not reveal more than the status already does.
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::NoToken => "Access denied. No token provided.",
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::LookupUnavailable(_) => {
                "Invalid token."
            }
            AuthError::RevokedToken => "Token has been revoked.",
            AuthError::UserNotFound => "User not found.",
            AuthError::NotAdmin => "Admin access required.",
            AuthError::SecondFactorRequired => {
                "TOTP_REQUIRED: Two-factor authentication required for admin access."
            }
            AuthError::RestrictedEnvironment => {
                "This is a staging environment - admin access required."
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::LookupUnavailable(msg) => write!(f, "Identity lookup unavailable: {msg}"),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let environment = match self {
            AuthError::RestrictedEnvironment => Some(RESTRICTED_ENVIRONMENT_LABEL),
            _ => None,
        };
        let body = Json(AuthErrorBody {
            error: self.message(),
            environment,
        });
        (self.status_code(), body).into_response()
    }
}

/// Failure of a backing store (revocation set or identity store).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::LookupUnavailable(err.to_string())
    }
}
