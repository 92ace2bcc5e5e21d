// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route guard middleware.
//!
//! Runs the token verifier, the identity resolver and the access policy for
//! every request to a guarded router. Routers declare their audience when the
//! layer is attached:
//!
//! ```rust,ignore
//! let admin = Router::new()
//!     .route("/metrics", get(text_metrics))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         RouteGuard::new(state.clone(), RouteAudience::Admin),
//!         route_guard,
//!     ));
//! ```
//!
//! On success the resolved [`UserIdentity`] and the [`PresentedToken`] are
//! inserted into request extensions. On failure the request never reaches the
//! handler, the denial is counted and logged, and the `AuthError` response is
//! returned.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::claims::UserIdentity;
use super::error::AuthError;
use super::roles::RouteAudience;
use crate::state::AppState;

/// The raw credential a request was authenticated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedToken(pub String);

/// Extract the credential: designated cookie first, then `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Guard configuration for one router: shared state plus the declared audience.
#[derive(Clone)]
pub struct RouteGuard {
    state: AppState,
    audience: RouteAudience,
}

impl RouteGuard {
    pub fn new(state: AppState, audience: RouteAudience) -> Self {
        Self { state, audience }
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<(UserIdentity, String), AuthError> {
        let token = extract_token(headers, &self.state.config.cookie_name)
            .ok_or(AuthError::NoToken)?;
        let claims = self.state.verifier.verify(&token)?;
        let identity = self.state.resolver.resolve(&claims)?;
        Ok((identity, token))
    }

    /// Full check for a request. `Ok` only when every applicable gate passed.
    pub fn check(&self, headers: &HeaderMap) -> Result<(UserIdentity, PresentedToken), AuthError> {
        let outcome = self.authenticate(headers);
        self.state
            .policy
            .decide(outcome.as_ref().map(|(identity, _)| identity), self.audience)
            .into_result()?;
        outcome.map(|(identity, token)| (identity, PresentedToken(token)))
    }
}

/// Axum middleware entry point for [`RouteGuard`].
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    if !guard.audience.requires_credential() {
        return next.run(request).await;
    }

    match guard.check(request.headers()) {
        Ok((identity, token)) => {
            guard.state.metrics.record_allowed(guard.audience);
            tracing::debug!(
                user_id = %identity.id,
                audience = guard.audience.as_str(),
                path = %request.uri().path(),
                "Access granted"
            );
            request.extensions_mut().insert(identity);
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        Err(err) => {
            guard.state.metrics.record_denial(guard.audience, &err);
            if let AuthError::LookupUnavailable(detail) = &err {
                tracing::error!(
                    error = %detail,
                    path = %request.uri().path(),
                    "Identity lookup failed, denying request"
                );
            }
            tracing::warn!(
                reason = err.reason(),
                status = err.status_code().as_u16(),
                audience = guard.audience.as_str(),
                path = %request.uri().path(),
                "Access denied"
            );
            err.into_response()
        }
    }
}
