// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for guarded handlers.
//!
//! Both extractors read what [`route_guard`](super::guard::route_guard)
//! attached to the request. A handler mounted without the guard gets a
//! `NoToken` rejection rather than an unauthenticated pass.
//!
//! ```rust,ignore
//! async fn me(Authenticated(user): Authenticated) -> Json<UserIdentity> {
//!     Json(user)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::UserIdentity;
use super::error::AuthError;
use super::guard::PresentedToken;

/// The identity the guard resolved for this request.
pub struct Authenticated(pub UserIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserIdentity>()
            .cloned()
            .map(Authenticated)
            .ok_or(AuthError::NoToken)
    }
}

/// The raw token the guard authenticated this request with.
pub struct CurrentToken(pub String);

impl<S> FromRequestParts<S> for CurrentToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PresentedToken>()
            .map(|t| CurrentToken(t.0.clone()))
            .ok_or(AuthError::NoToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::http::Request;

    fn empty_parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn authenticated_requires_guard_output() {
        let mut parts = empty_parts();
        let result = Authenticated::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::NoToken)));
    }

    #[tokio::test]
    async fn authenticated_reads_extensions() {
        let mut parts = empty_parts();
        parts
            .extensions
            .insert(UserIdentity::new("user_from_guard", Role::Standard));

        let Authenticated(user) = Authenticated::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user.id, "user_from_guard");
    }

    #[tokio::test]
    async fn current_token_reads_extensions() {
        let mut parts = empty_parts();
        assert!(CurrentToken::from_request_parts(&mut parts, &()).await.is_err());

        parts.extensions.insert(PresentedToken("abc".into()));
        let CurrentToken(token) = CurrentToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token, "abc");
    }
}
