// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints for authenticated callers: identity, logout, token
//! rotation and TOTP verification.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    auth::{totp, AuthError, Authenticated, CurrentToken, UserIdentity},
    error::ApiError,
    state::AppState,
};

/// Freshly issued credential.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyTotpRequest {
    /// Six-digit code from the authenticator app
    pub code: String,
}

/// The caller's resolved identity.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Session",
    responses(
        (status = 200, description = "Current identity", body = UserIdentity),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Staging environment, admin required")
    )
)]
pub async fn me(Authenticated(user): Authenticated) -> Json<UserIdentity> {
    Json(user)
}

/// Revoke the credential used for this request and clear the second factor.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Session",
    responses(
        (status = 204, description = "Credential revoked, second factor cleared"),
        (status = 401, description = "Missing, invalid or revoked credential")
    )
)]
pub async fn logout(
    Authenticated(user): Authenticated,
    CurrentToken(token): CurrentToken,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let claims = state.codec().decode(&token)?;
    if state.verifier.revoke(&token, &claims)? {
        state.metrics.record_revocation();
    }
    if user.second_factor_verified {
        state.identities.set_second_factor(&user.id, false)?;
    }
    info!(user_id = %user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Rotate the credential: revoke the current one and issue a replacement.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Session",
    responses(
        (status = 200, description = "New credential", body = TokenResponse),
        (status = 401, description = "Missing, invalid or revoked credential")
    )
)]
pub async fn refresh(
    Authenticated(user): Authenticated,
    CurrentToken(token): CurrentToken,
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = state.codec().decode(&token)?;
    let (fresh, fresh_claims) = state.codec().issue(&user.id)?;
    if state.verifier.revoke(&token, &claims)? {
        state.metrics.record_revocation();
    }
    info!(user_id = %user.id, "Credential rotated");
    Ok(Json(TokenResponse {
        token: fresh,
        expires_at: fresh_claims.exp,
    }))
}

/// Verify a TOTP code and mark the caller's second factor as verified.
#[utoipa::path(
    post,
    path = "/api/auth/totp/verify",
    tag = "Session",
    request_body = VerifyTotpRequest,
    responses(
        (status = 200, description = "Second factor verified", body = UserIdentity),
        (status = 400, description = "Wrong code or TOTP not enrolled"),
        (status = 401, description = "Missing, invalid or revoked credential")
    )
)]
pub async fn verify_totp(
    Authenticated(user): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<VerifyTotpRequest>,
) -> Result<Json<UserIdentity>, ApiError> {
    let secret = state
        .identities
        .totp_secret(&user.id)?
        .ok_or_else(|| ApiError::bad_request("Two-factor authentication is not enabled."))?;

    if !totp::verify(&secret, &request.code, Utc::now().timestamp()) {
        warn!(user_id = %user.id, "TOTP verification failed");
        return Err(ApiError::bad_request("Invalid verification code."));
    }

    let updated = state
        .identities
        .set_second_factor(&user.id, true)?
        .ok_or_else(|| ApiError::from(AuthError::UserNotFound))?;
    info!(user_id = %user.id, "Second factor verified");
    Ok(Json(updated))
}
