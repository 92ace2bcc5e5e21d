// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! Mounted behind the guard with the admin audience, so every handler here
//! runs for an admin with a verified second factor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::{Authenticated, UserIdentity},
    error::ApiError,
    state::AppState,
};

/// Response for admin user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserListResponse {
    pub users: Vec<UserIdentity>,
    pub total: usize,
}

/// Request to revoke an arbitrary credential.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeTokenRequest {
    pub token: String,
}

/// List all identities.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users", body = AdminUserListResponse),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Admin with verified second factor required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<AdminUserListResponse>, ApiError> {
    let users = state.identities.list()?;
    Ok(Json(AdminUserListResponse {
        total: users.len(),
        users,
    }))
}

/// Delete a user. Outstanding tokens for the user stop resolving immediately.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    tag = "Admin",
    params(("user_id" = String, Path, description = "User to delete")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "No such user"),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Admin with verified second factor required")
    )
)]
pub async fn delete_user(
    Authenticated(admin): Authenticated,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.identities.remove(&user_id)? {
        return Err(ApiError::not_found("User not found."));
    }
    info!(admin_id = %admin.id, user_id = %user_id, "Admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

/// Revoke a credential until its natural expiry.
#[utoipa::path(
    post,
    path = "/api/admin/tokens/revoke",
    tag = "Admin",
    request_body = RevokeTokenRequest,
    responses(
        (status = 204, description = "Token revoked"),
        (status = 400, description = "Token is not a credential issued by this service"),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Admin with verified second factor required")
    )
)]
pub async fn revoke_token(
    Authenticated(admin): Authenticated,
    State(state): State<AppState>,
    Json(request): Json<RevokeTokenRequest>,
) -> Result<StatusCode, ApiError> {
    let token = request.token.trim();
    let claims = state
        .codec()
        .decode_ignoring_expiry(token)
        .map_err(|_| ApiError::bad_request("Invalid token."))?;

    if state.verifier.revoke(token, &claims)? {
        state.metrics.record_revocation();
    }
    info!(admin_id = %admin.id, subject = %claims.sub, "Admin revoked token");
    Ok(StatusCode::NO_CONTENT)
}
