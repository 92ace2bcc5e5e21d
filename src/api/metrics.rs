// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Metrics endpoints (admin audience).
//!
//! - `/metrics` - Prometheus text exposition
//! - `/api/metrics` - the same counters as JSON, plus process info
//! - `/api/security-metrics` - denial and revocation subset

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::EnvironmentClass,
    error::ApiError,
    metrics::MetricsSnapshot,
    state::AppState,
};

/// JSON metrics payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsReport {
    /// RFC 3339 timestamp of the snapshot.
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub environment: EnvironmentClass,
    pub gate: MetricsSnapshot,
    /// Entries currently held in the revocation set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_revocations: Option<usize>,
}

/// Security-relevant subset of the gate counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct SecurityMetrics {
    pub timestamp: String,
    pub environment: EnvironmentClass,
    pub denials_total: u64,
    pub denials_by_reason: BTreeMap<String, u64>,
    /// Denials with status 401.
    pub authentication_failures: u64,
    /// Denials with status 403.
    pub authorization_failures: u64,
    pub revocations_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_revocations: Option<usize>,
}

/// Prometheus text metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Metrics",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String, content_type = "text/plain"),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Admin with verified second factor required")
    )
)]
pub async fn text_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.metrics.render_text().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode metrics");
        ApiError::internal("Failed to encode metrics.")
    })?;
    Ok(([(CONTENT_TYPE, state.metrics.text_content_type())], body).into_response())
}

/// JSON metrics.
#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "Metrics",
    responses(
        (status = 200, description = "Gate metrics", body = MetricsReport),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Admin with verified second factor required")
    )
)]
pub async fn json_metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(MetricsReport {
        timestamp: Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        environment: state.policy.environment(),
        gate: state.metrics.snapshot(),
        active_revocations: state.revocations.len().ok(),
    })
}

/// Security metrics subset.
#[utoipa::path(
    get,
    path = "/api/security-metrics",
    tag = "Metrics",
    responses(
        (status = 200, description = "Denial and revocation counters", body = SecurityMetrics),
        (status = 401, description = "Missing, invalid or revoked credential"),
        (status = 403, description = "Admin with verified second factor required")
    )
)]
pub async fn security_metrics(State(state): State<AppState>) -> Json<SecurityMetrics> {
    let authentication_failures = state.metrics.authentication_failures();
    let authorization_failures = state.metrics.authorization_failures();

    Json(SecurityMetrics {
        timestamp: Utc::now().to_rfc3339(),
        environment: state.policy.environment(),
        denials_total: authentication_failures + authorization_failures,
        denials_by_reason: state.metrics.denials_by_reason(),
        authentication_failures,
        authorization_failures,
        revocations_total: state.metrics.revocations_total(),
        active_revocations: state.revocations.len().ok(),
    })
}
