// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gate counters.
//!
//! A private `prometheus::Registry` holds:
//!
//! - `gate_requests_total{audience, outcome}`
//! - `gate_denials_total{reason}`
//! - `gate_denial_classes_total{class}` (`authentication` = 401, `authorization` = 403)
//! - `gate_revocations_total`
//!
//! Every label combination is registered up front so the text exposition
//! always lists each series, including zero ones.

use std::collections::BTreeMap;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AuthError, RouteAudience};

const OUTCOMES: [&str; 2] = ["allowed", "denied"];
const AUTHENTICATION: &str = "authentication";
const AUTHORIZATION: &str = "authorization";

/// Request count for one audience/outcome pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RequestCount {
    pub audience: String,
    pub outcome: String,
    pub count: u64,
}

/// Point-in-time copy of every gate counter.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub requests: Vec<RequestCount>,
    pub denials_by_reason: BTreeMap<String, u64>,
    pub denials_total: u64,
    pub revocations_total: u64,
}

pub struct GateMetrics {
    registry: Registry,
    requests: IntCounterVec,
    denials: IntCounterVec,
    denial_classes: IntCounterVec,
    revocations: IntCounter,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("gate_requests_total", "Guarded requests by audience and outcome"),
            &["audience", "outcome"],
        )?;
        let denials = IntCounterVec::new(
            Opts::new("gate_denials_total", "Denied requests by reason"),
            &["reason"],
        )?;
        let denial_classes = IntCounterVec::new(
            Opts::new(
                "gate_denial_classes_total",
                "Denied requests by class (authentication 401, authorization 403)",
            ),
            &["class"],
        )?;
        let revocations = IntCounter::new(
            "gate_revocations_total",
            "Credentials added to the revocation set",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(denials.clone()))?;
        registry.register(Box::new(denial_classes.clone()))?;
        registry.register(Box::new(revocations.clone()))?;

        for audience in RouteAudience::ALL {
            if !audience.requires_credential() {
                continue;
            }
            for outcome in OUTCOMES {
                requests.with_label_values(&[audience.as_str(), outcome]);
            }
        }
        for reason in AuthError::REASONS {
            denials.with_label_values(&[reason]);
        }
        for class in [AUTHENTICATION, AUTHORIZATION] {
            denial_classes.with_label_values(&[class]);
        }

        Ok(Self {
            registry,
            requests,
            denials,
            denial_classes,
            revocations,
        })
    }

    pub fn record_allowed(&self, audience: RouteAudience) {
        self.requests
            .with_label_values(&[audience.as_str(), "allowed"])
            .inc();
    }

    pub fn record_denial(&self, audience: RouteAudience, err: &AuthError) {
        self.requests
            .with_label_values(&[audience.as_str(), "denied"])
            .inc();
        self.denials.with_label_values(&[err.reason()]).inc();
        let class = if err.is_authentication() {
            AUTHENTICATION
        } else {
            AUTHORIZATION
        };
        self.denial_classes.with_label_values(&[class]).inc();
    }

    pub fn record_revocation(&self) {
        self.revocations.inc();
    }

    /// Prometheus text exposition of the registry.
    pub fn render_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Content type of [`render_text`](Self::render_text).
    pub fn text_content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    pub fn denials_by_reason(&self) -> BTreeMap<String, u64> {
        AuthError::REASONS
            .iter()
            .map(|reason| {
                (
                    reason.to_string(),
                    self.denials.with_label_values(&[*reason]).get(),
                )
            })
            .collect()
    }

    /// Denials answered with 401.
    pub fn authentication_failures(&self) -> u64 {
        self.denial_classes.with_label_values(&[AUTHENTICATION]).get()
    }

    /// Denials answered with 403.
    pub fn authorization_failures(&self) -> u64 {
        self.denial_classes.with_label_values(&[AUTHORIZATION]).get()
    }

    pub fn revocations_total(&self) -> u64 {
        self.revocations.get()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut requests = Vec::new();
        for audience in RouteAudience::ALL {
            if !audience.requires_credential() {
                continue;
            }
            for outcome in OUTCOMES {
                requests.push(RequestCount {
                    audience: audience.as_str().to_string(),
                    outcome: outcome.to_string(),
                    count: self
                        .requests
                        .with_label_values(&[audience.as_str(), outcome])
                        .get(),
                });
            }
        }
        let denials_by_reason = self.denials_by_reason();
        let denials_total = denials_by_reason.values().sum();

        MetricsSnapshot {
            requests,
            denials_by_reason,
            denials_total,
            revocations_total: self.revocations_total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_are_counted_by_reason() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_denial(RouteAudience::Admin, &AuthError::NotAdmin);
        metrics.record_denial(RouteAudience::Admin, &AuthError::NotAdmin);
        metrics.record_denial(RouteAudience::Authenticated, &AuthError::NoToken);
        metrics.record_allowed(RouteAudience::Admin);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.denials_by_reason["not_admin"], 2);
        assert_eq!(snapshot.denials_by_reason["no_token"], 1);
        assert_eq!(snapshot.denials_by_reason["revoked_token"], 0);
        assert_eq!(snapshot.denials_total, 3);

        let admin_allowed = snapshot
            .requests
            .iter()
            .find(|r| r.audience == "admin" && r.outcome == "allowed")
            .unwrap();
        assert_eq!(admin_allowed.count, 1);
    }

    #[test]
    fn denial_class_follows_status_code() {
        let metrics = GateMetrics::new().unwrap();
        let all = [
            AuthError::NoToken,
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
            AuthError::RevokedToken,
            AuthError::UserNotFound,
            AuthError::LookupUnavailable(String::new()),
            AuthError::RestrictedEnvironment,
            AuthError::NotAdmin,
            AuthError::SecondFactorRequired,
        ];
        let unauthorized = all
            .iter()
            .filter(|e| e.status_code() == axum::http::StatusCode::UNAUTHORIZED)
            .count() as u64;
        for err in &all {
            metrics.record_denial(RouteAudience::Admin, err);
        }
        assert_eq!(metrics.authentication_failures(), unauthorized);
        assert_eq!(metrics.authorization_failures(), all.len() as u64 - unauthorized);
        assert_eq!(metrics.authorization_failures(), 3);
    }

    #[test]
    fn text_exposition_lists_all_series() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_revocation();
        let text = metrics.render_text().unwrap();
        assert!(text.contains("# TYPE gate_denials_total counter"));
        assert!(text.contains(r#"gate_denials_total{reason="second_factor_required"} 0"#));
        assert!(text.contains("gate_revocations_total 1"));
        assert!(text.contains(r#"gate_denial_classes_total{class="authorization"} 0"#));
        assert!(!text.contains(r#"audience="public""#));
        assert!(metrics.text_content_type().starts_with("text/plain"));
    }
}
