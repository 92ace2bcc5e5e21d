// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{route_guard, EnvironmentClass, Role, RouteAudience, RouteGuard, UserIdentity},
    metrics::{MetricsSnapshot, RequestCount},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod metrics;
pub mod session;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(session::me))
        .route("/api/auth/logout", post(session::logout))
        .route("/api/auth/refresh", post(session::refresh))
        .route("/api/auth/totp/verify", post(session::verify_totp))
        .route_layer(from_fn_with_state(
            RouteGuard::new(state.clone(), RouteAudience::Authenticated),
            route_guard,
        ));

    let admin_routes = Router::new()
        .route("/metrics", get(metrics::text_metrics))
        .route("/api/metrics", get(metrics::json_metrics))
        .route("/api/security-metrics", get(metrics::security_metrics))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{user_id}", delete(admin::delete_user))
        .route("/api/admin/tokens/revoke", post(admin::revoke_token))
        .route_layer(from_fn_with_state(
            RouteGuard::new(state.clone(), RouteAudience::Admin),
            route_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        metrics::text_metrics,
        metrics::json_metrics,
        metrics::security_metrics,
        admin::list_users,
        admin::delete_user,
        admin::revoke_token,
        session::me,
        session::logout,
        session::refresh,
        session::verify_totp
    ),
    components(
        schemas(
            UserIdentity,
            Role,
            RouteAudience,
            EnvironmentClass,
            MetricsSnapshot,
            RequestCount,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            metrics::MetricsReport,
            metrics::SecurityMetrics,
            admin::AdminUserListResponse,
            admin::RevokeTokenRequest,
            session::TokenResponse,
            session::VerifyTotpRequest
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Metrics", description = "Gate metrics (admin)"),
        (name = "Admin", description = "Admin actions"),
        (name = "Session", description = "Credential lifecycle and second factor")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
            Method, Request, StatusCode,
        },
        response::Response,
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::{totp, UserClaims};
    use crate::state::test_support::{
        empty_state, seeded_state, BrokenIdentities, TestUsers, TOTP_SECRET,
    };

    fn get_with_bearer(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn open_app() -> (Router, AppState, TestUsers) {
        let (state, users) = seeded_state(EnvironmentClass::Open);
        (router(state.clone()), state, users)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(empty_state(EnvironmentClass::Restricted));
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn metrics_without_token_is_401() {
        let (app, _, _) = open_app();
        let response = send(&app, get_with_bearer("/metrics", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Access denied. No token provided."})
        );
    }

    #[tokio::test]
    async fn metrics_with_standard_user_is_403() {
        let (app, _, users) = open_app();
        let response = send(&app, get_with_bearer("/metrics", Some(&users.standard))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await, json!({"error": "Admin access required."}));
    }

    #[tokio::test]
    async fn metrics_with_admin_lacking_totp_is_403() {
        let (app, _, users) = open_app();
        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_no_2fa))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("TOTP_REQUIRED"));
    }

    #[tokio::test]
    async fn metrics_with_verified_admin_is_200_prometheus_text() {
        let (app, _, users) = open_app();
        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_2fa))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        let body = text_body(response).await;
        assert!(body.contains("gate_requests_total"));
        assert!(body.contains(r#"gate_requests_total{audience="admin",outcome="allowed"} 1"#));
    }

    #[tokio::test]
    async fn repeated_allowed_requests_are_idempotent() {
        let (app, _, users) = open_app();
        for _ in 0..5 {
            let response = send(&app, get_with_bearer("/api/metrics", Some(&users.admin_2fa))).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn cookie_credential_is_accepted() {
        let (app, _, users) = open_app();
        let request = Request::builder()
            .uri("/api/security-metrics")
            .header(COOKIE, format!("authToken={}", users.admin_2fa))
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["environment"], "open");
    }

    #[tokio::test]
    async fn invalid_and_expired_tokens_are_401_never_403() {
        let (app, state, _) = open_app();
        let now = Utc::now().timestamp();
        let expired = state
            .codec()
            .encode(&UserClaims {
                sub: "admin_verified".into(),
                iat: now - 7200,
                exp: now - 60,
                jti: "expired".into(),
            })
            .unwrap();

        for token in ["garbage", "a.b.c", expired.as_str()] {
            let response = send(&app, get_with_bearer("/metrics", Some(token))).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(json_body(response).await, json!({"error": "Invalid token."}));
        }
    }

    #[tokio::test]
    async fn revoked_admin_token_is_401_revoked() {
        let (app, state, users) = open_app();
        let claims = state.codec().decode(&users.admin_2fa).unwrap();
        state.verifier.revoke(&users.admin_2fa, &claims).unwrap();

        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_2fa))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "Token has been revoked."}));
    }

    #[tokio::test]
    async fn identity_store_outage_denies_verified_admin_with_401() {
        let (state, users) = seeded_state(EnvironmentClass::Open);
        let state = state.with_identity_store(Arc::new(BrokenIdentities));
        let app = router(state.clone());

        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_2fa))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "Invalid token."}));
        assert_eq!(state.metrics.denials_by_reason()["lookup_unavailable"], 1);
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_401_user_not_found() {
        let (app, state, users) = open_app();
        state.identities.remove("standard_user").unwrap();

        let response = send(&app, get_with_bearer("/api/auth/me", Some(&users.standard))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "User not found."}));
    }

    #[tokio::test]
    async fn restricted_environment_blocks_standard_users() {
        let (state, users) = seeded_state(EnvironmentClass::Restricted);
        let app = router(state);

        let response = send(&app, get_with_bearer("/api/auth/me", Some(&users.standard))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await,
            json!({
                "error": "This is a staging environment - admin access required.",
                "environment": "staging"
            })
        );

        let response = send(&app, get_with_bearer("/api/auth/me", Some(&users.admin_no_2fa))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], "admin_pending");
    }

    #[tokio::test]
    async fn restricted_environment_admin_route_still_needs_totp() {
        let (state, users) = seeded_state(EnvironmentClass::Restricted);
        let app = router(state);

        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_no_2fa))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(json_body(response).await["error"]
            .as_str()
            .unwrap()
            .starts_with("TOTP_REQUIRED"));

        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_2fa))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_routes_skip_the_guard() {
        let (state, _) = seeded_state(EnvironmentClass::Restricted);
        let app = router(state);
        let response = send(&app, get_with_bearer("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["environment"], "restricted");
    }

    #[tokio::test]
    async fn denials_are_counted() {
        let (app, state, users) = open_app();
        send(&app, get_with_bearer("/metrics", None)).await;
        send(&app, get_with_bearer("/metrics", Some(&users.standard))).await;
        send(&app, get_with_bearer("/metrics", Some(&users.standard))).await;

        let counts = state.metrics.denials_by_reason();
        assert_eq!(counts["no_token"], 1);
        assert_eq!(counts["not_admin"], 2);

        let response = send(
            &app,
            get_with_bearer("/api/security-metrics", Some(&users.admin_2fa)),
        )
        .await;
        let body = json_body(response).await;
        assert_eq!(body["denials_total"], 3);
        assert_eq!(body["authorization_failures"], 2);
    }

    #[tokio::test]
    async fn logout_revokes_the_presented_token() {
        let (app, state, users) = open_app();
        let response = send(&app, post_json("/api/auth/logout", &users.standard, json!({}))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.metrics.revocations_total(), 1);

        let response = send(&app, get_with_bearer("/api/auth/me", Some(&users.standard))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Token has been revoked.");
    }

    #[tokio::test]
    async fn logout_clears_the_second_factor() {
        let (app, state, users) = open_app();
        let response = send(&app, post_json("/api/auth/logout", &users.admin_2fa, json!({}))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (next_session, _) = state.codec().issue("admin_verified").unwrap();
        let response = send(&app, get_with_bearer("/metrics", Some(&next_session))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(json_body(response).await["error"]
            .as_str()
            .unwrap()
            .starts_with("TOTP_REQUIRED"));
    }

    #[tokio::test]
    async fn refresh_rotates_the_credential() {
        let (app, _, users) = open_app();
        let response = send(&app, post_json("/api/auth/refresh", &users.standard, json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fresh = json_body(response).await["token"].as_str().unwrap().to_string();
        assert_ne!(fresh, users.standard);

        let old = send(&app, get_with_bearer("/api/auth/me", Some(&users.standard))).await;
        assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
        let new = send(&app, get_with_bearer("/api/auth/me", Some(&fresh))).await;
        assert_eq!(new.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn totp_verification_unlocks_admin_routes() {
        let (app, _, users) = open_app();
        let bad = send(
            &app,
            post_json("/api/auth/totp/verify", &users.admin_no_2fa, json!({"code": "000000x"})),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let code = totp::generate(TOTP_SECRET, Utc::now().timestamp()).unwrap();
        let response = send(
            &app,
            post_json("/api/auth/totp/verify", &users.admin_no_2fa, json!({ "code": code })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["second_factor_verified"], true);

        let response = send(&app, get_with_bearer("/metrics", Some(&users.admin_no_2fa))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_can_delete_users_and_revoke_tokens() {
        let (app, _, users) = open_app();

        let response = send(
            &app,
            post_json(
                "/api/admin/tokens/revoke",
                &users.admin_2fa,
                json!({ "token": users.admin_no_2fa }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, get_with_bearer("/api/auth/me", Some(&users.admin_no_2fa))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            post_json("/api/admin/tokens/revoke", &users.admin_2fa, json!({ "token": "junk" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/api/admin/users/standard_user")
            .header(AUTHORIZATION, format!("Bearer {}", users.admin_2fa))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, delete).await.status(), StatusCode::NO_CONTENT);

        let response = send(&app, get_with_bearer("/api/admin/users", Some(&users.admin_2fa))).await;
        let body = json_body(response).await;
        assert_eq!(body["total"], 2);

        let response = send(&app, get_with_bearer("/api/auth/me", Some(&users.standard))).await;
        assert_eq!(json_body(response).await["error"], "User not found.");
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_404() {
        let (app, _, users) = open_app();
        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/api/admin/users/nobody")
            .header(AUTHORIZATION, format!("Bearer {}", users.admin_2fa))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, delete).await.status(), StatusCode::NOT_FOUND);
    }
}
