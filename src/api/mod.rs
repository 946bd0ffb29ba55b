// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::authenticate_request,
    error::ApiError,
    models::{MessageResponse, UserResponse},
    state::AppState,
};

pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/me", get(users::current_user))
        .route("/logout", post(users::logout))
        .route_layer(from_fn_with_state(state.clone(), authenticate_request));

    Router::new()
        .nest("/api/auth", auth_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .fallback(not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Registers the `bearer` scheme referenced by the auth endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Supabase access token"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        users::current_user,
        users::logout,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            UserResponse,
            MessageResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Current user and session"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{claims_for, mint_token, TEST_SECRET};
    use crate::auth::{JwtSecret, VerifierConfig};
    use crate::storage::UserStore;
    use axum::{
        body::Body,
        http::{header::WWW_AUTHENTICATE, Method, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::in_memory(VerifierConfig::new(JwtSecret::new(TEST_SECRET)))
    }

    async fn send(app: Router, method: Method, uri: &str, token: Option<&str>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn me_returns_synced_user() {
        let state = test_state();
        let token = mint_token(&claims_for("abc123", "a@x.com", Some("Ann")), TEST_SECRET);

        let response = send(router(state.clone()), Method::GET, "/api/auth/me", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["name"], "Ann");
        assert!(body.get("external_id").is_none());
        assert_eq!(state.users.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn me_twice_keeps_one_user() {
        let state = test_state();
        let token = mint_token(&claims_for("abc123", "a@x.com", Some("Ann")), TEST_SECRET);

        let first = body_json(send(router(state.clone()), Method::GET, "/api/auth/me", Some(&token)).await).await;
        let second = body_json(send(router(state.clone()), Method::GET, "/api/auth/me", Some(&token)).await).await;

        assert_eq!(first["id"], second["id"]);
        assert_eq!(state.users.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn me_requires_credentials() {
        let response = send(router(test_state()), Method::GET, "/api/auth/me", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "not_authenticated");
    }

    #[tokio::test]
    async fn unconfigured_secret_is_a_server_error() {
        let state = AppState::in_memory(VerifierConfig::new(None));
        let token = mint_token(&claims_for("abc123", "a@x.com", None), TEST_SECRET);

        let response = send(router(state), Method::GET, "/api/auth/me", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error_code"], "config_error");
    }

    #[tokio::test]
    async fn logout_acknowledges() {
        let token = mint_token(&claims_for("abc123", "a@x.com", None), TEST_SECRET);

        let response = send(router(test_state()), Method::POST, "/api/auth/logout", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Successfully logged out");
    }

    #[tokio::test]
    async fn logout_requires_credentials() {
        let response = send(router(test_state()), Method::POST, "/api/auth/logout", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_routes_respond() {
        let response = send(router(test_state()), Method::GET, "/health/live", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(router(test_state()), Method::GET, "/health/ready", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["checks"]["storage"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = send(router(test_state()), Method::GET, "/api/emissions", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }

    #[test]
    fn openapi_documents_bearer_scheme() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/api/auth/me"]["get"].is_object());
        assert!(doc["paths"]["/api/auth/logout"]["post"].is_object());
        assert_eq!(doc["components"]["securitySchemes"]["bearer"]["scheme"], "bearer");
    }
}
