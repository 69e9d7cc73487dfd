// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{token_gate, KeySource, TokenGate},
    error::ApiError,
    state::AppState,
};

pub mod docs;
pub mod meta;

pub use docs::ApiDoc;

/// Build the HTTP application.
///
/// Every route, including the 404 fallback, sits behind the token gate.
/// Only allow-listed paths reach their handler without a verified token.
/// CORS preflights are answered by the outer `CorsLayer` and never reach
/// the gate or a handler.
pub fn router<S: KeySource>(state: AppState, gate: Arc<TokenGate<S>>) -> Router {
    let meta_routes = Router::new()
        .route("/health", get(meta::health))
        .route("/live", get(meta::liveness))
        .route("/version", get(meta::version))
        .route("/info", get(meta::info));

    Router::new()
        .nest("/api/meta", meta_routes)
        .route(docs::DOCS_PATH, get(docs::swagger_ui))
        .route(docs::OPENAPI_PATH, get(docs::openapi_json))
        .fallback(|| async { ApiError::not_found("Not found") })
        .with_state(state)
        .layer(from_fn_with_state(gate, token_gate::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{
        mint, primary_record, rotated_record, valid_claims, ScriptedKeys, AUDIENCE, FOREIGN_PEM,
        ISSUER, PRIMARY_KID, PRIMARY_PEM, ROTATED_KID,
    };
    use crate::auth::{GateConfig, MountedServers};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app_with(script: Vec<Vec<crate::auth::KeyRecord>>, mounted: MountedServers) -> Router {
        let config = GateConfig::new("http://unused.invalid/jwks.json")
            .with_audience(AUDIENCE)
            .with_issuer(ISSUER);
        let gate = TokenGate::with_source(ScriptedKeys::new(script), &config, mounted.clone())
            .await
            .unwrap();
        let state = AppState {
            mounted_servers: mounted,
            ..AppState::default()
        };
        router(state, Arc::new(gate))
    }

    async fn app() -> Router {
        app_with(vec![vec![primary_record()]], MountedServers::new()).await
    }

    async fn send(app: Router, method: Method, uri: &str, auth: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn primary_token() -> String {
        format!(
            "Bearer {}",
            mint(PRIMARY_KID, PRIMARY_PEM, &valid_claims("user-1"))
        )
    }

    #[tokio::test]
    async fn docs_and_openapi_are_public() {
        let response = send(app().await, Method::GET, "/docs", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(app().await, Method::GET, "/openapi.json", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/api/meta/health"].is_object());
    }

    #[tokio::test]
    async fn exempt_paths_without_handlers_fall_through_to_404() {
        for uri in ["/favicon.ico", "/static/app.js", "/mcp/session"] {
            let response = send(app().await, Method::GET, uri, None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(json_body(response).await["error"], "Not found");
        }

        let response = send(app().await, Method::POST, "/tools/mcp", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mcp_suffix_requires_token_for_other_methods() {
        let response = send(app().await, Method::DELETE, "/tools/mcp", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn meta_requires_a_token() {
        let response = send(app().await, Method::GET, "/api/meta/health", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing token");
        assert_eq!(body["error_code"], "missing_token");
    }

    #[tokio::test]
    async fn unknown_routes_are_gated_before_404() {
        let response = send(app().await, Method::GET, "/api/agents", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            app().await,
            Method::GET,
            "/api/agents",
            Some(&primary_token()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected() {
        let response = send(app().await, Method::GET, "/api/meta/health", Some("Token abc")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "invalid_auth_header");
    }

    #[tokio::test]
    async fn valid_token_reaches_meta_handlers() {
        let token = primary_token();
        for (uri, field) in [
            ("/api/meta/health", "status"),
            ("/api/meta/live", "since"),
            ("/api/meta/version", "version"),
            ("/api/meta/info", "uptime_seconds"),
        ] {
            let response = send(app().await, Method::GET, uri, Some(&token)).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert!(!json_body(response).await[field].is_null(), "{uri}");
        }
    }

    #[tokio::test]
    async fn token_in_query_string_is_accepted() {
        let token = mint(PRIMARY_KID, PRIMARY_PEM, &valid_claims("user-1"));
        let uri = format!("/api/meta/health?token={token}");
        let response = send(app().await, Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn mounted_server_paths_are_public() {
        let mounted: MountedServers = ["weather".to_string()].into_iter().collect();
        let app = app_with(vec![vec![primary_record()]], mounted).await;

        let response = send(app.clone(), Method::GET, "/weather/forecast", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(app, Method::GET, "/other/forecast", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rotated_key_is_picked_up_on_refresh() {
        let app = app_with(
            vec![vec![primary_record()], vec![primary_record(), rotated_record()]],
            MountedServers::new(),
        )
        .await;
        let token = mint(ROTATED_KID, FOREIGN_PEM, &valid_claims("user-2"));

        let response = send(
            app,
            Method::GET,
            "/api/meta/health",
            Some(&format!("Bearer {token}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_preflight_is_answered_without_reaching_the_gate() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/meta/health")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app().await.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn plain_options_request_is_gated() {
        let response = send(app().await, Method::OPTIONS, "/api/meta/health", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = send(app().await, Method::GET, "/docs", None).await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}
