// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAPI document and Swagger UI page.
//!
//! Both live at allow-listed paths (`/openapi.json`, `/docs`). Swagger UI
//! assets are loaded from a CDN so nothing under `/docs/` has to bypass the
//! token gate.

use axum::{response::Html, Json};
use utoipa::OpenApi;

use super::meta::{self, HealthResponse, InfoResponse, LiveResponse, VersionResponse};

pub const OPENAPI_PATH: &str = "/openapi.json";
pub const DOCS_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(title = "Agent Builder Server"),
    paths(meta::health, meta::liveness, meta::version, meta::info),
    components(schemas(HealthResponse, LiveResponse, VersionResponse, InfoResponse)),
    modifiers(&BearerAuth),
    security(("bearer" = [])),
    tags((name = "Server Meta", description = "Health, liveness, version and info"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn swagger_ui() -> Html<String> {
    Html(format!(
        r##"<!DOCTYPE html>
<html>
<head>
<title>Agent Builder Server - Swagger UI</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
window.ui = SwaggerUIBundle({{ url: "{OPENAPI_PATH}", dom_id: "#swagger-ui" }});
</script>
</body>
</html>"##
    ))
}
