// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! ```rust,ignore
//! let gate = Arc::new(TokenGate::connect(&config, mounted).await?);
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(gate, token_gate));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::gate::{Outcome, TokenGate};
use super::jwks::KeySource;

/// Run every request through the gate.
///
/// Exempt requests pass untouched. Verified requests get their [`Claims`]
/// inserted into the request extensions. Everything else is answered with
/// `401` and never reaches the inner service.
///
/// [`Claims`]: super::Claims
pub async fn token_gate<S: KeySource>(
    State(gate): State<Arc<TokenGate<S>>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let outcome = gate
        .intercept(&parts.method, parts.uri.path(), &parts.headers, parts.uri.query())
        .await;
    let mut request = Request::from_parts(parts, body);

    match outcome {
        Ok(Outcome::Exempt) => {
            tracing::debug!(path = %request.uri().path(), "Skipping token verification");
            next.run(request).await
        }
        Ok(Outcome::Verified(claims)) => {
            tracing::info!(
                path = %request.uri().path(),
                sub = claims.subject().unwrap_or("unknown"),
                "Token verified"
            );
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                error_code = e.error_code(),
                error = %e,
                "Request rejected"
            );
            e.into_response()
        }
    }
}
