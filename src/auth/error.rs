// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reasons the token gate refuses a request.
///
/// Every variant is terminal for the request it was raised on and is turned
/// into a `401 Unauthorized` response. `KeySetFetch` is additionally fatal
/// when it happens while the gate is being built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `Authorization` header present but not `Bearer <token>`
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// Neither a bearer header nor a `token` query parameter
    #[error("Missing token")]
    MissingToken,

    /// The token's `kid` is not published, even after a refresh
    #[error("Unknown JWK kid")]
    UnknownKey(String),

    /// The published key record cannot be turned into an RSA public key
    #[error("Unusable signing key: {0}")]
    InvalidSigningKey(String),

    /// Signature, expiry, audience, issuer or structure check failed
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// The key set could not be downloaded or parsed
    #[error("Failed to fetch JWKS: {0}")]
    KeySetFetch(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MissingToken => "missing_token",
            AuthError::UnknownKey(_) => "unknown_kid",
            AuthError::InvalidSigningKey(_) => "invalid_signing_key",
            AuthError::TokenValidation(_) => "token_validation_error",
            AuthError::KeySetFetch(_) => "jwks_fetch_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
