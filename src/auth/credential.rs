// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential extraction.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::error::AuthError;

/// Name of the query parameter accepted when no header is sent.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Pull the bearer token out of a request.
///
/// A non-blank `Authorization` header wins and must be exactly
/// `Bearer <token>` (scheme case-insensitive, one space). Without it the
/// `token` query parameter is used.
pub fn extract_bearer(headers: &HeaderMap, query: Option<&str>) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?.trim();
        if !value.is_empty() {
            return parse_authorization(value);
        }
    }

    query
        .and_then(token_from_query)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

fn parse_authorization(value: &str) -> Result<String, AuthError> {
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(AuthError::MissingToken)
            } else {
                Ok(token.to_string())
            }
        }
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

fn token_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| name == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .last()
}
