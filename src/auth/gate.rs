// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The token verification gate.
//!
//! Verification runs in two phases:
//!
//! 1. **Peek**: decode the token header without checking anything, only to
//!    learn which `kid` to look up. Nothing read here is trusted.
//! 2. **Verify**: check the RS256 signature with the resolved key, then
//!    expiry, audience and issuer. Only the output of this phase is handed
//!    to handlers.

use std::time::Duration;

use axum::http::{HeaderMap, Method};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};

use super::claims::Claims;
use super::credential::extract_bearer;
use super::error::AuthError;
use super::exempt::{is_exempt, MountedServers};
use super::jwks::{HttpKeySource, KeyCache, KeySource, DEFAULT_FETCH_TIMEOUT};

/// Gate configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// JWKS endpoint
    pub jwks_url: String,
    /// Expected `aud`; not checked when unset
    pub audience: Option<String>,
    /// Expected `iss`; not checked when unset
    pub issuer: Option<String>,
    /// Bound on each JWKS download
    pub fetch_timeout: Duration,
    /// Clock skew tolerance for `exp`/`nbf`, in seconds
    pub leeway: u64,
}

impl GateConfig {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            audience: None,
            issuer: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            leeway: 0,
        }
    }

    /// Set the expected audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the expected issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway;

        // A configured aud/iss must also be present, not only match when sent.
        match &self.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        validation
    }
}

/// How the gate classified a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Allow-listed; forwarded without claims
    Exempt,
    /// Token verified; forwarded with these claims
    Verified(Claims),
}

/// Verifies bearer tokens against a cached key set.
pub struct TokenGate<S = HttpKeySource> {
    keys: KeyCache<S>,
    validation: Validation,
    mounted: MountedServers,
}

impl TokenGate<HttpKeySource> {
    /// Build a gate that downloads keys from `config.jwks_url`.
    ///
    /// The first download happens here; if it fails the gate is not built.
    pub async fn connect(config: &GateConfig, mounted: MountedServers) -> Result<Self, AuthError> {
        let source = HttpKeySource::new(&config.jwks_url, config.fetch_timeout)?;
        Self::with_source(source, config, mounted).await
    }
}

impl<S: KeySource> TokenGate<S> {
    /// Build a gate around any key source. Fetches the initial key set.
    pub async fn with_source(
        source: S,
        config: &GateConfig,
        mounted: MountedServers,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            keys: KeyCache::load(source).await?,
            validation: config.validation(),
            mounted,
        })
    }

    pub fn keys(&self) -> &KeyCache<S> {
        &self.keys
    }

    pub fn mounted_servers(&self) -> &MountedServers {
        &self.mounted
    }

    /// Whether this request bypasses verification.
    pub fn is_exempt(&self, method: &Method, path: &str) -> bool {
        is_exempt(method, path, &self.mounted)
    }

    /// Classify a request: exempt, verified, or rejected.
    pub async fn intercept(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        query: Option<&str>,
    ) -> Result<Outcome, AuthError> {
        if self.is_exempt(method, path) {
            return Ok(Outcome::Exempt);
        }
        let token = extract_bearer(headers, query)?;
        self.verify(&token).await.map(Outcome::Verified)
    }

    /// Verify a raw token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let kid = peek_kid(token)?;
        let record = self.keys.resolve(&kid).await?;
        let key = record.decoding_key()?;

        decode::<Claims>(token, &key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenValidation(describe(e.kind())))
    }
}

/// Read the `kid` from the unverified header. Used for key selection only.
fn peek_kid(token: &str) -> Result<String, AuthError> {
    let header = decode_header(token).map_err(|e| AuthError::TokenValidation(describe(e.kind())))?;
    header
        .kid
        .ok_or_else(|| AuthError::TokenValidation("token header has no kid".into()))
}

fn describe(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::ExpiredSignature => "token has expired".into(),
        ErrorKind::ImmatureSignature => "token is not yet valid".into(),
        ErrorKind::InvalidSignature => "signature verification failed".into(),
        ErrorKind::InvalidAudience => "invalid audience".into(),
        ErrorKind::InvalidIssuer => "invalid issuer".into(),
        ErrorKind::InvalidAlgorithm => "algorithm not allowed".into(),
        ErrorKind::MissingRequiredClaim(claim) => format!("missing required claim {claim}"),
        other => format!("{other:?}"),
    }
}
