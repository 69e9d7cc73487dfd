// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! JWT verification for every request that is not on the allow-list.
//!
//! ## Auth Flow
//!
//! 1. At startup the gate downloads the JWKS and indexes it by `kid`
//!    (startup fails if this download fails)
//! 2. Per request:
//!    - allow-listed paths (MCP, docs, static, mounted servers) pass as-is
//!    - otherwise the token comes from `Authorization: Bearer <token>` or
//!      `?token=<token>`
//!    - the unverified header yields the `kid`; an unknown `kid` triggers
//!      one JWKS refresh
//!    - the RSA key is rebuilt from `n`/`e` and the token is verified with
//!      RS256 plus expiry, audience and issuer
//!    - verified [`Claims`] go into the request extensions
//! 3. Any failure is a `401` carrying the reason
//!
//! ## Security
//!
//! - Only RS256 is accepted, whatever the token header claims
//! - The unverified header is used for key selection and nothing else
//! - JWKS downloads are bounded by a timeout

pub mod claims;
pub mod credential;
pub mod error;
pub mod exempt;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod middleware;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::Claims;
pub use error::AuthError;
pub use exempt::MountedServers;
pub use extractor::{Auth, OptionalAuth};
pub use gate::{GateConfig, Outcome, TokenGate};
pub use jwks::{HttpKeySource, KeyCache, KeyRecord, KeySet, KeySource};
pub use middleware::token_gate;
