// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Agent Builder Server
//!
//! REST service whose every request passes a JWT gate before reaching a
//! handler. Tokens are RS256-signed and verified against a remotely hosted
//! JWKS that is cached in memory and refreshed when an unknown key id shows
//! up.
//!
//! ## Modules
//!
//! - `api` - HTTP router, meta endpoints and OpenAPI docs (Axum)
//! - `auth` - Token gate: allow-list, bearer extraction, JWKS cache, verification
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup
//! - `server` - Startup and graceful shutdown

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod state;

pub use server::run;
