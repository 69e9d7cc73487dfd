// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paths that bypass token verification.
//!
//! The fixed part of the allow-list covers the MCP handshake, API docs and
//! static assets. The dynamic part is the set of mounted-server slugs held
//! in [`MountedServers`], which other components update at runtime.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use axum::http::Method;

/// Exact paths that never need a token.
const PUBLIC_PATHS: [&str; 3] = ["/docs", "/openapi.json", "/favicon.ico"];

/// Suffix of the MCP handshake endpoint (GET and POST only).
const MCP_SUFFIX: &str = "/mcp";

/// Prefix of the MCP protocol namespace.
const MCP_PREFIX: &str = "/mcp/";

/// Prefix of static assets.
const STATIC_PREFIX: &str = "/static/";

/// Registry of mounted-server slugs.
///
/// Cloning yields another handle to the same set. Writers and readers are
/// short critical sections, so a plain `std` lock is enough.
#[derive(Debug, Clone, Default)]
pub struct MountedServers {
    slugs: Arc<RwLock<HashSet<String>>>,
}

impl MountedServers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slug. Surrounding slashes are stripped; an empty slug is
    /// refused because it would match every path. Returns `true` when the
    /// slug was newly added.
    pub fn register(&self, slug: &str) -> bool {
        let slug = normalize(slug);
        if slug.is_empty() {
            tracing::warn!("Ignoring empty mounted server slug");
            return false;
        }
        let added = self
            .slugs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slug.to_string());
        if added {
            tracing::info!(slug, "Mounted server registered");
        }
        added
    }

    /// Remove a slug. Returns `true` if it was registered.
    pub fn unregister(&self, slug: &str) -> bool {
        self.slugs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(normalize(slug))
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.slugs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(normalize(slug))
    }

    /// Registered slugs, sorted.
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self
            .slugs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        slugs.sort_unstable();
        slugs
    }

    /// Whether `path` starts with `/<slug>` for a registered slug.
    ///
    /// This is a plain prefix match: slug `tools` also covers `/toolsets`.
    pub fn matches_path(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        self.slugs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|slug| rest.starts_with(slug.as_str()))
    }
}

impl<S: AsRef<str>> FromIterator<S> for MountedServers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let servers = Self::new();
        for slug in iter {
            servers.register(slug.as_ref());
        }
        servers
    }
}

fn normalize(slug: &str) -> &str {
    slug.trim().trim_matches('/')
}

/// Whether a request may skip token verification.
pub fn is_exempt(method: &Method, path: &str, mounted: &MountedServers) -> bool {
    (path.ends_with(MCP_SUFFIX) && (*method == Method::GET || *method == Method::POST))
        || path.starts_with(MCP_PREFIX)
        || PUBLIC_PATHS.contains(&path)
        || path.starts_with(STATIC_PREFIX)
        || mounted.matches_path(path)
}
