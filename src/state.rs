// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::MountedServers;
use crate::config::BuildInfo;

/// State shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Slugs of servers mounted under this host; shared with the token gate
    pub mounted_servers: MountedServers,
    pub build: Arc<BuildInfo>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(mounted_servers: MountedServers, build: BuildInfo) -> Self {
        Self {
            mounted_servers,
            build: Arc::new(build),
            started_at: Utc::now(),
        }
    }

    /// Whole seconds since the state was created.
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            MountedServers::new(),
            BuildInfo {
                version: env!("CARGO_PKG_VERSION").to_string(),
                commit: "unknown".to_string(),
                env: "dev".to_string(),
            },
        )
    }
}
