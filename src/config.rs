// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. A `.env`
//! file in the working directory is loaded first when present.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWKS_URL` | JWKS endpoint for JWT verification | Required |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | Not checked |
//! | `JWT_ISSUER` | Expected JWT issuer claim | Not checked |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for one JWKS download | `5` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `0` |
//! | `MOUNTED_SERVERS` | Comma-separated mounted server slugs | empty |
//! | `HOST` | Server bind IP (v4 or v6) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8002` |
//! | `APP_VERSION` | Reported by `/api/meta/version` | `0.1.0` |
//! | `GIT_COMMIT` | Reported by `/api/meta/version` | `unknown` |
//! | `APP_ENV` | Reported by `/api/meta/version` | `dev` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::auth::GateConfig;
use crate::logging::LogFormat;

pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const MOUNTED_SERVERS_ENV: &str = "MOUNTED_SERVERS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_VERSION_ENV: &str = "APP_VERSION";
pub const GIT_COMMIT_ENV: &str = "GIT_COMMIT";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8002;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Values reported by the meta endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub env: String,
}

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gate: GateConfig,
    pub mounted_servers: Vec<String>,
    pub bind_addr: SocketAddr,
    pub build: BuildInfo,
    pub log_format: LogFormat,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwks_url = get(JWKS_URL_ENV).ok_or(ConfigError::Missing(JWKS_URL_ENV))?;
        let fetch_timeout = parse_or(&get, JWKS_FETCH_TIMEOUT_ENV, DEFAULT_FETCH_TIMEOUT_SECS)?;
        if fetch_timeout == 0 {
            return Err(ConfigError::Invalid {
                name: JWKS_FETCH_TIMEOUT_ENV,
                value: "0".into(),
            });
        }

        let gate = GateConfig {
            jwks_url,
            audience: get(JWT_AUDIENCE_ENV),
            issuer: get(JWT_ISSUER_ENV),
            fetch_timeout: Duration::from_secs(fetch_timeout),
            leeway: parse_or(&get, JWT_LEEWAY_ENV, 0)?,
        };

        let mounted_servers = get(MOUNTED_SERVERS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let ip: IpAddr = host.parse().map_err(|_| ConfigError::Invalid {
            name: HOST_ENV,
            value: host.clone(),
        })?;
        let bind_addr = SocketAddr::new(ip, port);

        let build = BuildInfo {
            version: get(APP_VERSION_ENV).unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            commit: get(GIT_COMMIT_ENV).unwrap_or_else(|| "unknown".to_string()),
            env: get(APP_ENV_ENV).unwrap_or_else(|| "dev".to_string()),
        };

        let log_format = parse_or(&get, LOG_FORMAT_ENV, LogFormat::Pretty)?;

        Ok(Self {
            gate,
            mounted_servers,
            bind_addr,
            build,
            log_format,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
