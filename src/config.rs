// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! loader that turns them into an [`AppConfig`] at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SUPABASE_JWT_SECRET` | HS256 secret for Supabase access tokens | Required; requests fail without it |
//! | `JWT_LEEWAY_SECS` | Tolerated clock skew on `exp` | `0` |
//! | `USER_STORE` | `redb` or `memory` | `redb` |
//! | `DATA_DIR` | Directory holding `users.redb` | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use crate::auth::{JwtSecret, VerifierConfig};
use crate::auth::verifier::DEFAULT_LEEWAY_SECS;

pub const JWT_SECRET_ENV: &str = "SUPABASE_JWT_SECRET";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const USER_STORE_ENV: &str = "USER_STORE";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Where user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStoreKind {
    Redb,
    Memory,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` selects the human-readable format.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    /// Read `LOG_FORMAT` directly, so logging can start before the rest of
    /// the configuration is loaded.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub user_store: UserStoreKind,
    pub jwt_secret: Option<JwtSecret>,
    pub jwt_leeway_secs: u64,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let user_store = match get(USER_STORE_ENV).as_deref().map(str::to_ascii_lowercase) {
            None => UserStoreKind::Redb,
            Some(kind) if kind == "redb" => UserStoreKind::Redb,
            Some(kind) if kind == "memory" => UserStoreKind::Memory,
            Some(other) => {
                tracing::warn!(value = %other, "Unknown {USER_STORE_ENV}, using redb");
                UserStoreKind::Redb
            }
        };

        Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT),
            data_dir: get(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            user_store,
            jwt_secret: lookup(JWT_SECRET_ENV).and_then(JwtSecret::new),
            jwt_leeway_secs: parse_or(get(JWT_LEEWAY_ENV), JWT_LEEWAY_ENV, DEFAULT_LEEWAY_SECS),
            log_format: LogFormat::parse(get(LOG_FORMAT_ENV).as_deref()),
        }
    }

    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig::new(self.jwt_secret.clone()).with_leeway(self.jwt_leeway_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid number, using default");
            default
        }),
    }
}
