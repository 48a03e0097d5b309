// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`ServerConfig`] loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the record database | `./data` |
//! | `JWT_SECRET` | HMAC secret for session tokens | Required |
//! | `CRYPTO_KEY` | Base64 32-byte AES key for records at rest | Required |
//! | `TOKEN_TTL_SECS` | Session token lifetime | `10800` |
//! | `TLS_CERT_PATH` | PEM certificate chain | Unset (plain HTTP) |
//! | `TLS_KEY_PATH` | PEM private key | Unset (plain HTTP) |
//! | `DB_RETRY_ATTEMPTS` | Attempts for database open/ping | `3` |
//! | `DB_RETRY_DELAY_MS` | Delay before the first retry | `1000` |
//! | `DB_RETRY_MULTIPLIER` | Backoff growth factor | `1.5` |
//! | `HEALTH_CHECK_INTERVAL_SECS` | Background ping interval | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use base64ct::{Base64, Encoding};

use crate::auth::token::DEFAULT_TOKEN_TTL;
use crate::cipher::KEY_LEN;
use crate::storage::monitor::DEFAULT_CHECK_INTERVAL;
use crate::storage::retry::{
    RetryPolicy, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MULTIPLIER,
};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the token signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the record encryption key (base64).
///
/// Must decode to exactly 32 bytes.
pub const CRYPTO_KEY_ENV: &str = "CRYPTO_KEY";

pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const DB_RETRY_ATTEMPTS_ENV: &str = "DB_RETRY_ATTEMPTS";
pub const DB_RETRY_DELAY_MS_ENV: &str = "DB_RETRY_DELAY_MS";
pub const DB_RETRY_MULTIPLIER_ENV: &str = "DB_RETRY_MULTIPLIER";
pub const HEALTH_CHECK_INTERVAL_ENV: &str = "HEALTH_CHECK_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default `RUST_LOG` filter when the variable is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// File name of the record database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "pass_keeper.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// PEM paths for TLS termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Server configuration resolved from the environment.
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub crypto_key: Vec<u8>,
    pub token_ttl: Duration,
    pub tls: Option<TlsPaths>,
    pub retry: RetryPolicy,
    pub health_check_interval: Duration,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let jwt_secret = var(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let encoded_key = var(CRYPTO_KEY_ENV).ok_or(ConfigError::Missing(CRYPTO_KEY_ENV))?;
        let crypto_key =
            Base64::decode_vec(encoded_key.trim()).map_err(|e| ConfigError::Invalid {
                name: CRYPTO_KEY_ENV,
                reason: format!("not valid base64: {e}"),
            })?;
        if crypto_key.len() != KEY_LEN {
            return Err(ConfigError::Invalid {
                name: CRYPTO_KEY_ENV,
                reason: format!("must decode to {KEY_LEN} bytes, got {}", crypto_key.len()),
            });
        }

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: TLS_CERT_PATH_ENV,
                    reason: format!(
                        "{TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV} must be set together"
                    ),
                })
            }
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        let retry = RetryPolicy::new(
            parse_or(&var, DB_RETRY_ATTEMPTS_ENV, DEFAULT_MAX_ATTEMPTS)?,
            Duration::from_millis(parse_or(
                &var,
                DB_RETRY_DELAY_MS_ENV,
                DEFAULT_INITIAL_DELAY.as_millis() as u64,
            )?),
            parse_or(&var, DB_RETRY_MULTIPLIER_ENV, DEFAULT_MULTIPLIER)?,
        );

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&var, PORT_ENV, DEFAULT_PORT)?,
            data_dir: var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            jwt_secret,
            crypto_key,
            token_ttl: Duration::from_secs(parse_or(
                &var,
                TOKEN_TTL_ENV,
                DEFAULT_TOKEN_TTL.as_secs(),
            )?),
            tls,
            retry,
            health_check_interval: Duration::from_secs(parse_or(
                &var,
                HEALTH_CHECK_INTERVAL_ENV,
                DEFAULT_CHECK_INTERVAL.as_secs(),
            )?),
            log_format,
        })
    }

    /// Socket address to bind.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: HOST_ENV,
                reason: format!("{e}"),
            })
    }

    /// Path of the record database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("jwt_secret", &"<redacted>")
            .field("crypto_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("tls", &self.tls)
            .field("retry", &self.retry)
            .field("health_check_interval", &self.health_check_interval)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_or<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
