// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into a
//! [`GateConfig`], which is then shared read-only through the app state.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DEPLOYMENT_ENV` | `production` is open, anything else restricted | restricted |
//! | `JWT_SECRET` | HS256 signing secret | Required |
//! | `TOKEN_TTL_SECS` | Lifetime of issued tokens | `3600` |
//! | `TOKEN_LEEWAY_SECS` | Clock skew tolerated on `exp` | `0` |
//! | `AUTH_COOKIE_NAME` | Cookie carrying the credential | `authToken` |
//! | `REVOCATION_PRUNE_INTERVAL_SECS` | Revocation pruner period | `300` |
//! | `SEED_ADMIN_ID` | Bootstrap admin account ID | Optional |
//! | `SEED_ADMIN_TOTP_SECRET` | Hex TOTP secret for the bootstrap admin | Optional |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; enables HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{EnvironmentClass, DEFAULT_LEEWAY_SECS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DEPLOYMENT_ENV: &str = "DEPLOYMENT_ENV";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const TOKEN_LEEWAY_ENV: &str = "TOKEN_LEEWAY_SECS";
pub const COOKIE_NAME_ENV: &str = "AUTH_COOKIE_NAME";
pub const PRUNE_INTERVAL_ENV: &str = "REVOCATION_PRUNE_INTERVAL_SECS";
pub const SEED_ADMIN_ID_ENV: &str = "SEED_ADMIN_ID";
pub const SEED_ADMIN_TOTP_ENV: &str = "SEED_ADMIN_TOTP_SECRET";
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
pub const DEFAULT_COOKIE_NAME: &str = "authToken";
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Bootstrap admin created at startup.
#[derive(Clone)]
pub struct SeedAdmin {
    pub user_id: String,
    pub totp_secret: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Process-wide configuration.
#[derive(Clone)]
pub struct GateConfig {
    pub host: String,
    pub port: u16,
    pub environment: EnvironmentClass,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub token_leeway_secs: u64,
    pub cookie_name: String,
    pub prune_interval: Duration,
    pub seed_admin: Option<SeedAdmin>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("cookie_name", &self.cookie_name)
            .field("prune_interval", &self.prune_interval)
            .field("seed_admin", &self.seed_admin.as_ref().map(|s| &s.user_id))
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl GateConfig {
    /// Defaults plus the two values that have none.
    pub fn new(jwt_secret: impl Into<String>, environment: EnvironmentClass) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment,
            jwt_secret: jwt_secret.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            token_leeway_secs: DEFAULT_LEEWAY_SECS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            prune_interval: DEFAULT_PRUNE_INTERVAL,
            seed_admin: None,
            tls: None,
            log_format: LogFormat::Pretty,
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        let environment = EnvironmentClass::classify(lookup(DEPLOYMENT_ENV).as_deref());
        let mut config = Self::new(jwt_secret, environment);

        if let Some(host) = get(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = get(PORT_ENV) {
            config.port = parse(PORT_ENV, &port)?;
        }
        if let Some(ttl) = get(TOKEN_TTL_ENV) {
            let ttl: i64 = parse(TOKEN_TTL_ENV, &ttl)?;
            if ttl <= 0 {
                return Err(ConfigError::Invalid {
                    name: TOKEN_TTL_ENV,
                    value: ttl.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            config.token_ttl_secs = ttl;
        }
        if let Some(leeway) = get(TOKEN_LEEWAY_ENV) {
            config.token_leeway_secs = parse(TOKEN_LEEWAY_ENV, &leeway)?;
        }
        if let Some(name) = get(COOKIE_NAME_ENV) {
            config.cookie_name = name;
        }
        if let Some(secs) = get(PRUNE_INTERVAL_ENV) {
            let secs: u64 = parse(PRUNE_INTERVAL_ENV, &secs)?;
            config.prune_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(user_id) = get(SEED_ADMIN_ID_ENV) {
            let totp_secret = match get(SEED_ADMIN_TOTP_ENV) {
                Some(raw) => Some(hex::decode(raw.trim()).map_err(|e| ConfigError::Invalid {
                    name: SEED_ADMIN_TOTP_ENV,
                    value: "<redacted>".to_string(),
                    reason: e.to_string(),
                })?),
                None => None,
            };
            config.seed_admin = Some(SeedAdmin {
                user_id,
                totp_secret,
            });
        }
        config.tls = match (get(TLS_CERT_ENV), get(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: TLS_CERT_ENV,
                    value: String::new(),
                    reason: format!("{TLS_CERT_ENV} and {TLS_KEY_ENV} must be set together"),
                })
            }
        };
        config.log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(config)
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
