// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into an
//! immutable [`AppConfig`]; nothing re-reads the environment afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent data | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 signing secret | Required |
//! | `JWT_TTL_SECS` | Token lifetime in seconds | `1800` (30 minutes) |
//! | `FRONTEND_URL` | Front-end base URL for OAuth redirects | `http://localhost:3000` |
//! | `GOOGLE_CLIENT_ID` | Google OAuth client id | Optional (disables Google sign-in) |
//! | `GOOGLE_CLIENT_SECRET` | Google OAuth client secret | Required with client id |
//! | `GOOGLE_REDIRECT_URI` | Callback URL registered with Google | Required with client id |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::DEFAULT_TOKEN_TTL;
use crate::storage::paths::DATA_ROOT;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_SECS_ENV: &str = "JWT_TTL_SECS";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";
pub const GOOGLE_REDIRECT_URI_ENV: &str = "GOOGLE_REDIRECT_URI";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default front-end base URL (local development).
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Configuration errors surfaced at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}

/// Google OAuth client credentials.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Immutable application configuration, loaded at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub frontend_url: String,
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var(JWT_SECRET_ENV).map_err(|_| ConfigError::Missing(JWT_SECRET_ENV))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing(JWT_SECRET_ENV));
        }

        let port = match env::var(PORT_ENV) {
            Ok(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid(PORT_ENV))?,
            Err(_) => 8080,
        };

        let token_ttl = match env::var(JWT_TTL_SECS_ENV) {
            Ok(value) => Duration::from_secs(
                value.parse::<u64>().map_err(|_| ConfigError::Invalid(JWT_TTL_SECS_ENV))?,
            ),
            Err(_) => DEFAULT_TOKEN_TTL,
        };

        let google = google_config(
            env::var(GOOGLE_CLIENT_ID_ENV).ok(),
            env::var(GOOGLE_CLIENT_SECRET_ENV).ok(),
            env::var(GOOGLE_REDIRECT_URI_ENV).ok(),
        )?;

        Ok(Self {
            host: env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            data_dir: PathBuf::from(env::var(DATA_DIR_ENV).unwrap_or_else(|_| DATA_ROOT.to_string())),
            jwt_secret,
            token_ttl,
            frontend_url: env::var(FRONTEND_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            google,
        })
    }
}

/// Google sign-in needs all three values; none disables it, a partial set is
/// a configuration mistake worth failing loudly on.
fn google_config(
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
) -> Result<Option<GoogleConfig>, ConfigError> {
    match (client_id, client_secret, redirect_uri) {
        (None, None, None) => Ok(None),
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(Some(GoogleConfig {
            client_id,
            client_secret,
            redirect_uri,
        })),
        (None, ..) => Err(ConfigError::Missing(GOOGLE_CLIENT_ID_ENV)),
        (_, None, _) => Err(ConfigError::Missing(GOOGLE_CLIENT_SECRET_ENV)),
        (_, _, None) => Err(ConfigError::Missing(GOOGLE_REDIRECT_URI_ENV)),
    }
}
