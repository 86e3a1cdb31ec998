//! Process configuration, read once from the environment at start-up.

use std::net::SocketAddr;

use bazaar_observability::LogFormat;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3001";
const DEFAULT_SECRET_FILE: &str = "jwt.evaluation.key";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;
/// Ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 87_600;
const DEFAULT_ADMIN_NAME: &str = "Marketplace Administrator";
const INSECURE_DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Administrator account ensured at start-up.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Public origin of the service; product image URLs are built under `<public_url>/images`.
    pub public_url: String,
    pub jwt_secret: String,
    /// `true` when no secret was configured and the development fallback is in use.
    pub insecure_secret: bool,
    pub token_ttl: chrono::Duration,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Re-load the caller on every verification instead of trusting the token's role.
    pub live_role_check: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup (empty values count as unset).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let (jwt_secret, insecure_secret) = match var("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => {
                let path = var("JWT_SECRET_FILE").unwrap_or_else(|| DEFAULT_SECRET_FILE.to_string());
                match std::fs::read_to_string(&path) {
                    Ok(content) if !content.trim().is_empty() => (content.trim().to_string(), false),
                    _ => (INSECURE_DEV_SECRET.to_string(), true),
                }
            }
        };

        let ttl_hours = match var("TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
                .ok_or_else(|| ConfigError::Invalid {
                    key: "TOKEN_TTL_HOURS",
                    reason: format!(
                        "expected between 1 and {MAX_TOKEN_TTL_HOURS} hours, got '{raw}'"
                    ),
                })?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        let token_ttl = chrono::Duration::try_hours(ttl_hours).ok_or_else(|| ConfigError::Invalid {
            key: "TOKEN_TTL_HOURS",
            reason: format!("{ttl_hours} hours is out of range"),
        })?;

        let live_role_check = match var("LIVE_ROLE_CHECK") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "LIVE_ROLE_CHECK",
                reason: format!("expected true or false, got '{raw}'"),
            })?,
            None => false,
        };

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_EMAIL"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                name: var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
                email,
                password,
            }),
            _ => None,
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e: bazaar_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    reason: e.to_string(),
                }
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            public_url: var("PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string()),
            jwt_secret,
            insecure_secret,
            token_ttl,
            database_url: var("DATABASE_URL"),
            live_role_check,
            bootstrap_admin,
            log_format,
        })
    }

    /// In-memory configuration for tests and local experiments.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            insecure_secret: false,
            token_ttl: chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            database_url: None,
            live_role_check: false,
            bootstrap_admin: None,
            log_format: LogFormat::Text,
        }
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("public_url", &self.public_url)
            .field("jwt_secret", &"<redacted>")
            .field("insecure_secret", &self.insecure_secret)
            .field("token_ttl", &self.token_ttl)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("live_role_check", &self.live_role_check)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
