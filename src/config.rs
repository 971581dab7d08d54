//! Settings read from the environment (and `.env` via `dotenv`).

use std::env;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_VERIFICATION_BASE_URL: &str = "http://127.0.0.1:8080/v";
pub const DEFAULT_PHOTO_MAX_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} is invalid: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// Without trailing slash.
    pub verification_base_url: String,
    /// Where `/scan` sends requests that carry no scanned value.
    pub landing_url: String,
    /// `None` disables photo uploads.
    pub photo_bucket: Option<String>,
    pub aws_region: Option<String>,
    pub photo_max_bytes: usize,
    pub allow_admin_signup: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let verification_base_url = normalize_base_url(
            &non_empty("VERIFICATION_BASE_URL")
                .unwrap_or_else(|| DEFAULT_VERIFICATION_BASE_URL.to_string()),
        )?;

        let photo_max_bytes = match non_empty("PHOTO_MAX_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::Invalid("PHOTO_MAX_BYTES", e.to_string()))?,
            None => DEFAULT_PHOTO_MAX_BYTES,
        };

        let token_ttl_days = match non_empty("TOKEN_TTL_DAYS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if days > 0 => days,
                Ok(days) => {
                    return Err(ConfigError::Invalid("TOKEN_TTL_DAYS", format!("{} is not positive", days)))
                }
                Err(e) => return Err(ConfigError::Invalid("TOKEN_TTL_DAYS", e.to_string())),
            },
            None => DEFAULT_TOKEN_TTL_DAYS,
        };

        let allow_admin_signup = match non_empty("ALLOW_ADMIN_SIGNUP") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::Invalid("ALLOW_ADMIN_SIGNUP", raw.clone()))?,
            None => false,
        };

        Ok(AppConfig {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            token_ttl_days,
            verification_base_url,
            landing_url: non_empty("LANDING_URL").unwrap_or_else(|| "/".to_string()),
            photo_bucket: non_empty("AWS_S3_BUCKET"),
            aws_region: non_empty("AWS_REGION"),
            photo_max_bytes,
            allow_admin_signup,
        })
    }
}

/// The base must be an absolute http(s) URL. One trailing slash is dropped
/// so links come out as `base/number`.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| ConfigError::Invalid("VERIFICATION_BASE_URL", e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(
            "VERIFICATION_BASE_URL",
            format!("unsupported scheme {}", parsed.scheme()),
        ));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConfigError::Invalid(
            "VERIFICATION_BASE_URL",
            "must not carry a query or fragment".to_string(),
        ));
    }
    Ok(trimmed.strip_suffix('/').unwrap_or(trimmed).to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
