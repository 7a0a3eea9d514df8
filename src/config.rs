//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::{env, fmt::Display, str::FromStr};

use crate::errors::AppError;

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// HMAC key for HS256 access tokens.
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_lifetime_days: i64,
    /// Seed an admin account at startup when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|e| {
            log::error!("FATAL: JWT_SECRET environment variable not set");
            AppError::EnvVarError(e)
        })?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::ConfigError(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://perfumery.db")?,
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("PORT", "8080")?,
            jwt_secret,
            jwt_issuer: try_load("JWT_ISSUER", "perfumery")?,
            token_lifetime_days: try_load("TOKEN_LIFETIME_DAYS", "7")?,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| AppError::ConfigError(format!("invalid {key} value: {e}")))
}
