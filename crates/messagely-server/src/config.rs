use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

/// Upper bound on token lifetime: ten years.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl Config {
    /// Read `MESSAGELY_*` variables, falling back to development defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: var_or("MESSAGELY_HOST", "0.0.0.0".into()),
            port: parse_var("MESSAGELY_PORT", 3000)?,
            db_path: var_or("MESSAGELY_DB_PATH", "messagely.db".into()).into(),
            jwt_secret: var_or("MESSAGELY_JWT_SECRET", "dev-secret-change-me".into()),
            token_ttl_days: check_ttl_days(parse_var("MESSAGELY_TOKEN_TTL_DAYS", 30)?)?,
            hash_memory_kib: parse_var("MESSAGELY_HASH_MEMORY_KIB", argon2::Params::DEFAULT_M_COST)?,
            hash_iterations: parse_var("MESSAGELY_HASH_ITERATIONS", argon2::Params::DEFAULT_T_COST)?,
            hash_parallelism: parse_var("MESSAGELY_HASH_PARALLELISM", argon2::Params::DEFAULT_P_COST)?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

fn check_ttl_days(days: i64) -> Result<i64> {
    if days <= 0 || days > MAX_TOKEN_TTL_DAYS {
        bail!(
            "MESSAGELY_TOKEN_TTL_DAYS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_DAYS,
            days
        );
    }
    Ok(days)
}

fn var_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().with_context(|| format!("{} is not valid: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
