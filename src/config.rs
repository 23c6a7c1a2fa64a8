use std::env;
use std::fmt;
use std::ops::RangeInclusive;

/// One year; longer lifetimes overflow timestamp arithmetic long before they make sense.
const SESSION_TTL_HOURS: RangeInclusive<i64> = 1..=8760;
const SESSION_PURGE_MINUTES: RangeInclusive<u64> = 1..=1440;
const BCRYPT_COST: RangeInclusive<u32> = 4..=31;

/// Application settings, read from the environment (and `.env` via `dotenv`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub session_cookie_name: String,
    pub session_ttl_hours: i64,
    pub session_cookie_secure: bool,
    /// How often expired sessions are swept from the store.
    pub session_purge_minutes: u64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            session_cookie_name: lookup("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| "taskdesk_session".to_string()),
            session_ttl_hours: parse_in(&lookup, "SESSION_TTL_HOURS", 24, SESSION_TTL_HOURS)?,
            session_cookie_secure: parse_or(&lookup, "SESSION_COOKIE_SECURE", false)?,
            session_purge_minutes: parse_in(&lookup, "SESSION_PURGE_MINUTES", 60, SESSION_PURGE_MINUTES)?,
            bcrypt_cost: parse_in(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST, BCRYPT_COST)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// `DATABASE_URL=memory` runs against the in-process store.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == "memory"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_in<F, T>(lookup: &F, key: &'static str, default: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + fmt::Display,
{
    let value = parse_or(lookup, key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}
