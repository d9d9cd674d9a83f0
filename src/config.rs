use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;
use strum_macros::{Display, EnumString};

use crate::controller::OpenSessionPolicy;

pub const DEFAULT_IDENTITY_HEADER: &str = "X-Attendance-Identity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    #[default]
    MySql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub run_migrations: bool,

    pub api_prefix: String,
    pub identity_header: String,
    pub open_session_policy: OpenSessionPolicy,

    // Rate limiting
    pub rate_mutations_per_min: u32,
    pub rate_reads_per_min: u32,

    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            store_backend: StoreBackend::default(),
            database_url: None,
            run_migrations: true,
            api_prefix: "/api".to_string(),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            open_session_policy: OpenSessionPolicy::Single,
            rate_mutations_per_min: 60,
            rate_reads_per_min: 600,
            log_dir: "logs".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; missing optional keys keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let server_addr = lookup("SERVER_ADDR").context("SERVER_ADDR must be set")?;
        let store_backend = parse_or(&lookup, "STORE_BACKEND", defaults.store_backend)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        if store_backend == StoreBackend::MySql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORE_BACKEND=mysql"));
        }

        Ok(Self {
            server_addr,
            store_backend,
            database_url,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", defaults.run_migrations)?,
            api_prefix: lookup("API_PREFIX").unwrap_or(defaults.api_prefix),
            identity_header: lookup("IDENTITY_HEADER").unwrap_or(defaults.identity_header),
            open_session_policy: parse_or(
                &lookup,
                "OPEN_SESSION_POLICY",
                defaults.open_session_policy,
            )?,
            rate_mutations_per_min: parse_or(
                &lookup,
                "RATE_MUTATIONS_PER_MIN",
                defaults.rate_mutations_per_min,
            )?,
            rate_reads_per_min: parse_or(
                &lookup,
                "RATE_READS_PER_MIN",
                defaults.rate_reads_per_min,
            )?,
            log_dir: lookup("LOG_DIR").unwrap_or(defaults.log_dir),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value {raw:?} for {key}: {e}")),
        None => Ok(default),
    }
}
