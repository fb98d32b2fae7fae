use std::{net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;
use tracing::Level;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{name} can't be parsed: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub teloxide_token: String,
    /// Postgres connection. Slots are kept in memory without it.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub questions_path: PathBuf,
    pub storage_key: String,
    pub settle_delay: Duration,
    pub webhook: Option<(Url, SocketAddr)>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let teloxide_token = lookup("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let log_level = parse_or(&lookup, "LOG_LEVEL", Level::ERROR)?;
        let settle_ms: u64 = parse_or(&lookup, "SETTLE_DELAY_MS", 1000)?;

        let webhook_url: Option<Url> = parse_opt(&lookup, "WEBHOOK_URL")?;
        let webhook_addr: Option<SocketAddr> = parse_opt(&lookup, "WEBHOOK_ADDR")?;
        let webhook = match (webhook_url, webhook_addr) {
            (Some(url), Some(addr)) => Some((url, addr)),
            (Some(_), None) => return Err(ConfigError::Missing("WEBHOOK_ADDR")),
            (None, Some(_)) => return Err(ConfigError::Missing("WEBHOOK_URL")),
            (None, None) => None,
        };

        Ok(Self {
            teloxide_token,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            log_level,
            questions_path: lookup("QUESTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("questions.json")),
            storage_key: lookup("STORAGE_KEY").unwrap_or_else(|| "quiz_questions_v1".to_owned()),
            settle_delay: Duration::from_millis(settle_ms),
            webhook,
        })
    }
}

fn parse_opt<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(lookup, name)?.unwrap_or(default))
}
