use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

const DEFAULT_CONTACT_PHONE: &str = "+79037240147";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub port: u16,
    pub scrape_timeout: Duration,
    /// Pause between consecutive listing cards sent to a chat
    pub send_delay: Duration,
    pub keep_alive_interval: Duration,
    pub keep_alive_urls: Vec<String>,
    pub contact_phone: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("BOT_TOKEN must be set")?;

        let port: u16 = parse_or(&lookup, "PORT", 8080)?;

        let keep_alive_urls = match lookup("KEEP_ALIVE_URLS") {
            Some(urls) => urls
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec![
                format!("http://127.0.0.1:{port}/health"),
                "https://api.github.com".to_string(),
            ],
        };

        Ok(Self {
            bot_token,
            port,
            scrape_timeout: Duration::from_secs(non_zero(&lookup, "SCRAPE_TIMEOUT_SECS", 15)?),
            send_delay: Duration::from_millis(parse_or(&lookup, "SEND_DELAY_MS", 500)?),
            keep_alive_interval: Duration::from_secs(non_zero(&lookup, "KEEP_ALIVE_INTERVAL_SECS", 300)?),
            keep_alive_urls,
            contact_phone: lookup("CONTACT_PHONE").unwrap_or_else(|| DEFAULT_CONTACT_PHONE.to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        None => Ok(default),
    }
}

fn non_zero(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match parse_or(lookup, key, default)? {
        0 => bail!("{key} must be greater than zero"),
        value => Ok(value),
    }
}
