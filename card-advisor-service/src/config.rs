use anyhow::{Context, Result, bail};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_CARDS_PATH: &str = "data/cards.json";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines for production
    Json,
    /// Human-readable output for development
    Pretty,
}

/// Service configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<HeaderValue>,
    pub cards_path: PathBuf,
    pub log_format: LogFormat,
    /// Sessions idle for longer than this are swept. `None` keeps them forever.
    pub session_idle_timeout: Option<Duration>,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr = get("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8000")?;

        let allowed_origins = get("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                if origin == "*" {
                    bail!("ALLOWED_ORIGINS must list explicit origins, '*' is not allowed");
                }
                HeaderValue::from_str(origin).with_context(|| {
                    format!("ALLOWED_ORIGINS contains an invalid origin '{origin}'")
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let log_format = match get("LOG_FORMAT", "json").as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => bail!("LOG_FORMAT must be 'json' or 'pretty', got '{other}'"),
        };

        let session_idle_timeout = lookup("SESSION_IDLE_TIMEOUT_SECS")
            .map(|v| parse_secs("SESSION_IDLE_TIMEOUT_SECS", &v))
            .transpose()?;

        let sweep_interval = match lookup("SESSION_SWEEP_INTERVAL_SECS") {
            Some(v) => parse_secs("SESSION_SWEEP_INTERVAL_SECS", &v)?,
            None => Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        };

        Ok(Config {
            bind_addr,
            allowed_origins,
            cards_path: PathBuf::from(get("CARDS_PATH", DEFAULT_CARDS_PATH)),
            log_format,
            session_idle_timeout,
            sweep_interval,
        })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
