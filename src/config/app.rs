// src/config/app.rs
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Disclosures page polled every cycle.
pub const ANN_URL: &str = "https://www.bseindia.com/corporates/ann.html";

/// Canonical origin used to absolutize relative document links.
pub const SITE_ORIGIN: &str = "https://www.bseindia.com/";

pub const DEFAULT_STATE_PATH: &str = "db.json";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub state_path: PathBuf,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub telegram_api_base: String,
    pub run_once: bool,
    pub metrics_addr: Option<SocketAddr>,
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("state_path", &self.state_path)
            .field("poll_interval", &self.poll_interval)
            .field("http_timeout", &self.http_timeout)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("run_once", &self.run_once)
            .field("metrics_addr", &self.metrics_addr)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build configuration from any key lookup (env, map in tests, ...).
    ///
    /// `BOT_TOKEN` / `CHAT_ID` are required; the older `TELEGRAM_BOT_TOKEN` /
    /// `TELEGRAM_CHAT_ID` names are accepted as fallbacks.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or(ConfigError::Missing {
                name: "BOT_TOKEN",
                fallback: "TELEGRAM_BOT_TOKEN",
            })?;
        let chat_id = get("CHAT_ID")
            .or_else(|| get("TELEGRAM_CHAT_ID"))
            .ok_or(ConfigError::Missing {
                name: "CHAT_ID",
                fallback: "TELEGRAM_CHAT_ID",
            })?;

        let state_path = get("STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));

        let poll_secs = parse_secs(
            "POLL_INTERVAL_SECS",
            get("POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let timeout_secs = parse_secs(
            "HTTP_TIMEOUT_SECS",
            get("HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;

        let telegram_api_base = get("TELEGRAM_API_BASE")
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let run_once = get("RUN_ONCE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let metrics_addr = match get("METRICS_ADDR") {
            Some(v) => Some(v.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                name: "METRICS_ADDR",
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            bot_token,
            chat_id,
            state_path,
            poll_interval: Duration::from_secs(poll_secs),
            http_timeout: Duration::from_secs(timeout_secs),
            telegram_api_base,
            run_once,
            metrics_addr,
        })
    }
}

fn parse_secs(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}
