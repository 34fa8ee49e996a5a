//! Error taxonomy for the notifier.
//!
//! Only [`ConfigError`] (and a state file that cannot be loaded at startup) is
//! fatal. Everything else is caught at the cycle boundary and logged.

use std::path::PathBuf;

use thiserror::Error;

/// Missing or malformed startup configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable absent or blank
    #[error("missing required environment variable {name} (also checked {fallback})")]
    Missing {
        name: &'static str,
        fallback: &'static str,
    },

    /// Variable present but not usable
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Fetching the disclosures page failed.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection, TLS or timeout failure
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body could not be read
    #[error("reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Client construction failed
    #[error("building HTTP client failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// Markup could not be turned into a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("page body is empty")]
    EmptyDocument,

    #[error("invalid selector {selector:?}: {reason}")]
    Selector {
        selector: &'static str,
        reason: String,
    },

    #[error("invalid site origin {0}")]
    Origin(String),
}

/// Sending one message to the chat failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport failure talking to the Bot API
    #[error("sendMessage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Token rejected
    #[error("bot token rejected (HTTP {status}): {description}")]
    Unauthorized { status: u16, description: String },

    /// Rate limited and out of retries
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Bot API answered with `ok: false` or a non-2xx status
    #[error("Bot API rejected message (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Reading or writing the state file failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("reading state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("writing state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can abort a cycle or startup.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
