use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{format_message, Notifier};
use crate::error::DeliveryError;
use crate::ingest::types::AnnouncementRecord;

/// Longest `retry_after` we are willing to sleep inside a cycle.
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// Telegram Bot API `sendMessage` client bound to one chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            api_base: crate::config::app::DEFAULT_TELEGRAM_API_BASE.to_string(),
            token,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Point at a different Bot API host (self-hosted server, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retries apply only to 429 responses.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    pub async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };
        let url = self.endpoint();

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let rsp = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await
                // The request URL carries the bot token.
                .map_err(|e| DeliveryError::Http(e.without_url()))?;

            let status = rsp.status();
            // Bot API error bodies carry the reason; tolerate non-JSON bodies.
            let body: ApiResponse = rsp.json().await.unwrap_or_default();

            if status.is_success() && body.ok {
                return Ok(());
            }

            let description = body
                .description
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = body
                        .parameters
                        .and_then(|p| p.retry_after)
                        .unwrap_or(1);
                    if attempt <= self.max_retries {
                        tracing::warn!(retry_after, attempt, "telegram rate limited, backing off");
                        let secs = retry_after.min(MAX_RETRY_AFTER_SECS);
                        tokio::time::sleep(Duration::from_secs(secs)).await;
                        continue;
                    }
                    return Err(DeliveryError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(DeliveryError::Unauthorized {
                        status: status.as_u16(),
                        description,
                    });
                }
                _ => {
                    return Err(DeliveryError::Rejected {
                        status: status.as_u16(),
                        description,
                    });
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, record: &AnnouncementRecord) -> Result<(), DeliveryError> {
        self.send_text(&format_message(record)).await
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}
