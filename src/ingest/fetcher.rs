// src/ingest/fetcher.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;

use crate::error::NetworkError;
use crate::ingest::types::PageSource;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const BROWSER_REFERER: &str = "https://www.bseindia.com/";

/// Headers that keep the disclosure site from bouncing us as a bot.
pub fn browser_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    h.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    h.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));
    h
}

/// GETs one page over HTTP(S).
pub struct HttpPageFetcher {
    url: String,
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        Self::with_headers(url, timeout, browser_headers())
    }

    pub fn with_headers(
        url: impl Into<String>,
        timeout: Duration,
        headers: HeaderMap,
    ) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(NetworkError::Client)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageFetcher {
    async fn fetch(&self) -> Result<String, NetworkError> {
        let resp = match self.client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                counter!("announce_fetch_errors_total").increment(1);
                return Err(NetworkError::Request {
                    url: self.url.clone(),
                    source: e,
                });
            }
        };

        let status = resp.status();
        if !status.is_success() {
            counter!("announce_fetch_errors_total").increment(1);
            return Err(NetworkError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| {
            counter!("announce_fetch_errors_total").increment(1);
            NetworkError::Body {
                url: self.url.clone(),
                source: e,
            }
        })?;

        tracing::debug!(target: "ingest", url = %self.url, bytes = body.len(), "page fetched");
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "bse-http"
    }
}
