// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod poller;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::error::AppError;
pub use crate::ingest::types::{AnnouncementRecord, PageSource};
pub use crate::notify::{Notifier, TelegramNotifier};
pub use crate::poller::{CycleReport, Poller};
pub use crate::store::{IdentifierStore, JsonFileStore};

use anyhow::Context;

/// Wire the production components from `cfg`.
pub async fn build_poller(
    cfg: &AppConfig,
) -> anyhow::Result<Poller<ingest::HttpPageFetcher, TelegramNotifier, JsonFileStore>> {
    let fetcher = ingest::HttpPageFetcher::new(config::ANN_URL, cfg.http_timeout)
        .context("building page fetcher")?;
    let notifier = TelegramNotifier::new(cfg.bot_token.clone(), cfg.chat_id.clone())
        .with_api_base(cfg.telegram_api_base.clone())
        .with_timeout(cfg.http_timeout);
    let store = JsonFileStore::load(&cfg.state_path)
        .await
        .with_context(|| format!("loading state from {}", cfg.state_path.display()))?;

    tracing::info!(
        url = config::ANN_URL,
        state = %cfg.state_path.display(),
        known = store.known().len(),
        "poller ready"
    );
    Ok(Poller::new(fetcher, notifier, store))
}
