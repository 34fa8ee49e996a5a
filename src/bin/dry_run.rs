//! Fetch the announcements page once and print what would be sent.
//! Nothing is delivered and the state file is left untouched.

use anyhow::Context;
use bse_announce_notifier::config::{app::DEFAULT_STATE_PATH, ANN_URL};
use bse_announce_notifier::ingest::{self, HttpPageFetcher};
use bse_announce_notifier::notify::format_message;
use bse_announce_notifier::{telemetry, IdentifierStore, JsonFileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let state_path = std::env::var("STATE_PATH").unwrap_or_else(|_| DEFAULT_STATE_PATH.into());
    let store = JsonFileStore::load(&state_path)
        .await
        .with_context(|| format!("loading {state_path}"))?;
    let fetcher = HttpPageFetcher::new(ANN_URL, std::time::Duration::from_secs(30))?;

    let records = ingest::scan(&fetcher, store.known()).await?;
    for rec in &records {
        println!("--- {}\n{}\n", rec.identifier, format_message(rec));
    }
    println!("{} new announcement(s), {} already known", records.len(), store.known().len());
    Ok(())
}
