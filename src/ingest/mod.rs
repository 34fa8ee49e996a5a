// src/ingest/mod.rs
pub mod extract;
pub mod fetcher;
pub mod types;

use std::collections::HashSet;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::error::AppError;
use crate::ingest::types::{AnnouncementRecord, PageSource};

pub use extract::extract;
pub use fetcher::HttpPageFetcher;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("announce_cycles_total", "Poll cycles started.");
        describe_counter!(
            "announce_fetch_errors_total",
            "Announcements page fetch failures."
        );
        describe_counter!(
            "announce_parse_errors_total",
            "Announcements page parse failures."
        );
        describe_counter!(
            "announce_records_found_total",
            "New announcements extracted (before delivery)."
        );
        describe_counter!("announce_sent_total", "Announcements delivered to the chat.");
        describe_counter!(
            "announce_send_errors_total",
            "Announcements whose delivery failed."
        );
        describe_counter!(
            "announce_persist_errors_total",
            "State file writes that failed."
        );
        describe_histogram!("announce_extract_ms", "Page extraction time in milliseconds.");
        describe_gauge!(
            "announce_last_cycle_ts",
            "Unix ts when the last poll cycle finished."
        );
    });
}

/// Fetch the page and extract records not yet in `known`.
pub async fn scan(
    source: &dyn PageSource,
    known: &HashSet<String>,
) -> Result<Vec<AnnouncementRecord>, AppError> {
    ensure_metrics_described();

    let markup = source.fetch().await?;
    let records = match extract(&markup, known) {
        Ok(r) => r,
        Err(e) => {
            counter!("announce_parse_errors_total").increment(1);
            return Err(e.into());
        }
    };
    counter!("announce_records_found_total").increment(records.len() as u64);
    Ok(records)
}
