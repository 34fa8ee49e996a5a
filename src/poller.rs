//! # Poll loop
//! Drives `fetch → extract → notify → persist` on a fixed interval.
//!
//! Cycles run inline on the calling task, so two cycles can never overlap;
//! ticks that elapse while a slow cycle is still running are skipped rather
//! than queued.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::ingest::{self, types::PageSource};
use crate::notify::Notifier;
use crate::store::IdentifierStore;

/// Outcome of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub found: usize,
    pub sent: usize,
    pub failed: usize,
    pub persisted: bool,
    pub finished_at: DateTime<Utc>,
}

pub struct Poller<P, N, S> {
    source: P,
    notifier: N,
    store: S,
}

impl<P, N, S> Poller<P, N, S>
where
    P: PageSource,
    N: Notifier,
    S: IdentifierStore,
{
    pub fn new(source: P, notifier: N, store: S) -> Self {
        Self {
            source,
            notifier,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (P, N, S) {
        (self.source, self.notifier, self.store)
    }

    /// One full cycle. Fetch and parse failures abort it before any send;
    /// delivery and persistence failures are absorbed and reported.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, AppError> {
        counter!("announce_cycles_total").increment(1);

        let records = ingest::scan(&self.source, self.store.known()).await?;
        let found = records.len();

        let mut sent = 0usize;
        let mut failed = 0usize;
        for rec in &records {
            match self.notifier.send(rec).await {
                Ok(()) => {
                    self.store.mark_sent(&rec.identifier);
                    sent += 1;
                    counter!("announce_sent_total").increment(1);
                    tracing::info!(
                        id = %rec.identifier,
                        company = %rec.company_name,
                        kind = %rec.report_type,
                        "announcement sent"
                    );
                }
                Err(e) => {
                    failed += 1;
                    counter!("announce_send_errors_total").increment(1);
                    tracing::warn!(id = %rec.identifier, error = %e, "announcement delivery failed");
                }
            }
        }

        let mut persisted = false;
        if sent > 0 {
            match self.store.persist().await {
                Ok(()) => persisted = true,
                Err(e) => {
                    counter!("announce_persist_errors_total").increment(1);
                    tracing::warn!(error = %e, "state persist failed; will retry after next send");
                }
            }
        }

        let finished_at = Utc::now();
        gauge!("announce_last_cycle_ts").set(finished_at.timestamp() as f64);

        Ok(CycleReport {
            found,
            sent,
            failed,
            persisted,
            finished_at,
        })
    }

    /// Run a cycle and log its outcome. Never fails.
    pub async fn tick(&mut self) -> Option<CycleReport> {
        match self.run_cycle().await {
            Ok(report) => {
                tracing::info!(
                    source = self.source.name(),
                    found = report.found,
                    sent = report.sent,
                    failed = report.failed,
                    persisted = report.persisted,
                    "cycle finished"
                );
                Some(report)
            }
            Err(e) => {
                tracing::warn!(source = self.source.name(), error = %e, "cycle aborted");
                None
            }
        }
    }

    /// Cycle immediately, then every `interval` until `shutdown` resolves.
    /// A cycle in flight when `shutdown` fires is allowed to finish.
    pub async fn run<F>(&mut self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, poll loop exiting");
                    break;
                }
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }
    }
}
