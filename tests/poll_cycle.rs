// tests/poll_cycle.rs
//
// Cycle-level behaviour with in-process fakes: no network, no disk.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bse_announce_notifier::error::{AppError, DeliveryError, NetworkError};
use bse_announce_notifier::store::MemoryStore;
use bse_announce_notifier::{AnnouncementRecord, IdentifierStore, Notifier, PageSource, Poller};

const ACME_PAGE: &str = r#"<html><body><table>
<tr><td>Acme Ltd</td><td>Board Meeting</td><td><a href="/doc/123.pdf">PDF</a></td></tr>
</table></body></html>"#;

const THREE_ROWS: &str = r#"<html><body><table>
<tr><td>Acme Ltd</td><td>Board Meeting</td><td><a href="/doc/1.pdf">PDF</a></td></tr>
<tr><td>Globex</td><td>Results</td><td><a href="/doc/2.pdf">PDF</a></td></tr>
<tr><td>Initech</td><td>Notice</td><td><a href="/doc/3.pdf">PDF</a></td></tr>
</table></body></html>"#;

enum Page {
    Html(&'static str),
    Down,
}

struct FakePage(Page);

#[async_trait]
impl PageSource for FakePage {
    async fn fetch(&self) -> Result<String, NetworkError> {
        match &self.0 {
            Page::Html(s) => Ok(s.to_string()),
            Page::Down => Err(NetworkError::Status {
                url: "https://www.bseindia.com/corporates/ann.html".into(),
                status: 503,
            }),
        }
    }
    fn name(&self) -> &'static str {
        "fake"
    }
}

/// First fetch takes `first_delay`; later ones return at once. Records
/// the (paused-clock) second at which each fetch started.
struct SlowFirstPage {
    origin: tokio::time::Instant,
    first_delay: Duration,
    starts: Mutex<Vec<u64>>,
}

impl SlowFirstPage {
    fn new(first_delay: Duration) -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            first_delay,
            starts: Mutex::new(vec![]),
        }
    }
    fn starts(&self) -> Vec<u64> {
        self.starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for SlowFirstPage {
    async fn fetch(&self) -> Result<String, NetworkError> {
        let first = {
            let mut starts = self.starts.lock().unwrap();
            starts.push(self.origin.elapsed().as_secs());
            starts.len() == 1
        };
        if first {
            tokio::time::sleep(self.first_delay).await;
        }
        Ok(ACME_PAGE.to_string())
    }
    fn name(&self) -> &'static str {
        "slow-first"
    }
}

/// Records every attempt; fails for identifiers listed in `fail_ids`.
#[derive(Default)]
struct RecordingNotifier {
    attempts: Mutex<Vec<String>>,
    fail_ids: Vec<&'static str>,
}

impl RecordingNotifier {
    fn failing_on(ids: &[&'static str]) -> Self {
        Self {
            attempts: Mutex::new(vec![]),
            fail_ids: ids.to_vec(),
        }
    }
    fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, record: &AnnouncementRecord) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(record.identifier.clone());
        if self.fail_ids.contains(&record.identifier.as_str()) {
            return Err(DeliveryError::Rejected {
                status: 400,
                description: "Bad Request: chat not found".into(),
            });
        }
        Ok(())
    }
}

#[tokio::test]
async fn new_record_is_sent_marked_and_persisted() {
    let mut p = Poller::new(
        FakePage(Page::Html(ACME_PAGE)),
        RecordingNotifier::default(),
        MemoryStore::new(),
    );

    let report = p.run_cycle().await.unwrap();
    assert_eq!((report.found, report.sent, report.failed), (1, 1, 0));
    assert!(report.persisted);

    let (_, notifier, store) = p.into_parts();
    assert_eq!(notifier.attempts(), vec!["123.pdf".to_string()]);
    assert!(store.known().contains("123.pdf"));
    assert_eq!(store.known().len(), 1);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn already_known_record_means_no_send_and_no_write() {
    let mut p = Poller::new(
        FakePage(Page::Html(ACME_PAGE)),
        RecordingNotifier::default(),
        MemoryStore::with_ids(["123.pdf"]),
    );

    let report = p.run_cycle().await.unwrap();
    assert_eq!((report.found, report.sent), (0, 0));
    assert!(!report.persisted);

    let (_, notifier, store) = p.into_parts();
    assert!(notifier.attempts().is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn fetch_failure_aborts_cycle_without_touching_store() {
    let mut p = Poller::new(
        FakePage(Page::Down),
        RecordingNotifier::default(),
        MemoryStore::with_ids(["old.pdf"]),
    );

    let err = p.run_cycle().await.unwrap_err();
    assert!(matches!(err, AppError::Network(NetworkError::Status { status: 503, .. })));

    // tick() swallows the error
    assert!(p.tick().await.is_none());

    let (_, notifier, store) = p.into_parts();
    assert!(notifier.attempts().is_empty());
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.known().len(), 1);
}

#[tokio::test]
async fn blank_page_is_a_parse_failure() {
    let mut p = Poller::new(
        FakePage(Page::Html("   ")),
        RecordingNotifier::default(),
        MemoryStore::new(),
    );
    let err = p.run_cycle().await.unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
    assert_eq!(p.store().write_count(), 0);
}

#[tokio::test]
async fn failed_send_does_not_block_others_or_get_marked() {
    let mut p = Poller::new(
        FakePage(Page::Html(THREE_ROWS)),
        RecordingNotifier::failing_on(&["2.pdf"]),
        MemoryStore::new(),
    );

    let report = p.run_cycle().await.unwrap();
    assert_eq!((report.found, report.sent, report.failed), (3, 2, 1));
    assert!(report.persisted);

    assert_eq!(
        p.store().sent_in_order().to_vec(),
        vec!["1.pdf".to_string(), "3.pdf".to_string()]
    );

    // Next cycle only retries the one that failed.
    let report = p.run_cycle().await.unwrap();
    assert_eq!((report.found, report.sent, report.failed), (1, 0, 1));
    assert!(!report.persisted);

    let (_, notifier, store) = p.into_parts();
    assert_eq!(notifier.attempts(), vec!["1.pdf", "2.pdf", "3.pdf", "2.pdf"]);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn all_sends_failing_skips_the_write() {
    let mut p = Poller::new(
        FakePage(Page::Html(ACME_PAGE)),
        RecordingNotifier::failing_on(&["123.pdf"]),
        MemoryStore::new(),
    );
    let report = p.run_cycle().await.unwrap();
    assert_eq!((report.found, report.sent, report.failed), (1, 0, 1));
    assert!(!report.persisted);
    assert_eq!(p.store().write_count(), 0);
    assert!(p.store().known().is_empty());
}

#[tokio::test]
async fn persist_failure_keeps_sends_in_memory() {
    let mut p = Poller::new(
        FakePage(Page::Html(ACME_PAGE)),
        RecordingNotifier::default(),
        MemoryStore::failing(),
    );

    let report = p.run_cycle().await.expect("persist failure must not abort the cycle");
    assert_eq!(report.sent, 1);
    assert!(!report.persisted);
    assert!(p.store().known().contains("123.pdf"));

    // The in-memory set still suppresses a re-send.
    let report = p.run_cycle().await.unwrap();
    assert_eq!(report.found, 0);
    let (_, notifier, store) = p.into_parts();
    assert_eq!(notifier.attempts().len(), 1);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn run_loop_fires_immediately_and_stops_on_shutdown() {
    let mut p = Poller::new(
        FakePage(Page::Html(ACME_PAGE)),
        RecordingNotifier::default(),
        MemoryStore::new(),
    );

    // Long interval: only the startup cycle can run before shutdown fires.
    let shutdown = tokio::time::sleep(std::time::Duration::from_millis(200));
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        p.run(std::time::Duration::from_secs(3600), shutdown),
    )
    .await
    .expect("loop should exit after shutdown");

    let (_, notifier, store) = p.into_parts();
    assert_eq!(notifier.attempts(), vec!["123.pdf".to_string()]);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_cycle_is_followed_by_one_cycle_not_a_burst() {
    let mut p = Poller::new(
        SlowFirstPage::new(Duration::from_secs(35)),
        RecordingNotifier::default(),
        MemoryStore::new(),
    );

    // Interval 10s; the first cycle overruns three ticks (10, 20, 30).
    let shutdown = tokio::time::sleep(Duration::from_secs(55));
    p.run(Duration::from_secs(10), shutdown).await;

    let (source, notifier, store) = p.into_parts();
    // One catch-up cycle at 35, then back on the 10s grid.
    assert_eq!(source.starts(), vec![0, 35, 40, 50]);
    assert_eq!(notifier.attempts(), vec!["123.pdf".to_string()]);
    assert_eq!(store.write_count(), 1);
}
