pub mod telegram;

use crate::error::DeliveryError;
use crate::ingest::types::AnnouncementRecord;

pub use telegram::TelegramNotifier;

/// Delivers one announcement to the configured destination.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, record: &AnnouncementRecord) -> Result<(), DeliveryError>;
}

/// Message body in Telegram's legacy Markdown.
pub fn format_message(record: &AnnouncementRecord) -> String {
    format!(
        "📢 *New BSE Announcement*\n\n{}\n{}\n[Read PDF]({})",
        escape_markdown(&record.company_name),
        escape_markdown(&record.report_type),
        record.document_url
    )
}

/// Backslash-escape the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
