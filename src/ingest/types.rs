// src/ingest/types.rs
use crate::error::NetworkError;

/// One disclosure row from the announcements page.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct AnnouncementRecord {
    pub company_name: String,
    pub report_type: String,
    /// Absolute link to the PDF/XBRL document
    pub document_url: String,
    /// Last path segment of `document_url`, used as the dedup key
    pub identifier: String,
}

/// Something that yields the raw markup of the announcements page.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self) -> Result<String, NetworkError>;
    fn name(&self) -> &'static str;
}
