//! Durable set of identifiers that were already announced.
//!
//! The on-disk document is `{"lastSent": [...]}`; any other top-level fields
//! found in an existing file are carried through rewrites untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StateDoc {
    #[serde(rename = "lastSent", default)]
    pub last_sent: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[async_trait::async_trait]
pub trait IdentifierStore: Send {
    fn known(&self) -> &HashSet<String>;
    /// Record a confirmed send (in memory only).
    fn mark_sent(&mut self, id: &str);
    /// Flush the current set to durable storage.
    async fn persist(&mut self) -> Result<(), PersistenceError>;
}

/// Shared in-memory bookkeeping for both store flavours.
#[derive(Debug, Default)]
struct Ledger {
    doc: StateDoc,
    index: HashSet<String>,
}

impl Ledger {
    fn from_doc(doc: StateDoc) -> Self {
        let index = doc.last_sent.iter().cloned().collect();
        Self { doc, index }
    }

    fn mark(&mut self, id: &str) {
        if self.index.insert(id.to_string()) {
            self.doc.last_sent.push(id.to_string());
        }
    }
}

/// JSON file store (`db.json` by default).
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    ledger: Ledger,
}

impl JsonFileStore {
    /// Load from `path`; a missing file starts an empty set.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => StateDoc::default(),
            Ok(s) => serde_json::from_str(&s).map_err(|source| PersistenceError::Decode {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no state file yet, starting empty");
                StateDoc::default()
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };
        Ok(Self {
            path,
            ledger: Ledger::from_doc(doc),
        })
    }

    pub fn doc(&self) -> &StateDoc {
        &self.ledger.doc
    }
}

#[async_trait::async_trait]
impl IdentifierStore for JsonFileStore {
    fn known(&self) -> &HashSet<String> {
        &self.ledger.index
    }

    fn mark_sent(&mut self, id: &str) {
        self.ledger.mark(id);
    }

    async fn persist(&mut self) -> Result<(), PersistenceError> {
        let bytes =
            serde_json::to_vec_pretty(&self.ledger.doc).map_err(PersistenceError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PersistenceError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Write-then-rename: the file on disk is always a complete document.
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| PersistenceError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), ids = self.ledger.doc.last_sent.len(), "state persisted");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// --- Test helper ---
/// Store that never touches disk and counts `persist` calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Ledger,
    pub writes: AtomicUsize,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let doc = StateDoc {
            last_sent: ids.into_iter().map(Into::into).collect(),
            extra: Default::default(),
        };
        Self {
            ledger: Ledger::from_doc(doc),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn sent_in_order(&self) -> &[String] {
        &self.ledger.doc.last_sent
    }
}

#[async_trait::async_trait]
impl IdentifierStore for MemoryStore {
    fn known(&self) -> &HashSet<String> {
        &self.ledger.index
    }

    fn mark_sent(&mut self, id: &str) {
        self.ledger.mark(id);
    }

    async fn persist(&mut self) -> Result<(), PersistenceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(PersistenceError::Write {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "simulated write failure"),
            });
        }
        Ok(())
    }
}
