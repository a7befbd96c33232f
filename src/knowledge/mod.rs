//! Company knowledge lookups: acronyms, topic owners, documents, and the
//! static company/HR/IT answer tables.
//!
//! The lookup tables are JSON files in the data directory, re-read on every
//! call so edits take effect without a restart. A missing file is an empty
//! table.

pub mod faq;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::KnowledgeError;

pub const ACRONYMS_FILE: &str = "acronyms.json";
pub const CONTACTS_FILE: &str = "contacts.json";
pub const DOCS_FILE: &str = "docs.json";

/// Default number of hits returned by [`KnowledgeBase::find_docs`].
pub const DEFAULT_DOC_LIMIT: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct AcronymEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactEntry {
    pub topic: String,
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocEntry {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Counts successful knowledge lookups, reported by `/health`.
#[derive(Debug, Default)]
pub struct ToolMetrics {
    tool_calls: AtomicU64,
}

impl ToolMetrics {
    pub fn record_hit(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tool_calls(&self) -> u64 {
        self.tool_calls.load(Ordering::Relaxed)
    }
}

/// Read-only lookups over the data directory.
pub struct KnowledgeBase {
    data_dir: PathBuf,
    metrics: Arc<ToolMetrics>,
}

impl KnowledgeBase {
    pub fn new(data_dir: impl Into<PathBuf>, metrics: Arc<ToolMetrics>) -> Self {
        Self {
            data_dir: data_dir.into(),
            metrics,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn metrics(&self) -> &Arc<ToolMetrics> {
        &self.metrics
    }

    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, KnowledgeError> {
        let path = self.data_dir.join(file);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file, "Knowledge file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(KnowledgeError::Read {
                    file: path.display().to_string(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| KnowledgeError::Parse {
            file: path.display().to_string(),
            source,
        })
    }

    /// Meaning of a company acronym, matched case-insensitively.
    pub async fn acronym_meaning(&self, key: &str) -> Result<String, KnowledgeError> {
        let rows: Vec<AcronymEntry> = self.load(ACRONYMS_FILE).await?;
        let wanted = key.trim().to_lowercase();
        match rows.iter().find(|row| row.key.to_lowercase() == wanted) {
            Some(row) => {
                self.metrics.record_hit();
                Ok(format!("{} = {}", row.key, row.value))
            }
            None => Ok(format!(
                "No entry for '{key}'. Try common ones like 'SFSF', 'S4H', 'EC', 'BTP'."
            )),
        }
    }

    /// Owner of the first contact whose topic contains `topic`.
    pub async fn who_to_ask(&self, topic: &str) -> Result<String, KnowledgeError> {
        let rows: Vec<ContactEntry> = self.load(CONTACTS_FILE).await?;
        let wanted = topic.trim().to_lowercase();
        match rows
            .iter()
            .find(|row| row.topic.to_lowercase().contains(&wanted))
        {
            Some(row) => {
                self.metrics.record_hit();
                Ok(format!(
                    "{}: {} ({})",
                    title_case(&row.topic),
                    row.name,
                    row.contact.as_deref().unwrap_or("n/a")
                ))
            }
            None => Ok(format!(
                "I couldn't find an owner for '{topic}'—try topics like 'dummy data', 'sandbox', 'training', or 'onboarding'."
            )),
        }
    }

    /// Up to `limit` documents whose title or a tag contains `query`, one
    /// `- title — link` line each.
    pub async fn find_docs(&self, query: &str, limit: usize) -> Result<String, KnowledgeError> {
        let rows: Vec<DocEntry> = self.load(DOCS_FILE).await?;
        let wanted = query.trim().to_lowercase();
        let hits: Vec<String> = rows
            .iter()
            .filter(|row| {
                row.title.to_lowercase().contains(&wanted)
                    || row.tags.iter().any(|t| t.to_lowercase().contains(&wanted))
            })
            .take(limit)
            .map(|row| format!("- {} — {}", row.title, row.link))
            .collect();

        if hits.is_empty() {
            return Ok(format!(
                "No docs matched '{query}'. Try terms like 'SAP GUI', 'installation', 'training', or 'setup'."
            ));
        }
        self.metrics.record_hit();
        Ok(hits.join("\n"))
    }
}

/// Capitalize the first letter of every word, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
