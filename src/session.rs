//! Per-conversation document state with protection against stale results.
//!
//! A chat view loads one document at a time. If the user picks a new file
//! (or clears the current one) while an extraction is still running, the
//! late result must not replace the newer state. Every extraction therefore
//! carries an [`ExtractionTicket`] whose generation is compared on commit.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Result;
use crate::model::{ExtractedContent, Grounding};

/// Metadata about the loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size: u64,
    pub page_count_estimate: u32,
    pub loaded_at: DateTime<Utc>,
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No document.
    Empty,
    /// An extraction for `name` is running.
    Extracting { name: String },
    /// Content is ready for grounding.
    Ready {
        info: DocumentInfo,
        grounding: Grounding,
    },
    /// The last extraction failed with a user-facing message.
    Failed { name: String, message: String },
}

/// Proof that an extraction was started; required to commit its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTicket {
    generation: u64,
    name: String,
}

impl ExtractionTicket {
    /// File name the extraction was started for.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct Inner {
    generation: u64,
    state: SessionState,
}

/// Document state for one conversation. Share it with `Arc`.
#[derive(Debug)]
pub struct DocumentSession {
    inner: Mutex<Inner>,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                generation: 0,
                state: SessionState::Empty,
            }),
        }
    }

    /// Start an extraction. Any earlier ticket becomes stale.
    pub fn begin(&self, name: impl Into<String>) -> ExtractionTicket {
        let name = name.into();
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = SessionState::Extracting { name: name.clone() };
        log::debug!("Session generation {}: extracting '{}'", inner.generation, name);
        ExtractionTicket {
            generation: inner.generation,
            name,
        }
    }

    /// Apply an extraction result.
    ///
    /// Returns `false`, leaving the state untouched, when the ticket is no
    /// longer current.
    pub fn commit(&self, ticket: &ExtractionTicket, result: Result<ExtractedContent>) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.generation {
            log::debug!(
                "Dropping stale result for '{}' (generation {} < {})",
                ticket.name,
                ticket.generation,
                inner.generation
            );
            return false;
        }

        inner.state = match result {
            Ok(content) => SessionState::Ready {
                info: DocumentInfo {
                    name: content.source_name.clone(),
                    size: content.source_size,
                    page_count_estimate: content.page_count_estimate,
                    loaded_at: Utc::now(),
                },
                grounding: content.into_grounding(),
            },
            Err(e) => {
                log::warn!("Extraction of '{}' failed: {}", ticket.name, e);
                SessionState::Failed {
                    name: ticket.name.clone(),
                    message: e.user_message(),
                }
            }
        };
        true
    }

    /// Drop the document. In-flight extractions become stale.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = SessionState::Empty;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// Grounding content, only when a document is ready.
    pub fn grounding(&self) -> Option<Grounding> {
        match &self.inner.lock().state {
            SessionState::Ready { grounding, .. } => Some(grounding.clone()),
            _ => None,
        }
    }

    /// Info about the ready document.
    pub fn document_info(&self) -> Option<DocumentInfo> {
        match &self.inner.lock().state {
            SessionState::Ready { info, .. } => Some(info.clone()),
            _ => None,
        }
    }

    /// Whether an extraction is running.
    pub fn is_extracting(&self) -> bool {
        matches!(self.inner.lock().state, SessionState::Extracting { .. })
    }

    /// Begin, extract on the blocking pool, commit. Returns whether the
    /// result was applied.
    #[cfg(feature = "async")]
    pub async fn load(
        &self,
        source: crate::model::SourceDocument,
        extractor: &crate::pipeline::Extractor,
    ) -> bool {
        let ticket = self.begin(source.name());
        let result = extractor.extract_async(source).await;
        self.commit(&ticket, result)
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}
