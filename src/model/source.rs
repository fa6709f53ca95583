//! Source documents handed to the pipeline.

use std::path::Path;

use crate::detect::{mime_from_path, PDF_MIME};
use crate::error::Result;

/// An uploaded or fetched PDF before processing.
///
/// The pipeline takes a `SourceDocument` by value; the byte buffer is
/// dropped as soon as extraction finishes.
#[derive(Clone)]
pub struct SourceDocument {
    data: Vec<u8>,
    mime_type: String,
    name: String,
}

impl SourceDocument {
    /// Wrap raw bytes with their declared MIME type and original file name.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            name: name.into(),
        }
    }

    /// Wrap bytes already known to be a PDF.
    pub fn pdf(data: Vec<u8>, name: impl Into<String>) -> Self {
        Self::new(data, PDF_MIME, name)
    }

    /// Read a file from disk. The MIME type is inferred from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());
        Ok(Self::new(data, mime_from_path(path), name))
    }

    /// Raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Original file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}
