//! Error types for pdfground.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pdfground operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while turning a PDF into grounding content.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The selected file is not a PDF. Extraction is never attempted.
    #[error("Unsupported file type '{0}': please upload a PDF file")]
    InvalidInputType(String),

    /// The file exceeds the configured size limit.
    #[error("File is {size} bytes, larger than the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    /// The byte buffer cannot be opened as a PDF at all.
    #[error("PDF parsing error: {0}")]
    DocumentParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A single page could not be parsed. Recovered by the extractor.
    #[error("Page {page} could not be parsed: {reason}")]
    PageParse { page: u32, reason: String },

    /// A single page could not be rasterized. Recovered by the renderer.
    #[error("Page {page} could not be rendered: {reason}")]
    PageRender { page: u32, reason: String },

    /// Neither usable text nor any page image came out of the document.
    #[error(
        "No usable content: {text_chars} characters of text (need {threshold}) and no page images"
    )]
    ExtractionInsufficient { text_chars: usize, threshold: usize },

    /// Extraction took longer than the configured wall-clock limit.
    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    /// Fetching a remote document failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error is a per-page failure that callers recover from.
    pub fn is_page_level(&self) -> bool {
        matches!(self, Error::PageParse { .. } | Error::PageRender { .. })
    }

    /// Message suitable for showing to the person who uploaded the file.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidInputType(_) => "Please upload a PDF file.".to_string(),
            Error::FileTooLarge { limit, .. } => format!(
                "This PDF is too large. Please upload a file under {} MB.",
                limit / (1024 * 1024)
            ),
            Error::DocumentParse(_) | Error::Io(_) => {
                "Failed to process PDF. Please try again or choose another file.".to_string()
            }
            Error::Encrypted => {
                "This PDF is password-protected. Please upload an unlocked copy.".to_string()
            }
            Error::ExtractionInsufficient { .. } => {
                "Unable to read this PDF. Please upload a different PDF.".to_string()
            }
            Error::Timeout(_) => {
                "Processing this PDF took too long. Please try a smaller file.".to_string()
            }
            Error::Fetch(_) => "Could not download this book. Please try again.".to_string(),
            Error::PageParse { .. } | Error::PageRender { .. } | Error::Config(_) => {
                self.to_string()
            }
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::DocumentParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
