//! # pdfground
//!
//! Turns an uploaded PDF into grounding content for AI features: cleaned
//! text, and page images when the text layer is too sparse to be useful.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfground::{extract_file, ExtractionConfig};
//!
//! fn main() -> pdfground::Result<()> {
//!     let content = extract_file("polity.pdf", ExtractionConfig::default())?;
//!     let grounding = content.into_grounding();
//!
//!     println!("{} chars, {} page images", grounding.text.len(), grounding.images.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Page markers**: `--- Page N ---` before each page's text
//! - **Bounded work**: page caps, character budget, raster size cap, timeout
//! - **Vision fallback**: scanned pages rendered to JPEG data URIs
//! - **Named profiles**: upload, library and utility settings
//! - **Session state**: stale extraction results never overwrite newer ones

pub mod config;
pub mod deadline;
pub mod detect;
pub mod error;
#[cfg(feature = "remote")]
pub mod fetch;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod session;

pub use config::{ExtractionConfig, ExtractionProfile, RenderStrategy, ScalePolicy};
pub use detect::{check_mime, detect_format_from_bytes, detect_format_from_path, PdfFormat, PDF_MIME};
pub use error::{Error, Result};
pub use model::{ExtractedContent, Grounding, PageImage, SourceDocument};
pub use pipeline::Extractor;
pub use render::{CharPolicy, CleanupOptions, CleanupPreset, TextCleaner};
pub use session::{DocumentInfo, DocumentSession, ExtractionTicket, SessionState};

use std::path::Path;

/// Extract grounding content from PDF bytes.
///
/// # Example
///
/// ```no_run
/// use pdfground::{extract_bytes, ExtractionConfig};
///
/// let data = std::fs::read("scan.pdf").unwrap();
/// let content = extract_bytes(data, "scan.pdf", ExtractionConfig::default()).unwrap();
/// assert!(content.page_count_estimate >= 1);
/// ```
pub fn extract_bytes(
    data: Vec<u8>,
    name: impl Into<String>,
    config: ExtractionConfig,
) -> Result<ExtractedContent> {
    Extractor::new(config).extract(SourceDocument::pdf(data, name))
}

/// Extract grounding content from a file. The MIME type is taken from the
/// extension, so non-PDF files are rejected before being parsed.
pub fn extract_file<P: AsRef<Path>>(path: P, config: ExtractionConfig) -> Result<ExtractedContent> {
    Extractor::new(config).extract(SourceDocument::from_path(path)?)
}

/// Clean text with the standard cleanup options.
///
/// # Example
///
/// ```
/// assert_eq!(pdfground::clean_text("  ﬁnal\r\n\r\n\r\nanswer "), "final\n\nanswer");
/// ```
pub fn clean_text(text: &str) -> String {
    TextCleaner::default().clean(text)
}
