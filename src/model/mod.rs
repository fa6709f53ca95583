//! Data model: what goes into the pipeline and what comes out.

mod content;
mod source;

pub use content::{ExtractedContent, Grounding, PageImage, JPEG_DATA_URI_PREFIX};
pub use source::SourceDocument;
