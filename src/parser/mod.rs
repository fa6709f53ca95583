//! PDF parsing: document access and text extraction.

mod backend;
mod text;

pub use backend::{
    decode_text_simple, get_number_from_value, ContentOp, FormXObject, LopdfBackend, ObjectRef,
    PageId, PdfBackend, PdfValue, ResourceScope, XObject,
};
pub use text::{page_marker, RawText, TextExtractor};
