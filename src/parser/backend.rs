//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from text extraction.

use std::collections::BTreeMap;

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};

/// Object identifier: (object number, generation number).
pub type ObjectRef = (u32, u16);

/// Page identifier.
pub type PageId = ObjectRef;

/// Depth limit for page-tree and resource inheritance walks.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Where XObject names are resolved: the page, or a form XObject's own
/// resource dictionary (falling back to the page's).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceScope {
    pub page: PageId,
    pub form: Option<ObjectRef>,
}

impl ResourceScope {
    pub fn page(page: PageId) -> Self {
        Self { page, form: None }
    }
}

/// A form XObject: a reusable content stream.
#[derive(Debug, Clone)]
pub struct FormXObject {
    pub id: ObjectRef,
    pub content: Vec<u8>,
}

/// A named XObject resolved from a resource dictionary.
#[derive(Debug, Clone)]
pub enum XObject {
    Form(FormXObject),
    /// Images and anything else that carries no text.
    Other,
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, content stream decoding,
/// text decoding and form XObject lookup without exposing any concrete PDF
/// library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Resolve a named XObject.
    fn xobject(&self, scope: ResourceScope, name: &[u8]) -> Result<XObject>;

    /// Number of pages.
    fn page_count(&self) -> u32 {
        self.pages().len() as u32
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    // Try UTF-8
    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend: the lopdf-backed implementation
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object};

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
///
/// The backend owns the parsed document; dropping it releases everything.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    ///
    /// The header is checked first so that obviously foreign data fails
    /// fast, before lopdf attempts xref recovery.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data)?;

        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            lopdf::Error::IO(io) => Error::DocumentParse(io.to_string()),
            _ => Error::from(e),
        })?;

        if doc.is_encrypted() {
            log::warn!("Document is encrypted; extracted content may be incomplete");
        }
        if doc.get_pages().is_empty() {
            return Err(Error::DocumentParse("document has no pages".to_string()));
        }

        Ok(Self { doc })
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Follow a reference (if any) to a dictionary.
    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Dictionary(d) => Some(d),
            Object::Reference(r) => match self.doc.get_object(*r).ok()? {
                Object::Dictionary(d) => Some(d),
                Object::Stream(s) => Some(&s.dict),
                _ => None,
            },
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Follow a reference (if any) to an arbitrary object.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Look up an inheritable page attribute, walking up the page tree.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn xobject_dict<'a>(&'a self, resources: &'a Dictionary) -> Option<&'a Dictionary> {
        self.resolve_dict(resources.get(b"XObject").ok()?)
    }

    fn lookup_xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<ObjectRef> {
        if let Some(form_id) = scope.form {
            let found = self
                .doc
                .get_object(form_id)
                .ok()
                .and_then(|o| o.as_stream().ok())
                .and_then(|s| s.dict.get(b"Resources").ok())
                .and_then(|r| self.resolve_dict(r))
                .and_then(|r| self.xobject_dict(r))
                .and_then(|x| x.get(name).ok())
                .and_then(|o| o.as_reference().ok());
            if found.is_some() {
                return found;
            }
        }

        let resources = self.resolve_dict(self.inherited(scope.page, b"Resources")?)?;
        self.xobject_dict(resources)?
            .get(name)
            .ok()?
            .as_reference()
            .ok()
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::DocumentParse(e.to_string()))?;

        // A page without /Contents is blank, not broken.
        let contents = match page_dict.get(b"Contents") {
            Ok(c) => c,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => s
                    .decompressed_content()
                    .or_else(|e| {
                        // Unfiltered streams have nothing to decompress.
                        if s.dict.get(b"Filter").is_err() {
                            Ok(s.content.clone())
                        } else {
                            Err(e)
                        }
                    })
                    .map_err(|e| Error::DocumentParse(e.to_string())),
                Ok(Object::Array(arr)) => self.concat_streams(arr),
                _ => Err(Error::DocumentParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => self.concat_streams(arr),
            _ => Err(Error::DocumentParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)
            .map_err(|e| Error::DocumentParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn xobject(&self, scope: ResourceScope, name: &[u8]) -> Result<XObject> {
        let id = self.lookup_xobject(scope, name).ok_or_else(|| {
            Error::DocumentParse(format!(
                "XObject /{} not found",
                String::from_utf8_lossy(name)
            ))
        })?;

        let stream = self
            .doc
            .get_object(id)
            .and_then(|o| o.as_stream())
            .map_err(|e| Error::DocumentParse(e.to_string()))?;

        match stream.dict.get(b"Subtype").ok().and_then(|s| s.as_name().ok()) {
            Some(b"Form") => {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                Ok(XObject::Form(FormXObject { id, content }))
            }
            _ => Ok(XObject::Other),
        }
    }
}

impl LopdfBackend {
    fn concat_streams(&self, arr: &[Object]) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for obj in arr {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    if let Ok(data) = s.decompressed_content() {
                        content.extend_from_slice(&data);
                    } else if s.dict.get(b"Filter").is_err() {
                        content.extend_from_slice(&s.content);
                    }
                    content.push(b' ');
                }
            }
        }
        Ok(content)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}
