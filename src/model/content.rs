//! Extraction output and the value handed to chat, evaluation and quiz features.

use serde::{Deserialize, Serialize};

/// Prefix of every page image payload.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// One rasterized page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// Source page number (1-indexed)
    pub page_number: u32,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
}

impl PageImage {
    /// Base64 payload without the data URI prefix.
    pub fn base64_payload(&self) -> &str {
        self.data_uri
            .strip_prefix(JPEG_DATA_URI_PREFIX)
            .unwrap_or(&self.data_uri)
    }
}

/// Result of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Cleaned text (may be empty when images carry the content)
    pub text: String,

    /// Rendered pages in ascending page order
    pub images: Vec<PageImage>,

    /// Rough page count (image count, or derived from byte size)
    pub page_count_estimate: u32,

    /// Page count reported by the document itself
    pub total_pages: u32,

    /// Pages walked for text
    pub pages_scanned: u32,

    /// Whether the character budget cut the text short
    pub truncated: bool,

    /// Whether the text was sparse and the page-image fallback ran. A
    /// successful result with this set always carries images.
    pub rendered: bool,

    /// Original file name
    pub source_name: String,

    /// Original size in bytes
    pub source_size: u64,
}

impl ExtractedContent {
    /// Character count of the trimmed text.
    pub fn text_chars(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// Whether the text alone clears `min_text_threshold`.
    pub fn has_sufficient_text(&self, min_text_threshold: usize) -> bool {
        self.text_chars() >= min_text_threshold
    }

    /// Borrow the image payloads in page order.
    pub fn image_uris(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|i| i.data_uri.as_str())
    }

    /// The consumer view: text plus image payloads, nothing else.
    pub fn grounding(&self) -> Grounding {
        Grounding {
            text: self.text.clone(),
            images: self.image_uris().map(String::from).collect(),
        }
    }

    /// Consume into the consumer view.
    pub fn into_grounding(self) -> Grounding {
        Grounding {
            text: self.text,
            images: self.images.into_iter().map(|i| i.data_uri).collect(),
        }
    }
}

/// What downstream features receive. They never see the PDF itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grounding {
    /// Cleaned document text
    pub text: String,
    /// Page images as data URIs, page order
    pub images: Vec<String>,
}

impl Grounding {
    /// Whether there is enough content to start a conversation.
    pub fn is_usable(&self, min_text_threshold: usize) -> bool {
        self.text.trim().chars().count() >= min_text_threshold || !self.images.is_empty()
    }

    /// Whether the vision fallback should be used.
    pub fn uses_images(&self) -> bool {
        !self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str, images: usize) -> ExtractedContent {
        ExtractedContent {
            text: text.to_string(),
            images: (1..=images as u32)
                .map(|n| PageImage {
                    page_number: n,
                    width: 10,
                    height: 10,
                    data_uri: format!("{}AAAA{}", JPEG_DATA_URI_PREFIX, n),
                })
                .collect(),
            page_count_estimate: 1,
            total_pages: 1,
            pages_scanned: 1,
            truncated: false,
            rendered: images > 0,
            source_name: "a.pdf".into(),
            source_size: 10,
        }
    }

    #[test]
    fn test_grounding_keeps_order() {
        let grounding = content("", 3).into_grounding();
        assert_eq!(grounding.images.len(), 3);
        assert!(grounding.images[0].ends_with("AAAA1"));
        assert!(grounding.images[2].ends_with("AAAA3"));
        assert!(grounding.uses_images());
    }

    #[test]
    fn test_usable() {
        assert!(content(&"x".repeat(400), 0).grounding().is_usable(400));
        assert!(!content(&"x".repeat(399), 0).grounding().is_usable(400));
        assert!(content("", 1).grounding().is_usable(400));
        assert!(!Grounding::default().is_usable(1));
    }

    #[test]
    fn test_text_chars_counts_characters() {
        let c = content("  éé  ", 0);
        assert_eq!(c.text_chars(), 2);
        assert!(c.has_sufficient_text(2));
        assert!(!c.has_sufficient_text(3));
    }

    #[test]
    fn test_base64_payload() {
        let c = content("", 1);
        assert_eq!(c.images[0].base64_payload(), "AAAA1");
    }
}
