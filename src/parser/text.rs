//! Page-by-page text extraction with page markers and a character budget.

use crate::config::ExtractionConfig;
use crate::deadline::{self, Deadline};
use crate::error::{Error, Result};

use super::backend::{get_number_from_value, ContentOp, PdfBackend, PdfValue, ResourceScope};

/// Nesting limit for form XObjects.
const MAX_FORM_DEPTH: u8 = 8;

/// TJ adjustments more negative than this (thousandths of an em) read as a
/// word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Uncleaned text of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    /// Marker-delimited page text, at most `max_chars` characters
    pub text: String,
    /// Pages attempted (including skipped ones)
    pub pages_scanned: u32,
    /// Pages in the document
    pub total_pages: u32,
    /// Pages whose content could not be parsed
    pub skipped_pages: Vec<u32>,
    /// Whether the character budget cut extraction short
    pub truncated: bool,
}

/// Page marker placed before each page's text.
pub fn page_marker(page_num: u32) -> String {
    format!("--- Page {} ---\n", page_num)
}

/// Walks pages in order and concatenates their text runs.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    max_pages: u32,
    max_chars: usize,
}

impl TextExtractor {
    /// Create an extractor with explicit limits.
    pub fn new(max_pages: u32, max_chars: usize) -> Self {
        Self {
            max_pages,
            max_chars,
        }
    }

    /// Create an extractor from the pipeline config.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.max_pages_text, config.max_text_chars)
    }

    /// Extract text from up to `max_pages` pages.
    ///
    /// A page that fails to parse is logged and skipped. Only the deadline
    /// aborts the walk.
    pub fn extract<B: PdfBackend>(&self, backend: &B, deadline: Option<&Deadline>) -> Result<RawText> {
        let pages = backend.pages();
        let mut raw = RawText {
            total_pages: pages.len() as u32,
            ..RawText::default()
        };
        let mut char_count = 0usize;

        for (&page_num, &page_id) in pages.iter().take(self.max_pages as usize) {
            deadline::check(deadline)?;
            raw.pages_scanned += 1;

            let page_text = match self.page_text(backend, page_num, page_id) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Skipping page {}: {}", page_num, e);
                    raw.skipped_pages.push(page_num);
                    continue;
                }
            };

            if page_text.trim().is_empty() {
                continue;
            }

            let chunk = format!("{}{}\n\n", page_marker(page_num), page_text);
            char_count += chunk.chars().count();
            raw.text.push_str(&chunk);

            if char_count > self.max_chars {
                raw.truncated = true;
                break;
            }
        }

        if raw.truncated {
            if let Some((idx, _)) = raw.text.char_indices().nth(self.max_chars) {
                raw.text.truncate(idx);
            }
        }

        log::debug!(
            "Extracted {} chars from {}/{} pages ({} skipped{})",
            raw.text.chars().count(),
            raw.pages_scanned,
            raw.total_pages,
            raw.skipped_pages.len(),
            if raw.truncated { ", truncated" } else { "" }
        );

        Ok(raw)
    }

    /// Text runs of one page, joined with single spaces.
    pub fn page_text<B: PdfBackend>(
        &self,
        backend: &B,
        page_num: u32,
        page_id: super::backend::PageId,
    ) -> Result<String> {
        let page_error = |e: Error| Error::PageParse {
            page: page_num,
            reason: e.to_string(),
        };

        let content = backend.page_content(page_id).map_err(page_error)?;
        let ops = backend.decode_content(&content).map_err(page_error)?;

        let mut runs = Vec::new();
        collect_runs(backend, &ops, ResourceScope::page(page_id), 0, &mut runs);
        Ok(runs.join(" "))
    }
}

/// Collect text runs in content-stream order, descending into form XObjects.
fn collect_runs<B: PdfBackend>(
    backend: &B,
    ops: &[ContentOp],
    scope: ResourceScope,
    depth: u8,
    runs: &mut Vec<String>,
) {
    let mut font: Vec<u8> = Vec::new();

    for op in ops {
        match op.operator.as_str() {
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    font = name.clone();
                }
            }
            "Tj" | "'" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    push_run(runs, backend.decode_text(scope.page, &font, bytes));
                }
            }
            "\"" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    push_run(runs, backend.decode_text(scope.page, &font, bytes));
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    let mut run = String::new();
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => {
                                run.push_str(&backend.decode_text(scope.page, &font, bytes))
                            }
                            other => {
                                if let Some(adjust) = get_number_from_value(other) {
                                    if adjust < TJ_SPACE_THRESHOLD && !run.ends_with(' ') {
                                        run.push(' ');
                                    }
                                }
                            }
                        }
                    }
                    push_run(runs, run);
                }
            }
            "Do" if depth < MAX_FORM_DEPTH => {
                let Some(PdfValue::Name(name)) = op.operands.first() else {
                    continue;
                };
                if let Ok(super::backend::XObject::Form(form)) = backend.xobject(scope, name) {
                    match backend.decode_content(&form.content) {
                        Ok(form_ops) => {
                            let form_scope = ResourceScope {
                                page: scope.page,
                                form: Some(form.id),
                            };
                            collect_runs(backend, &form_ops, form_scope, depth + 1, runs);
                        }
                        Err(e) => log::debug!("Ignoring unreadable form XObject: {}", e),
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(runs: &mut Vec<String>, run: String) {
    let trimmed = run.trim();
    if !trimmed.is_empty() {
        runs.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::backend::{PageId, XObject};
    use std::collections::BTreeMap;

    /// In-memory backend: each page is a list of operations, or `None` for a
    /// page whose content stream is unreadable.
    struct FakeBackend {
        pages: Vec<Option<Vec<ContentOp>>>,
    }

    fn show(text: &str) -> ContentOp {
        ContentOp {
            operator: "Tj".to_string(),
            operands: vec![PdfValue::Str(text.as_bytes().to_vec())],
        }
    }

    impl PdfBackend for FakeBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (1..=self.pages.len() as u32).map(|n| (n, (n, 0))).collect()
        }

        fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
            match &self.pages[(page.0 - 1) as usize] {
                Some(_) => Ok(page.0.to_string().into_bytes()),
                None => Err(Error::DocumentParse("Invalid content stream".into())),
            }
        }

        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
            let n: usize = String::from_utf8_lossy(data).parse().unwrap();
            Ok(self.pages[n - 1].clone().unwrap())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }

        fn xobject(&self, _scope: ResourceScope, _name: &[u8]) -> Result<XObject> {
            Err(Error::DocumentParse("no xobjects".into()))
        }
    }

    fn text_pages(n: usize, text: &str) -> FakeBackend {
        FakeBackend {
            pages: (0..n).map(|_| Some(vec![show(text)])).collect(),
        }
    }

    #[test]
    fn test_page_markers() {
        let backend = text_pages(3, "Directive Principles");
        let raw = TextExtractor::new(100, 10_000).extract(&backend, None).unwrap();
        assert_eq!(raw.text.matches("--- Page ").count(), 3);
        assert!(raw.text.starts_with("--- Page 1 ---\nDirective Principles\n\n"));
        assert_eq!(raw.pages_scanned, 3);
        assert!(!raw.truncated);
    }

    #[test]
    fn test_runs_joined_with_spaces() {
        let backend = FakeBackend {
            pages: vec![Some(vec![show("Article"), show("  "), show("32")])],
        };
        let text = TextExtractor::new(10, 1000)
            .page_text(&backend, 1, (1, 0))
            .unwrap();
        assert_eq!(text, "Article 32");
    }

    #[test]
    fn test_tj_array_gap_becomes_space() {
        let backend = FakeBackend {
            pages: vec![Some(vec![ContentOp {
                operator: "TJ".into(),
                operands: vec![PdfValue::Array(vec![
                    PdfValue::Str(b"Lok".to_vec()),
                    PdfValue::Integer(-20),
                    PdfValue::Str(b"Sabha".to_vec()),
                    PdfValue::Real(-450.0),
                    PdfValue::Str(b"Speaker".to_vec()),
                ])],
            }])],
        };
        let text = TextExtractor::new(10, 1000)
            .page_text(&backend, 1, (1, 0))
            .unwrap();
        assert_eq!(text, "LokSabha Speaker");
    }

    #[test]
    fn test_page_cap() {
        let backend = text_pages(200, "text");
        let raw = TextExtractor::new(100, 1_000_000).extract(&backend, None).unwrap();
        assert_eq!(raw.pages_scanned, 100);
        assert_eq!(raw.total_pages, 200);
        assert!(raw.text.contains("--- Page 100 ---"));
        assert!(!raw.text.contains("--- Page 101 ---"));
    }

    #[test]
    fn test_char_budget() {
        let backend = text_pages(50, &"x".repeat(1000));
        for budget in [1, 999, 1017, 5000, 12_345] {
            let raw = TextExtractor::new(100, budget).extract(&backend, None).unwrap();
            assert!(raw.text.chars().count() <= budget, "budget {}", budget);
            assert!(raw.truncated);
        }
    }

    #[test]
    fn test_char_budget_counts_characters() {
        let backend = text_pages(5, &"é".repeat(100));
        let raw = TextExtractor::new(100, 150).extract(&backend, None).unwrap();
        assert_eq!(raw.text.chars().count(), 150);
    }

    #[test]
    fn test_broken_page_skipped() {
        let mut pages: Vec<Option<Vec<ContentOp>>> = (1..=10)
            .map(|n| Some(vec![show(&format!("content of page {}", n))]))
            .collect();
        pages[6] = None;
        let backend = FakeBackend { pages };

        let raw = TextExtractor::new(100, 100_000).extract(&backend, None).unwrap();
        assert_eq!(raw.skipped_pages, vec![7]);
        assert!(raw.text.contains("content of page 6"));
        assert!(raw.text.contains("content of page 8"));
        assert!(!raw.text.contains("content of page 7"));
        assert!(!raw.text.contains("--- Page 7 ---"));
    }

    #[test]
    fn test_empty_pages_have_no_marker() {
        let backend = FakeBackend {
            pages: vec![Some(vec![]), Some(vec![show("only page two")])],
        };
        let raw = TextExtractor::new(10, 1000).extract(&backend, None).unwrap();
        assert_eq!(raw.text, "--- Page 2 ---\nonly page two\n\n");
    }

    #[test]
    fn test_deadline_aborts() {
        let backend = text_pages(3, "text");
        let deadline = Deadline::after(std::time::Duration::ZERO);
        let result = TextExtractor::new(10, 1000).extract(&backend, Some(&deadline));
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
