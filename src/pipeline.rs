//! The extraction orchestrator: validate, extract text, clean, decide on the
//! vision fallback, render.

use crate::config::{ExtractionConfig, ExtractionProfile, RenderStrategy};
use crate::deadline::Deadline;
use crate::detect::check_mime;
use crate::error::{Error, Result};
use crate::model::{ExtractedContent, PageImage, SourceDocument};
use crate::parser::{LopdfBackend, PdfBackend, RawText, TextExtractor};
use crate::render::{PageRenderer, TextCleaner};

/// Turns one PDF into grounding content.
///
/// The extractor holds no per-document state and can serve concurrent
/// calls.
///
/// # Example
///
/// ```no_run
/// use pdfground::{Extractor, ExtractionConfig, SourceDocument};
///
/// let extractor = Extractor::new(ExtractionConfig::default());
/// let source = SourceDocument::from_path("polity.pdf").unwrap();
/// let content = extractor.extract(source).unwrap();
/// println!("{} chars, {} images", content.text_chars(), content.images.len());
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractionConfig,
    cleaner: TextCleaner,
}

impl Extractor {
    /// Create an extractor for a config.
    pub fn new(config: ExtractionConfig) -> Self {
        let cleaner = TextCleaner::new(config.cleanup.clone());
        Self { config, cleaner }
    }

    /// Create an extractor for a named profile.
    pub fn from_profile(profile: ExtractionProfile) -> Self {
        Self::new(ExtractionConfig::from_profile(profile))
    }

    /// The active config.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Reject sources that must never reach the parser.
    pub fn validate(&self, source: &SourceDocument) -> Result<()> {
        check_mime(source.mime_type())?;
        if let Some(limit) = self.config.max_file_bytes {
            if source.size() > limit {
                return Err(Error::FileTooLarge {
                    size: source.size(),
                    limit,
                });
            }
        }
        if source.is_empty() {
            return Err(Error::DocumentParse("PDF file is empty".to_string()));
        }
        Ok(())
    }

    /// Run the full pipeline.
    ///
    /// The source is consumed; the bytes and the parsed document are released
    /// when this returns, on success and on every error path.
    pub fn extract(&self, source: SourceDocument) -> Result<ExtractedContent> {
        self.validate(&source)?;
        let deadline = Deadline::from_timeout(self.config.timeout);

        log::debug!("Extracting '{}' ({} bytes)", source.name(), source.size());
        let backend = LopdfBackend::load_bytes(source.data())?;
        log::debug!(
            "Opened PDF {} with {} pages",
            backend.version(),
            backend.page_count()
        );

        let (raw, text, images) = match self.config.render_strategy {
            RenderStrategy::Sequential => {
                let (raw, text) = self.text_phase(&backend, deadline.as_ref())?;
                let images = if self.is_sparse(&text) {
                    log::debug!("Text is sparse, rendering page images");
                    self.renderer()
                        .render_with_deadline(source.data(), deadline.as_ref())
                } else {
                    Vec::new()
                };
                (raw, text, images)
            }
            RenderStrategy::Speculative => {
                let renderer = self.renderer();
                let (text_result, images) = rayon::join(
                    || self.text_phase(&backend, deadline.as_ref()),
                    || renderer.render_with_deadline(source.data(), deadline.as_ref()),
                );
                let (raw, text) = text_result?;
                let images = if self.is_sparse(&text) {
                    images
                } else {
                    log::debug!("Text is sufficient, dropping {} speculative images", images.len());
                    Vec::new()
                };
                (raw, text, images)
            }
        };

        self.assemble(&source, raw, text, images)
    }

    /// Fetch a document and run the pipeline on it.
    ///
    /// The download is held to the same size limit and timeout as the
    /// extraction.
    #[cfg(feature = "remote")]
    pub async fn extract_url(&self, url: &str) -> Result<ExtractedContent> {
        let options = crate::fetch::FetchOptions::from_config(&self.config);
        let source = crate::fetch::fetch_source(url, &options).await?;
        self.extract_async(source).await
    }

    /// Run the pipeline on the blocking pool under the configured timeout.
    ///
    /// On timeout the blocking task is abandoned and its result discarded.
    #[cfg(feature = "async")]
    pub async fn extract_async(&self, source: SourceDocument) -> Result<ExtractedContent> {
        let extractor = self.clone();
        let task = tokio::task::spawn_blocking(move || extractor.extract(source));

        let joined = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => task.await,
        };

        joined.unwrap_or_else(|e| {
            Err(Error::DocumentParse(format!("extraction task failed: {}", e)))
        })
    }

    fn renderer(&self) -> PageRenderer {
        PageRenderer::from_config(&self.config)
    }

    fn text_phase<B: PdfBackend>(
        &self,
        backend: &B,
        deadline: Option<&Deadline>,
    ) -> Result<(RawText, String)> {
        let raw = TextExtractor::from_config(&self.config).extract(backend, deadline)?;
        let mut text = self.cleaner.clean(&raw.text);

        // Ligature expansion can grow the text past the budget.
        if let Some((idx, _)) = text.char_indices().nth(self.config.max_text_chars) {
            text.truncate(idx);
            text.truncate(text.trim_end().len());
        }
        Ok((raw, text))
    }

    fn is_sparse(&self, text: &str) -> bool {
        text.trim().chars().count() < self.config.min_text_threshold
    }

    fn assemble(
        &self,
        source: &SourceDocument,
        raw: RawText,
        text: String,
        images: Vec<PageImage>,
    ) -> Result<ExtractedContent> {
        let text_chars = text.trim().chars().count();
        let sparse = text_chars < self.config.min_text_threshold;

        if sparse && images.is_empty() {
            log::info!(
                "No usable content in '{}': {} chars, no images",
                source.name(),
                text_chars
            );
            return Err(Error::ExtractionInsufficient {
                text_chars,
                threshold: self.config.min_text_threshold,
            });
        }

        let page_count_estimate = if images.is_empty() {
            (source.size() / self.config.page_count_divisor).max(1) as u32
        } else {
            images.len() as u32
        };

        log::info!(
            "Extracted '{}': {} chars from {}/{} pages, {} images",
            source.name(),
            text_chars,
            raw.pages_scanned,
            raw.total_pages,
            images.len()
        );

        Ok(ExtractedContent {
            text,
            rendered: sparse,
            images,
            page_count_estimate,
            total_pages: raw.total_pages,
            pages_scanned: raw.pages_scanned,
            truncated: raw.truncated,
            source_name: source.name().to_string(),
            source_size: source.size(),
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}
