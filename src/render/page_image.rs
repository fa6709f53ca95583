//! Page images for the vision fallback: rasterize, encode to JPEG, wrap as a
//! data URI.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use rayon::prelude::*;

use crate::config::{ExtractionConfig, ScalePolicy};
use crate::deadline::{self, Deadline};
use crate::error::{Error, Result};
use crate::model::{PageImage, JPEG_DATA_URI_PREFIX};

use super::raster::RasterDocument;

/// Renders the first pages of a document as JPEG data URIs.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    max_pages: u32,
    scale_policy: ScalePolicy,
    jpeg_quality: u8,
}

impl PageRenderer {
    /// Create a renderer with explicit settings.
    pub fn new(max_pages: u32, scale_policy: ScalePolicy, jpeg_quality: u8) -> Self {
        Self {
            max_pages,
            scale_policy,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Create a renderer from the pipeline config.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.max_pages_images,
            config.scale_policy,
            config.jpeg_quality,
        )
    }

    /// Render pages `1..=min(total, max_pages)` of a PDF.
    ///
    /// Pages render in parallel. Pages that fail are logged and left out; the
    /// rest stay in ascending page order.
    pub fn render(&self, data: &[u8]) -> Vec<PageImage> {
        self.render_with_deadline(data, None)
    }

    /// Like [`render`](Self::render), but a page still queued or still
    /// being encoded when the deadline passes is dropped.
    pub fn render_with_deadline(&self, data: &[u8], deadline: Option<&Deadline>) -> Vec<PageImage> {
        let total = match RasterDocument::open(data).and_then(|doc| doc.page_count()) {
            Ok(total) => total,
            Err(e) => {
                log::warn!("Cannot render pages: {}", e);
                return Vec::new();
            }
        };
        let count = total.min(self.max_pages);

        let images: Vec<PageImage> = (1..=count)
            .into_par_iter()
            .map_init(
                || RasterDocument::open(data),
                |doc, page_num| {
                    let result = match doc {
                        Ok(doc) => self.render_page(doc, page_num, deadline),
                        Err(e) => Err(Error::PageRender {
                            page: page_num,
                            reason: e.to_string(),
                        }),
                    };
                    result.map_err(|e| log::warn!("{}", e)).ok()
                },
            )
            .filter_map(|image| image)
            .collect();

        log::debug!("Rendered {}/{} pages", images.len(), count);
        images
    }

    /// Render and encode a single page (1-based).
    pub fn render_page(
        &self,
        doc: &RasterDocument,
        page_num: u32,
        deadline: Option<&Deadline>,
    ) -> Result<PageImage> {
        deadline::check(deadline)?;
        let pixels = doc.render_page(page_num, &self.scale_policy)?;
        deadline::check(deadline)?;

        let jpeg = encode_jpeg(&pixels, self.jpeg_quality).map_err(|e| Error::PageRender {
            page: page_num,
            reason: format!("JPEG encoding failed: {}", e),
        })?;

        Ok(PageImage {
            page_number: page_num,
            width: pixels.width(),
            height: pixels.height(),
            data_uri: to_data_uri(&jpeg),
        })
    }
}

/// Encode RGB pixels as baseline JPEG.
pub fn encode_jpeg(pixels: &RgbImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(pixels)?;
    Ok(buf)
}

/// Wrap JPEG bytes as a `data:image/jpeg;base64,` URI.
pub fn to_data_uri(jpeg: &[u8]) -> String {
    format!("{}{}", JPEG_DATA_URI_PREFIX, BASE64.encode(jpeg))
}
