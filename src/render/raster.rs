//! Whole-page rasterization through MuPDF.
//!
//! MuPDF draws everything a viewer would: text in embedded and base-14
//! fonts, vector art, and images in every PDF encoding (DCT, JPX, JBIG2,
//! CCITT fax, Flate). lopdf stays the text layer; this module only turns
//! pages into pixels.

use image::{Rgb, RgbImage};
use mupdf::{Colorspace, Document, Matrix};

use crate::config::ScalePolicy;
use crate::detect::PDF_MIME;
use crate::error::{Error, Result};

/// Longest allowed side of a rendered page, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// Channel value below which a pixel counts as ink.
const INK_LEVEL: u8 = 240;

/// A document opened for rendering.
///
/// MuPDF handles stay on the thread that opened them, so each render
/// worker opens its own copy from the shared bytes.
pub struct RasterDocument {
    doc: Document,
}

impl RasterDocument {
    /// Open a document from PDF bytes.
    pub fn open(data: &[u8]) -> Result<Self> {
        let doc = Document::from_bytes(data, PDF_MIME)
            .map_err(|e| Error::DocumentParse(format!("renderer could not open PDF: {}", e)))?;
        Ok(Self { doc })
    }

    /// Number of pages MuPDF sees.
    pub fn page_count(&self) -> Result<u32> {
        let count = self
            .doc
            .page_count()
            .map_err(|e| Error::DocumentParse(e.to_string()))?;
        Ok(count.max(0) as u32)
    }

    /// Rasterize one page (1-based) to RGB.
    ///
    /// The scale comes from `policy`, then shrinks further if needed so that
    /// neither side exceeds [`MAX_DIMENSION`]. A page with no ink at all is
    /// an error: it gives a vision model nothing to read.
    pub fn render_page(&self, page_num: u32, policy: &ScalePolicy) -> Result<RgbImage> {
        let fail = |reason: String| Error::PageRender {
            page: page_num,
            reason,
        };

        let index = page_num
            .checked_sub(1)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| fail("invalid page number".to_string()))?;
        let page = self
            .doc
            .load_page(index)
            .map_err(|e| fail(e.to_string()))?;
        let bounds = page.bounds().map_err(|e| fail(e.to_string()))?;

        // Bounds already reflect /Rotate and the crop box.
        let (width, height) = (bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);
        let scale = fit_scale(policy.scale_for(width), width, height)
            .ok_or_else(|| fail(format!("degenerate page size {}x{}", width, height)))?;

        let pixmap = page
            .to_pixmap(&Matrix::new_scale(scale, scale), &Colorspace::device_rgb(), false, true)
            .map_err(|e| fail(e.to_string()))?;

        let pixels = to_rgb(
            pixmap.width() as u32,
            pixmap.height() as u32,
            pixmap.n() as usize,
            pixmap.samples(),
        )
        .ok_or_else(|| fail("unexpected pixmap layout".to_string()))?;

        if !has_ink(&pixels) {
            return Err(fail("page is blank".to_string()));
        }
        Ok(pixels)
    }
}

/// Clamp `scale` so a `width` x `height` point page fits in
/// [`MAX_DIMENSION`] pixels per side. `None` for empty or non-finite pages.
pub fn fit_scale(scale: f32, width: f32, height: f32) -> Option<f32> {
    let longest = width.max(height);
    if !(width > 0.0 && height > 0.0 && longest.is_finite() && scale > 0.0) {
        return None;
    }
    Some(scale.min(MAX_DIMENSION as f32 / longest))
}

/// Copy interleaved samples (`n` components per pixel, rows possibly
/// padded) into an RGB image.
fn to_rgb(width: u32, height: u32, n: usize, samples: &[u8]) -> Option<RgbImage> {
    if width == 0 || height == 0 || n < 3 {
        return None;
    }
    let stride = samples.len() / height as usize;
    if stride < width as usize * n {
        return None;
    }

    let mut image = RgbImage::new(width, height);
    for (y, row) in samples.chunks_exact(stride).take(height as usize).enumerate() {
        for (x, px) in row.chunks_exact(n).take(width as usize).enumerate() {
            image.put_pixel(x as u32, y as u32, Rgb([px[0], px[1], px[2]]));
        }
    }
    Some(image)
}

fn has_ink(image: &RgbImage) -> bool {
    image.pixels().any(|p| p.0.iter().any(|&c| c < INK_LEVEL))
}
