//! Extraction configuration and named profiles.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render::CleanupOptions;

/// Hard bounds on the number of rasterized pages.
pub const MIN_IMAGE_PAGES: u32 = 1;
pub const MAX_IMAGE_PAGES: u32 = 5;

/// Bounds on the target width used by [`ScalePolicy::FitWidth`].
pub const MIN_FIT_WIDTH: u32 = 640;
pub const MAX_FIT_WIDTH: u32 = 1280;

/// How a page is scaled before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ScalePolicy {
    /// Multiply the page size (in points) by a constant.
    Fixed { scale: f32 },
    /// Scale so the page is `max_width` pixels wide, never above `max_scale`.
    FitWidth { max_width: u32, max_scale: f32 },
}

impl ScalePolicy {
    /// Scale factor for a page of `page_width` points.
    pub fn scale_for(&self, page_width: f32) -> f32 {
        match *self {
            ScalePolicy::Fixed { scale } => scale,
            ScalePolicy::FitWidth {
                max_width,
                max_scale,
            } => {
                if page_width <= 0.0 {
                    return max_scale;
                }
                let width = max_width.clamp(MIN_FIT_WIDTH, MAX_FIT_WIDTH) as f32;
                (width / page_width).min(max_scale)
            }
        }
    }
}

impl Default for ScalePolicy {
    fn default() -> Self {
        ScalePolicy::FitWidth {
            max_width: 1024,
            max_scale: 2.0,
        }
    }
}

/// When the page renderer runs relative to text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    /// Render only after the cleaned text turned out sparse.
    #[default]
    Sequential,
    /// Render in parallel with text extraction and drop the images when the
    /// text is sufficient. Lower latency for scanned files, wasted work for
    /// text files.
    Speculative,
}

/// Named configurations matching the places a document is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionProfile {
    /// Fresh uploads: smaller budgets, noisy header/footer lines dropped.
    Upload,
    /// Books loaded from the library.
    #[default]
    Library,
    /// Standalone utility pass: strict ASCII text, fixed 1.5x rendering.
    Utility,
}

/// Configuration consumed by the extractor, the renderer and the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Pages scanned for text
    pub max_pages_text: u32,

    /// Pages rasterized for the vision fallback
    pub max_pages_images: u32,

    /// Character budget for extracted text
    pub max_text_chars: usize,

    /// Rasterization scale
    pub scale_policy: ScalePolicy,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Cleaned text shorter than this is sparse
    pub min_text_threshold: usize,

    /// Text cleanup options
    pub cleanup: CleanupOptions,

    /// Sequential or speculative rendering
    pub render_strategy: RenderStrategy,

    /// Largest accepted upload in bytes (None = unlimited)
    pub max_file_bytes: Option<u64>,

    /// Wall-clock limit for one extraction (None = unlimited)
    #[serde(with = "duration_secs")]
    pub timeout: Option<Duration>,

    /// Bytes per page used when estimating the page count
    pub page_count_divisor: u64,
}

impl ExtractionConfig {
    /// Create a config with the default (library) profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from a named profile.
    pub fn from_profile(profile: ExtractionProfile) -> Self {
        match profile {
            ExtractionProfile::Upload => Self {
                max_pages_text: 50,
                max_text_chars: 50_000,
                min_text_threshold: 300,
                cleanup: CleanupOptions::aggressive(),
                ..Self::library()
            },
            ExtractionProfile::Library => Self::library(),
            ExtractionProfile::Utility => Self {
                max_pages_images: 5,
                scale_policy: ScalePolicy::Fixed { scale: 1.5 },
                cleanup: CleanupOptions::standard().ascii_only(),
                ..Self::library()
            },
        }
    }

    fn library() -> Self {
        Self {
            max_pages_text: 100,
            max_pages_images: 3,
            max_text_chars: 150_000,
            scale_policy: ScalePolicy::default(),
            jpeg_quality: 80,
            min_text_threshold: 400,
            cleanup: CleanupOptions::standard(),
            render_strategy: RenderStrategy::Sequential,
            max_file_bytes: Some(50 * 1024 * 1024),
            timeout: Some(Duration::from_secs(60)),
            page_count_divisor: 3000,
        }
    }

    /// Parse a config from JSON. Missing fields take library defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check invariants and clamp soft limits into range.
    pub fn validated(mut self) -> Result<Self> {
        if self.max_pages_text == 0 {
            return Err(Error::Config("max_pages_text must be at least 1".into()));
        }
        if self.max_text_chars == 0 {
            return Err(Error::Config("max_text_chars must be at least 1".into()));
        }
        if self.page_count_divisor == 0 {
            return Err(Error::Config("page_count_divisor must be at least 1".into()));
        }
        match self.scale_policy {
            ScalePolicy::Fixed { scale } if !(scale > 0.0 && scale.is_finite()) => {
                return Err(Error::Config(format!("invalid render scale {}", scale)));
            }
            ScalePolicy::FitWidth { max_scale, .. } if !(max_scale > 0.0 && max_scale.is_finite()) => {
                return Err(Error::Config(format!("invalid max scale {}", max_scale)));
            }
            _ => {}
        }
        self.max_pages_images = self.max_pages_images.clamp(MIN_IMAGE_PAGES, MAX_IMAGE_PAGES);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        Ok(self)
    }

    /// Set the page cap for text extraction.
    pub fn with_max_pages_text(mut self, pages: u32) -> Self {
        self.max_pages_text = pages;
        self
    }

    /// Set the page cap for rendering (clamped to 1..=5).
    pub fn with_max_pages_images(mut self, pages: u32) -> Self {
        self.max_pages_images = pages.clamp(MIN_IMAGE_PAGES, MAX_IMAGE_PAGES);
        self
    }

    /// Set the character budget.
    pub fn with_max_text_chars(mut self, chars: usize) -> Self {
        self.max_text_chars = chars;
        self
    }

    /// Set the sparse-text threshold.
    pub fn with_min_text_threshold(mut self, chars: usize) -> Self {
        self.min_text_threshold = chars;
        self
    }

    /// Set the scale policy.
    pub fn with_scale_policy(mut self, policy: ScalePolicy) -> Self {
        self.scale_policy = policy;
        self
    }

    /// Set the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Set the render strategy.
    pub fn with_render_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.render_strategy = strategy;
        self
    }

    /// Render speculatively in parallel with text extraction.
    pub fn speculative(self) -> Self {
        self.with_render_strategy(RenderStrategy::Speculative)
    }

    /// Set the upload size limit.
    pub fn with_max_file_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_file_bytes = limit;
        self
    }

    /// Set the wall-clock limit.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::library()
    }
}

/// Serialize `Option<Duration>` as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        match secs {
            Some(s) if s.is_finite() && s >= 0.0 => Ok(Some(Duration::from_secs_f64(s))),
            Some(s) => Err(serde::de::Error::custom(format!("invalid timeout {}", s))),
            None => Ok(None),
        }
    }
}
