//! Turning a parsed document into consumable output: cleaned text and page
//! images.

mod cleanup;
mod page_image;
mod raster;

pub use cleanup::{CharPolicy, CleanupOptions, CleanupPreset, TextCleaner};
pub use page_image::{encode_jpeg, to_data_uri, PageRenderer};
pub use raster::{fit_scale, RasterDocument, MAX_DIMENSION};
