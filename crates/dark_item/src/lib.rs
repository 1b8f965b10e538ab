//! # Dark Item Detection
//!
//! Finds the single most prominent dark object in a photograph and describes it
//! geometrically: a simplified outline, its area, an axis-aligned box and a
//! minimum-area rotated box, all in the coordinates of the image that was passed in.
//!
//! ## Pipeline
//!
//! - **Resize** to a working width so cost is bounded regardless of input size
//! - **Luminance**: Lab lightness followed by tiled contrast-limited equalization
//! - **Smoothing**: Gaussian blur with an odd kernel
//! - **Dark mask**: inverted Otsu threshold OR-ed with a 20th percentile floor, then
//!   closed and opened with elliptical elements
//! - **Regions**: outer boundaries only, holes filled
//! - **Scoring**: darkness times square-root relative area, with a penalty for
//!   regions touching the border; the first best region wins ties
//! - **Projection**: simplification and rotated box, scaled back to the original
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dark_item::{DetectParams, detect};
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let result = detect(&bytes, &DetectParams::default())?;
//!
//! if let Some(item) = &result.item {
//!     println!("{} px², touches edge: {}", item.area, item.touches_edge);
//! }
//! result.save_geojson("item.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod params;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{DetectError, Result};
pub use types::{BoundingBox, DetectionItem, DetectionResult, Point, RotatedBox};
pub use params::DetectParams;
pub use traits::*;
pub use pipeline::{Analysis, Pipeline};

use image::{DynamicImage, RgbImage};

/// Decode an encoded raster (PNG, JPEG, TIFF) into a buffer the pipeline accepts.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(DetectError::InvalidInput("empty image buffer".to_string()));
    }
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectError::InvalidInput(format!(
            "image decodes to zero size ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(image)
}

/// Detect the dominant dark item in encoded image bytes.
pub fn detect(bytes: &[u8], params: &DetectParams) -> Result<DetectionResult> {
    detect_image(&decode(bytes)?, params)
}

/// Same as [`detect`] for an already decoded image.
pub fn detect_image(image: &DynamicImage, params: &DetectParams) -> Result<DetectionResult> {
    Pipeline::new(params).detect(image)
}

/// Same as [`detect`], with the working-resolution overlay attached to the result.
pub fn detect_with_overlay(bytes: &[u8], params: &DetectParams) -> Result<DetectionResult> {
    Pipeline::new(params).detect_with_overlay(&decode(bytes)?)
}

/// The working-resolution image with the selected outline drawn in red. Without a
/// selected item the resized image comes back unmarked.
pub fn render_overlay(bytes: &[u8], params: &DetectParams) -> Result<RgbImage> {
    Pipeline::new(params).render_overlay(&decode(bytes)?)
}
