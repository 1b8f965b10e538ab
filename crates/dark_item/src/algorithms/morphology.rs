use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};
use crate::{error::Result, traits::GrayStage};

/// Elliptical structuring element inscribed in a `size x size` square, rasterized
/// row by row the classic way (a 3x3 is a cross, a 5x5 loses only its corner notches).
pub fn ellipse_element(size: u8) -> Mask {
    let raster = ellipse_raster(size);
    let center = (raster.width() / 2) as u8;
    Mask::from_image(&raster, center, center)
}

fn ellipse_raster(size: u8) -> GrayImage {
    let size = size.max(1) | 1;
    let radius = (size / 2) as u32;
    let r = radius as f64;
    let mut image = GrayImage::new(size as u32, size as u32);

    for row in 0..size as u32 {
        let dy = row as f64 - r;
        let half = if radius == 0 {
            0
        } else {
            ((r * (1.0 - (dy * dy) / (r * r)).max(0.0).sqrt()).round() as u32).min(radius)
        };
        for col in radius - half..=radius + half {
            image.put_pixel(col, row, Luma([255]));
        }
    }

    image
}

/// Close-then-open cleanup of a binary mask.
#[derive(Debug, Clone)]
pub struct MaskCleaner {
    pub close_size: u8,
    pub open_size: u8,
}

impl Default for MaskCleaner {
    fn default() -> Self {
        Self {
            close_size: 5,
            open_size: 3,
        }
    }
}

impl MaskCleaner {
    pub fn clean(&self, mask: &GrayImage) -> GrayImage {
        let close = ellipse_element(self.close_size);
        let open = ellipse_element(self.open_size);

        // Closing bridges gaps first so the opening cannot split a region apart.
        let closed = grayscale_erode(&grayscale_dilate(mask, &close), &close);
        grayscale_dilate(&grayscale_erode(&closed, &open), &open)
    }
}

impl GrayStage for MaskCleaner {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(self.clean(image))
    }
}
