use image::{DynamicImage, RgbImage, imageops::FilterType};
use crate::{
    error::{DetectError, Result},
    types::ScaleFactor,
};

/// Largest working image accepted, in pixels.
pub const MAX_WORKING_PIXELS: u64 = 40_000_000;

/// Brings a decoded image to the working width, keeping its aspect ratio.
#[derive(Debug, Clone)]
pub struct Resizer {
    pub target_width: u32,
}

impl Resizer {
    pub fn new(target_width: u32) -> Self {
        Self { target_width }
    }

    /// Working height for an original of `width x height`.
    pub fn working_height(&self, width: u32, height: u32) -> u32 {
        let scale = self.target_width as f64 / width as f64;
        ((height as f64 * scale).round() as u32).max(1)
    }

    pub fn resize(&self, image: &DynamicImage) -> Result<(RgbImage, ScaleFactor)> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidInput(format!(
                "image has zero size ({width}x{height})"
            )));
        }

        let scale = ScaleFactor::new(self.target_width, width)?;
        let working_height = self.working_height(width, height);
        let working_pixels = self.target_width as u64 * working_height as u64;
        if working_pixels > MAX_WORKING_PIXELS {
            return Err(DetectError::InvalidInput(format!(
                "{width}x{height} at working width {} needs {working_pixels} pixels, limit is {MAX_WORKING_PIXELS}",
                self.target_width
            )));
        }
        let rgb = image.to_rgb8();

        // Triangle support widens with the reduction ratio, so downscaling averages
        // over the covered source area instead of point sampling.
        let working = if (self.target_width, working_height) == (width, height) {
            rgb
        } else {
            image::imageops::resize(&rgb, self.target_width, working_height, FilterType::Triangle)
        };

        tracing::debug!(
            width,
            height,
            working_width = working.width(),
            working_height = working.height(),
            scale = scale.forward(),
            "resized to working resolution"
        );

        Ok((working, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_scale_and_height() {
        for (width, height, target) in [(1000, 750, 960), (333, 101, 200), (640, 480, 1280)] {
            let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
            let resizer = Resizer::new(target);
            let (working, scale) = resizer.resize(&image).unwrap();

            assert_eq!(scale.forward(), target as f64 / width as f64);
            assert_eq!(working.width(), target);
            assert_eq!(
                working.height(),
                (height as f64 * target as f64 / width as f64).round() as u32
            );
        }
    }

    #[test]
    fn test_identity_resize_is_exact_copy() {
        let mut rgb = RgbImage::new(50, 30);
        rgb.put_pixel(7, 9, Rgb([10, 20, 30]));
        let image = DynamicImage::ImageRgb8(rgb.clone());

        let (working, scale) = Resizer::new(50).resize(&image).unwrap();
        assert_eq!(scale.forward(), 1.0);
        assert_eq!(working, rgb);
    }

    #[test]
    fn test_downscale_averages_instead_of_sampling() {
        // One-pixel checkerboard: point sampling would keep pure black or white.
        let rgb = RgbImage::from_fn(100, 100, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let (working, _) = Resizer::new(25)
            .resize(&DynamicImage::ImageRgb8(rgb))
            .unwrap();

        let center = working.get_pixel(12, 12).0[0];
        assert!((64..=192).contains(&center), "center = {center}");
    }

    #[test]
    fn test_extreme_aspect_ratio_is_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1, 500));
        let resizer = Resizer::new(4000);
        assert_eq!(resizer.working_height(1, 500), 2_000_000);
        assert!(matches!(
            resizer.resize(&image),
            Err(DetectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tall_image_within_limit_is_accepted() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 200));
        let (working, _) = Resizer::new(200).resize(&image).unwrap();
        assert_eq!(working.dimensions(), (200, 4000));
    }

    #[test]
    fn test_zero_target_is_invalid() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        assert!(matches!(
            Resizer::new(0).resize(&image),
            Err(DetectError::InvalidInput(_))
        ));
    }
}
