use image::{GrayImage, ImageBuffer, Luma};
use crate::{error::Result, traits::GrayStage};

/// Gaussian low-pass filter with an explicit odd kernel size.
#[derive(Debug, Clone)]
pub struct GaussianSmoother {
    kernel_size: u32,
}

impl GaussianSmoother {
    /// Even sizes are bumped to the next odd value, `0` to `1`.
    pub fn new(kernel_size: u32) -> Self {
        Self {
            kernel_size: kernel_size | 1,
        }
    }

    pub fn kernel_size(&self) -> u32 {
        self.kernel_size
    }

    /// Sigma implied by the kernel size when none is given explicitly.
    pub fn sigma(&self) -> f32 {
        0.3 * ((self.kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    /// Normalized 1D taps, applied along both axes.
    pub fn kernel(&self) -> Vec<f32> {
        let radius = (self.kernel_size / 2) as i32;
        let sigma = self.sigma();
        let taps: Vec<f32> = (-radius..=radius)
            .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
            .collect();
        let sum: f32 = taps.iter().sum();
        taps.into_iter().map(|t| t / sum).collect()
    }
}

impl GrayStage for GaussianSmoother {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.kernel_size == 1 {
            return Ok(image.clone());
        }

        // Filter in f32 and round once at the end; filtering the u8 buffer directly
        // truncates every pass.
        let float: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
                Luma([image.get_pixel(x, y).0[0] as f32])
            });
        let blurred = imageproc::filter::separable_filter_equal(&float, &self.kernel());

        Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([blurred.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
        }))
    }
}
