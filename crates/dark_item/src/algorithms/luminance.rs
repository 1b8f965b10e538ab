use image::{GrayImage, Luma, RgbImage};
use palette::{IntoColor, Lab, Srgb};
use crate::{error::Result, traits::GrayStage};

const BINS: usize = 256;

/// Lightness channel of CIE Lab, rescaled from `0..=100` to `0..=255`.
pub fn lab_lightness(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let lab: Lab = Srgb::new(r, g, b).into_format::<f32>().into_color();
        Luma([(lab.l * 2.55).round().clamp(0.0, 255.0) as u8])
    })
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `tiles_x` by `tiles_y` grid. Each tile gets its own
/// clipped-histogram lookup table, and every pixel blends the tables of the four
/// tiles whose centers surround it.
#[derive(Debug, Clone)]
pub struct ClaheEqualizer {
    pub clip_limit: f32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl Default for ClaheEqualizer {
    fn default() -> Self {
        Self {
            clip_limit: 3.0,
            tiles_x: 8,
            tiles_y: 8,
        }
    }
}

impl ClaheEqualizer {
    pub fn equalize(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }
        let tiles_x = self.tiles_x.clamp(1, width);
        let tiles_y = self.tiles_y.clamp(1, height);

        let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            let (y0, y1) = tile_span(ty, tiles_y, height);
            for tx in 0..tiles_x {
                let (x0, x1) = tile_span(tx, tiles_x, width);
                luts.push(self.tile_lut(image, x0..x1, y0..y1));
            }
        }

        let tile_w = width as f32 / tiles_x as f32;
        let tile_h = height as f32 / tiles_y as f32;
        let lut_at = |tx: usize, ty: usize| &luts[ty * tiles_x as usize + tx];

        GrayImage::from_fn(width, height, |x, y| {
            let v = image.get_pixel(x, y).0[0] as usize;
            let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
            let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);

            let top = lut_at(tx0, ty0)[v] * (1.0 - wx) + lut_at(tx1, ty0)[v] * wx;
            let bottom = lut_at(tx0, ty1)[v] * (1.0 - wx) + lut_at(tx1, ty1)[v] * wx;
            let blended = top * (1.0 - wy) + bottom * wy;
            Luma([blended.round().clamp(0.0, 255.0) as u8])
        })
    }

    fn tile_lut(
        &self,
        image: &GrayImage,
        xs: std::ops::Range<u32>,
        ys: std::ops::Range<u32>,
    ) -> [f32; BINS] {
        let mut hist = [0u32; BINS];
        for y in ys.clone() {
            for x in xs.clone() {
                hist[image.get_pixel(x, y).0[0] as usize] += 1;
            }
        }
        let area = xs.len() as u32 * ys.len() as u32;

        let clip = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for count in hist.iter_mut() {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }

        let batch = excess / BINS as u32;
        let residual = (excess % BINS as u32) as usize;
        for count in hist.iter_mut() {
            *count += batch;
        }
        if residual > 0 {
            let stride = (BINS / residual).max(1);
            for i in (0..BINS).step_by(stride).take(residual) {
                hist[i] += 1;
            }
        }

        let scale = 255.0 / area as f32;
        let mut lut = [0.0f32; BINS];
        let mut cumulative = 0u32;
        for (value, count) in hist.iter().enumerate() {
            cumulative += count;
            lut[value] = (cumulative as f32 * scale).round().min(255.0);
        }
        lut
    }
}

impl GrayStage for ClaheEqualizer {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(self.equalize(image))
    }
}

/// Lightness extraction followed by local equalization.
#[derive(Debug, Clone, Default)]
pub struct LuminanceExtractor {
    pub clahe: ClaheEqualizer,
}

impl LuminanceExtractor {
    pub fn extract(&self, image: &RgbImage) -> Result<GrayImage> {
        let lightness = lab_lightness(image);
        self.clahe.apply(&lightness)
    }
}

fn tile_span(index: u32, tiles: u32, len: u32) -> (u32, u32) {
    let start = (index as u64 * len as u64 / tiles as u64) as u32;
    let end = ((index as u64 + 1) * len as u64 / tiles as u64) as u32;
    (start, end)
}

/// Indices of the two tiles straddling `pos` along one axis and the weight of the
/// second one.
fn neighbours(pos: u32, tile_size: f32, tiles: u32) -> (usize, usize, f32) {
    let f = pos as f32 / tile_size - 0.5;
    let lo = f.floor();
    let last = tiles as usize - 1;
    let first = (lo.max(0.0) as usize).min(last);
    let second = ((lo + 1.0).max(0.0) as usize).min(last);
    (first, second, (f - lo).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_lightness_extremes() {
        let mut rgb = RgbImage::from_pixel(4, 1, Rgb([255, 255, 255]));
        rgb.put_pixel(1, 0, Rgb([0, 0, 0]));
        rgb.put_pixel(2, 0, Rgb([128, 128, 128]));
        rgb.put_pixel(3, 0, Rgb([0, 0, 255]));

        let l = lab_lightness(&rgb);
        assert_eq!(l.get_pixel(0, 0).0[0], 255);
        assert_eq!(l.get_pixel(1, 0).0[0], 0);
        let gray = l.get_pixel(2, 0).0[0];
        assert!((130..=145).contains(&gray), "mid gray lightness = {gray}");
        // Pure blue is perceptually much darker than its channel mean suggests.
        assert!(l.get_pixel(3, 0).0[0] < 90);
    }

    #[test]
    fn test_clahe_keeps_uniform_image_uniform() {
        let image = GrayImage::from_pixel(64, 48, Luma([255]));
        let out = ClaheEqualizer::default().equalize(&image);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_clahe_preserves_order() {
        let image = GrayImage::from_fn(64, 64, |x, _| Luma([if x < 32 { 100 } else { 110 }]));
        let out = ClaheEqualizer::default().equalize(&image);

        let dark = out.get_pixel(2, 32).0[0];
        let light = out.get_pixel(61, 32).0[0];
        assert!(dark < light, "dark = {dark}, light = {light}");
    }

    #[test]
    fn test_clahe_keeps_dark_block_dark() {
        let image = GrayImage::from_fn(64, 64, |x, y| {
            let inside = (24..40).contains(&x) && (24..40).contains(&y);
            Luma([if inside { 0 } else { 255 }])
        });
        let out = ClaheEqualizer::default().equalize(&image);

        assert!(out.get_pixel(31, 31).0[0] < 20);
        assert_eq!(out.get_pixel(2, 2).0[0], 255);
    }

    #[test]
    fn test_clahe_handles_images_smaller_than_grid() {
        let image = GrayImage::from_fn(3, 5, |x, y| Luma([(x * 40 + y * 10) as u8]));
        let out = ClaheEqualizer::default().equalize(&image);
        assert_eq!(out.dimensions(), (3, 5));
    }

    #[test]
    fn test_tile_spans_cover_axis() {
        let spans: Vec<_> = (0..8).map(|i| tile_span(i, 8, 100)).collect();
        assert_eq!(spans[0].0, 0);
        assert_eq!(spans[7].1, 100);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
