use image::{GrayImage, Luma};
use crate::{error::Result, traits::GrayStage};

const FOREGROUND: u8 = 255;

/// Marks dark pixels as foreground by OR-ing an inverted Otsu threshold with a
/// percentile floor.
#[derive(Debug, Clone)]
pub struct DarkMaskBuilder {
    /// Percentile (0..=100) whose value and everything below it is always dark
    pub percentile: f64,
}

impl Default for DarkMaskBuilder {
    fn default() -> Self {
        Self { percentile: 20.0 }
    }
}

/// Thresholds picked for one luminance map. `None` means that half of the mask
/// is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DarkThresholds {
    pub otsu: Option<u8>,
    pub floor: Option<u8>,
}

impl DarkThresholds {
    pub fn is_dark(&self, value: u8) -> bool {
        self.otsu.is_some_and(|t| value <= t) || self.floor.is_some_and(|t| value <= t)
    }
}

impl DarkMaskBuilder {
    pub fn thresholds(&self, luminance: &GrayImage) -> DarkThresholds {
        let hist = histogram(luminance);
        let Some((min, max)) = value_range(&hist) else {
            return DarkThresholds {
                otsu: None,
                floor: None,
            };
        };

        // A single-valued map has no split, and a floor at the maximum would take the
        // whole frame.
        let otsu = (min < max).then(|| imageproc::contrast::otsu_level(luminance));
        let floor = Some(percentile(&hist, self.percentile)).filter(|&p| p < max);

        DarkThresholds { otsu, floor }
    }

    pub fn build(&self, luminance: &GrayImage) -> GrayImage {
        let thresholds = self.thresholds(luminance);
        tracing::debug!(
            otsu = ?thresholds.otsu,
            floor = ?thresholds.floor,
            "dark mask thresholds"
        );

        GrayImage::from_fn(luminance.width(), luminance.height(), |x, y| {
            if thresholds.is_dark(luminance.get_pixel(x, y).0[0]) {
                Luma([FOREGROUND])
            } else {
                Luma([0])
            }
        })
    }
}

impl GrayStage for DarkMaskBuilder {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(self.build(image))
    }
}

fn histogram(image: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for pixel in image.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }
    hist
}

fn value_range(hist: &[u64; 256]) -> Option<(u8, u8)> {
    let min = hist.iter().position(|&c| c > 0)?;
    let max = hist.iter().rposition(|&c| c > 0)?;
    Some((min as u8, max as u8))
}

/// Value at `rank` in the sorted pixel sequence.
fn order_statistic(hist: &[u64; 256], rank: u64) -> u8 {
    let mut seen = 0u64;
    for (value, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > rank {
            return value as u8;
        }
    }
    255
}

/// Percentile with linear interpolation between neighbouring order statistics,
/// truncated to an integer level.
pub fn percentile(hist: &[u64; 256], q: f64) -> u8 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let rank = (total - 1) as f64 * (q.clamp(0.0, 100.0) / 100.0);
    let lower = rank.floor() as u64;
    let upper = (lower + 1).min(total - 1);
    let frac = rank - lower as f64;

    let lo = order_statistic(hist, lower) as f64;
    let hi = order_statistic(hist, upper) as f64;
    (lo + (hi - lo) * frac).floor() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_histogram() -> [u64; 256] {
        let mut hist = [0u64; 256];
        for v in 0..100 {
            hist[v] = 1;
        }
        hist
    }

    #[test]
    fn test_percentile_interpolates_then_truncates() {
        let hist = ramp_histogram();
        // rank 19.8 between 19 and 20
        assert_eq!(percentile(&hist, 20.0), 19);
        assert_eq!(percentile(&hist, 0.0), 0);
        assert_eq!(percentile(&hist, 100.0), 99);
        assert_eq!(percentile(&hist, 50.0), 49);
    }

    #[test]
    fn test_percentile_with_repeated_values() {
        let mut hist = [0u64; 256];
        hist[10] = 3;
        hist[200] = 7;
        assert_eq!(percentile(&hist, 20.0), 10);
        assert_eq!(percentile(&hist, 90.0), 200);
    }

    #[test]
    fn test_uniform_map_has_no_dark_pixels() {
        for level in [0u8, 128, 255] {
            let image = GrayImage::from_pixel(30, 30, Luma([level]));
            let builder = DarkMaskBuilder::default();
            assert_eq!(
                builder.thresholds(&image),
                DarkThresholds {
                    otsu: None,
                    floor: None
                }
            );
            assert!(builder.build(&image).pixels().all(|p| p.0[0] == 0));
        }
    }

    #[test]
    fn test_bimodal_map_marks_dark_mode() {
        let image = GrayImage::from_fn(40, 40, |x, _| Luma([if x < 10 { 20 } else { 230 }]));
        let mask = DarkMaskBuilder::default().build(&image);

        assert_eq!(mask.get_pixel(0, 0).0[0], 255);
        assert_eq!(mask.get_pixel(9, 39).0[0], 255);
        assert_eq!(mask.get_pixel(10, 0).0[0], 0);
        assert_eq!(mask.get_pixel(39, 20).0[0], 0);
    }

    #[test]
    fn test_floor_catches_darkest_fifth() {
        // Smooth ramp: the floor alone guarantees the darkest columns are included.
        let image = GrayImage::from_fn(100, 10, |x, _| Luma([(x * 2 + 40) as u8]));
        let builder = DarkMaskBuilder::default();
        let thresholds = builder.thresholds(&image);
        let floor = thresholds.floor.expect("ramp has a floor below its maximum");

        let mask = builder.build(&image);
        for x in 0..100 {
            let value = (x * 2 + 40) as u8;
            if value <= floor {
                assert_eq!(mask.get_pixel(x, 5).0[0], 255, "column {x}");
            }
        }
        let dark = mask.pixels().filter(|p| p.0[0] == 255).count();
        assert!(dark >= 200, "only {dark} dark pixels");
    }

    #[test]
    fn test_floor_at_maximum_is_dropped() {
        // 85% of the frame sits at the maximum, so the 20th percentile equals it
        let image = GrayImage::from_fn(20, 5, |x, y| {
            Luma([if y * 20 + x < 15 { 50 } else { 200 }])
        });
        let builder = DarkMaskBuilder::default();
        let thresholds = builder.thresholds(&image);
        assert_eq!(thresholds.floor, None);
        assert!(thresholds.otsu.is_some_and(|t| (50..200).contains(&t)));

        let mask = builder.build(&image);
        let dark = mask.pixels().filter(|p| p.0[0] == 255).count();
        assert_eq!(dark, 15);
        assert_eq!(mask.get_pixel(19, 4).0[0], 0);
    }

    #[test]
    fn test_mask_is_binary() {
        let image = GrayImage::from_fn(32, 32, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let mask = DarkMaskBuilder::default().build(&image);
        assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}
