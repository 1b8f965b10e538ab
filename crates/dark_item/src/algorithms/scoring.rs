use image::GrayImage;
use imageproc::rect::Rect;
use crate::{
    params::DetectParams,
    types::{Region, ScoredRegion},
};

/// Ranks candidate regions by darkness, size and border contact.
///
/// `score = (255 - mean_luminance) * sqrt(area / image_area)`, multiplied by
/// `edge_penalty` when the region touches the border. Area enters through its square
/// root so a large, faintly dark patch does not automatically beat a smaller, truly
/// dark one.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    pub edge_penalty: f64,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::from_params(&DetectParams::default())
    }
}

impl CandidateScorer {
    pub fn from_params(params: &DetectParams) -> Self {
        Self {
            min_area_ratio: params.min_area_ratio,
            max_area_ratio: params.max_area_ratio,
            edge_penalty: params.edge_penalty,
        }
    }

    /// Both bounds are inclusive. Empty regions never pass.
    pub fn accepts_area(&self, area: f64, image_area: f64) -> bool {
        area > 0.0 && area >= image_area * self.min_area_ratio && area <= image_area * self.max_area_ratio
    }

    /// Scores one region against the smoothed luminance map, or drops it when its
    /// area is out of range.
    pub fn score(&self, region: Region, luminance: &GrayImage) -> Option<ScoredRegion> {
        let (width, height) = luminance.dimensions();
        let image_area = width as f64 * height as f64;
        if !self.accepts_area(region.area, image_area) {
            tracing::trace!(
                area = region.area,
                image_area,
                "region rejected by area ratio"
            );
            return None;
        }

        let touches_edge = touches_edge(region.bounds, width, height);
        let mean_luminance = mean_luminance(&region, luminance);
        let mut score = (255.0 - mean_luminance) * region.area.sqrt() / image_area.sqrt();
        if touches_edge {
            score *= self.edge_penalty;
        }

        tracing::trace!(
            area = region.area,
            mean_luminance,
            touches_edge,
            score,
            "scored region"
        );

        Some(ScoredRegion {
            region,
            touches_edge,
            mean_luminance,
            score,
        })
    }

    /// Highest-scoring region, `None` when nothing survives the area filter.
    /// Equal scores keep the region that came first.
    pub fn select<I>(&self, regions: I, luminance: &GrayImage) -> Option<ScoredRegion>
    where
        I: IntoIterator<Item = Region>,
    {
        regions
            .into_iter()
            .filter_map(|region| self.score(region, luminance))
            .fold(None, keep_first_max)
    }
}

/// Fold step: a candidate only replaces the current best when strictly greater.
pub fn keep_first_max(best: Option<ScoredRegion>, candidate: ScoredRegion) -> Option<ScoredRegion> {
    match best {
        Some(current) if candidate.score > current.score => Some(candidate),
        Some(current) => Some(current),
        None => Some(candidate),
    }
}

/// True when the box comes within one pixel of any border.
pub fn touches_edge(bounds: Rect, width: u32, height: u32) -> bool {
    let (x, y) = (bounds.left() as i64, bounds.top() as i64);
    let (w, h) = (bounds.width() as i64, bounds.height() as i64);
    let (width, height) = (width as i64, height as i64);
    x <= 1 || y <= 1 || x + w >= width - 1 || y + h >= height - 1
}

/// Average luminance under the region's filled mask.
pub fn mean_luminance(region: &Region, luminance: &GrayImage) -> f64 {
    let (left, top) = (region.bounds.left() as u32, region.bounds.top() as u32);
    let mut sum = 0u64;
    let mut count = 0u64;
    for (x, y, pixel) in region.fill.enumerate_pixels() {
        if pixel.0[0] > 0 {
            sum += luminance.get_pixel(left + x, top + y).0[0] as u64;
            count += 1;
        }
    }
    if count == 0 {
        255.0
    } else {
        sum as f64 / count as f64
    }
}
