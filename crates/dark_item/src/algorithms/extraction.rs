use image::{GrayImage, Luma};
use imageproc::{
    contours::{BorderType, find_contours},
    drawing::{draw_line_segment_mut, draw_polygon_mut},
    point::Point,
    rect::Rect,
};
use crate::{error::Result, traits::RegionExtractor, types::Region};

/// Imageproc-based extractor keeping only outermost boundaries.
///
/// Regions come out in border-following order: the mask is scanned top to bottom,
/// left to right, and a component is emitted when its first boundary pixel is met.
/// Scoring ties are resolved by this order, so it is part of the contract.
#[derive(Debug, Clone, Default)]
pub struct ExternalContourExtractor;

impl RegionExtractor for ExternalContourExtractor {
    fn extract_regions(&self, mask: &GrayImage) -> Result<Vec<Region>> {
        // Border following only opens an outer border after a background pixel, so
        // components in column 0 need a zero frame around the mask.
        let padded = pad_with_background(mask);
        let regions: Vec<Region> = find_contours::<i32>(&padded)
            .into_iter()
            // Outer borders nested in a hole belong to an enclosing region's fill.
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .map(|contour| {
                contour
                    .points
                    .into_iter()
                    .map(|p| Point::new(p.x - 1, p.y - 1))
                    .collect::<Vec<_>>()
            })
            .filter_map(region_from_contour)
            .collect();

        tracing::debug!(regions = regions.len(), "extracted outer regions");
        Ok(regions)
    }
}

/// Copy of `mask` inside a one-pixel background frame.
fn pad_with_background(mask: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);
    padded
}

fn region_from_contour(points: Vec<Point<i32>>) -> Option<Region> {
    let bounds = contour_bounds(&points)?;
    let fill = fill_contour(&points, bounds);
    let region = Region::new(points, bounds, fill);
    (region.area > 0.0).then_some(region)
}

/// Tight integer box around the contour pixels.
pub fn contour_bounds(points: &[Point<i32>]) -> Option<Rect> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32))
}

/// Rasterizes the boundary and everything it encloses into a mask shaped like
/// `bounds`.
pub fn fill_contour(points: &[Point<i32>], bounds: Rect) -> GrayImage {
    let mut fill = GrayImage::new(bounds.width(), bounds.height());
    let mut ring: Vec<Point<i32>> = points
        .iter()
        .map(|p| Point::new(p.x - bounds.left(), p.y - bounds.top()))
        .collect();
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    match ring.len() {
        0 => {}
        1 => fill.put_pixel(ring[0].x as u32, ring[0].y as u32, Luma([255])),
        n => {
            if n >= 3 {
                draw_polygon_mut(&mut fill, &ring, Luma([255]));
            }
            for (i, a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % n];
                draw_line_segment_mut(
                    &mut fill,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    Luma([255]),
                );
            }
        }
    }

    fill
}
