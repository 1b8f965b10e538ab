use geo::{MinimumRotatedRect, Simplify};
use geo_types::{Coord, LineString, MultiPoint, Point as GeoPoint};
use imageproc::point::Point as PixelPoint;
use crate::types::{
    BoundingBox, DetectionItem, Point, RotatedBox, ScaleFactor, ScoredRegion,
};

const ANGLE_EPS: f64 = 1e-9;

/// Simplifies the winning boundary and maps its geometry back to original-image
/// coordinates.
#[derive(Debug, Clone)]
pub struct GeometryProjector {
    /// Douglas-Peucker tolerance in working-resolution pixels
    pub approx_eps: f64,
}

impl Default for GeometryProjector {
    fn default() -> Self {
        Self { approx_eps: 2.0 }
    }
}

impl GeometryProjector {
    pub fn new(approx_eps: f64) -> Self {
        Self { approx_eps }
    }

    /// Douglas-Peucker over the closed ring, in working coordinates. The closing
    /// point is not repeated in the output.
    pub fn simplify(&self, contour: &[PixelPoint<i32>]) -> Vec<Coord<f64>> {
        let mut coords: Vec<Coord<f64>> = contour
            .iter()
            .map(|p| Coord {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect();
        coords.dedup();
        if coords.len() < 3 || self.approx_eps <= 0.0 {
            return coords;
        }

        coords.push(coords[0]);
        let mut ring = LineString::new(coords).simplify(&self.approx_eps).0;
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        ring
    }

    pub fn project(&self, winner: &ScoredRegion, scale: ScaleFactor) -> DetectionItem {
        let inv = scale.inverse();
        let region = &winner.region;

        let polygon = self
            .simplify(&region.contour)
            .into_iter()
            .map(|c| Point { x: c.x, y: c.y }.scaled(inv))
            .collect();

        DetectionItem {
            polygon,
            area: region.area * inv * inv,
            bbox: BoundingBox::from(region.bounds).scaled(inv),
            rbox: rotated_box(&region.contour).scaled(inv),
            touches_edge: winner.touches_edge,
        }
    }
}

/// Minimum-area rectangle around the contour points.
pub fn rotated_box(points: &[PixelPoint<i32>]) -> RotatedBox {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| GeoPoint::new(p.x as f64, p.y as f64))
        .collect();

    let corners: Vec<Coord<f64>> = multi
        .minimum_rotated_rect()
        .map(|rect| rect.exterior().0.clone())
        .unwrap_or_default();

    if corners.len() < 4 {
        return axis_aligned_box(points);
    }

    let center = Coord {
        x: corners[..4].iter().map(|c| c.x).sum::<f64>() / 4.0,
        y: corners[..4].iter().map(|c| c.y).sum::<f64>() / 4.0,
    };
    let a = corners[1] - corners[0];
    let b = corners[2] - corners[1];

    let (mut w, mut h) = (a.x.hypot(a.y), b.x.hypot(b.y));
    let mut angle = a.y.atan2(a.x).to_degrees().rem_euclid(180.0);
    if angle >= 180.0 - ANGLE_EPS {
        angle = 0.0;
    }
    if angle >= 90.0 - ANGLE_EPS {
        angle = (angle - 90.0).max(0.0);
        std::mem::swap(&mut w, &mut h);
    }

    RotatedBox {
        cx: center.x,
        cy: center.y,
        w,
        h,
        angle,
    }
}

fn axis_aligned_box(points: &[PixelPoint<i32>]) -> RotatedBox {
    let xs = points.iter().map(|p| p.x as f64);
    let ys = points.iter().map(|p| p.y as f64);
    let (min_x, max_x) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (min_y, max_y) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min_x.is_finite() || !min_y.is_finite() {
        return RotatedBox {
            cx: 0.0,
            cy: 0.0,
            w: 0.0,
            h: 0.0,
            angle: 0.0,
        };
    }

    RotatedBox {
        cx: (min_x + max_x) / 2.0,
        cy: (min_y + max_y) / 2.0,
        w: max_x - min_x,
        h: max_y - min_y,
        angle: 0.0,
    }
}
