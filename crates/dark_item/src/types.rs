use image::{GrayImage, RgbImage};
use imageproc::{point::Point as PixelPoint, rect::Rect};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Ratio `working_width / original_width`.
///
/// Used forward to map original coordinates into the working image and inverted to
/// map working geometry back onto the original.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(working_width: u32, original_width: u32) -> Result<Self> {
        if working_width == 0 || original_width == 0 {
            return Err(DetectError::InvalidInput(format!(
                "cannot scale {original_width}px to {working_width}px"
            )));
        }
        Ok(Self(working_width as f64 / original_width as f64))
    }

    pub fn forward(self) -> f64 {
        self.0
    }

    pub fn inverse(self) -> f64 {
        1.0 / self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// Axis-aligned box, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            w: self.w * factor,
            h: self.h * factor,
        }
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.left() as f64,
            y: rect.top() as f64,
            w: rect.width() as f64,
            h: rect.height() as f64,
        }
    }
}

/// Minimum-area rectangle. `angle` is in degrees within `[0, 90)` and is the
/// inclination of the `w` side against the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    pub angle: f64,
}

impl RotatedBox {
    /// Scales position and size; rotation is scale invariant.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            cx: self.cx * factor,
            cy: self.cy * factor,
            w: self.w * factor,
            h: self.h * factor,
            angle: self.angle,
        }
    }
}

/// The selected dark item, in original-image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionItem {
    pub polygon: Vec<Point>,
    pub area: f64,
    pub bbox: BoundingBox,
    pub rbox: RotatedBox,
    pub touches_edge: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Original image dimensions
    pub width: u32,
    pub height: u32,
    pub item: Option<DetectionItem>,
    /// Forward scale factor of the working image
    #[serde(skip)]
    pub scale: f64,
    /// Outline drawn over the working-resolution image, when requested
    #[serde(skip)]
    pub overlay: Option<RgbImage>,
}

/// A connected dark component found in the cleaned mask, in working coordinates.
#[derive(Debug, Clone)]
pub struct Region {
    /// Outer boundary pixels in tracing order
    pub contour: Vec<PixelPoint<i32>>,
    pub bounds: Rect,
    /// Filled boundary, sized and positioned like `bounds`
    pub fill: GrayImage,
    /// Number of pixels in `fill`
    pub area: f64,
}

impl Region {
    pub fn new(contour: Vec<PixelPoint<i32>>, bounds: Rect, fill: GrayImage) -> Self {
        let area = fill.pixels().filter(|p| p.0[0] > 0).count() as f64;
        Self {
            contour,
            bounds,
            fill,
            area,
        }
    }
}

/// A region that passed the area filter, with the values it was ranked by.
#[derive(Debug, Clone)]
pub struct ScoredRegion {
    pub region: Region,
    pub touches_edge: bool,
    pub mean_luminance: f64,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_is_exact_ratio() {
        let scale = ScaleFactor::new(960, 1200).unwrap();
        assert_eq!(scale.forward(), 960.0 / 1200.0);
        assert_eq!(scale.inverse(), 1.0 / (960.0 / 1200.0));
    }

    #[test]
    fn test_scale_factor_rejects_zero() {
        assert!(matches!(
            ScaleFactor::new(0, 100),
            Err(DetectError::InvalidInput(_))
        ));
        assert!(ScaleFactor::new(100, 0).is_err());
    }

    #[test]
    fn test_bbox_round_trip() {
        let scale = ScaleFactor::new(960, 3000).unwrap();
        let bbox = BoundingBox {
            x: 123.0,
            y: 45.5,
            w: 812.25,
            h: 77.0,
        };
        let back = bbox.scaled(scale.forward()).scaled(scale.inverse());
        for (a, b) in [
            (bbox.x, back.x),
            (bbox.y, back.y),
            (bbox.w, back.w),
            (bbox.h, back.h),
        ] {
            assert!((a - b).abs() < 1e-9, "{a} != {b}");
        }
    }

    #[test]
    fn test_rotated_box_keeps_angle() {
        let rbox = RotatedBox {
            cx: 10.0,
            cy: 20.0,
            w: 4.0,
            h: 2.0,
            angle: 33.0,
        };
        let scaled = rbox.scaled(2.5);
        assert_eq!(scaled.angle, 33.0);
        assert_eq!(scaled.cx, 25.0);
        assert_eq!(scaled.h, 5.0);
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = DetectionItem {
            polygon: vec![Point { x: 1.0, y: 2.0 }],
            area: 3.0,
            bbox: BoundingBox {
                x: 0.0,
                y: 0.0,
                w: 1.0,
                h: 1.0,
            },
            rbox: RotatedBox {
                cx: 0.5,
                cy: 0.5,
                w: 1.0,
                h: 1.0,
                angle: 0.0,
            },
            touches_edge: true,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["touchesEdge"], serde_json::Value::Bool(true));
        assert!(json.get("touches_edge").is_none());
    }

    #[test]
    fn test_absent_item_serializes_as_null() {
        let result = DetectionResult {
            width: 10,
            height: 20,
            item: None,
            scale: 1.0,
            overlay: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["item"].is_null());
        assert_eq!(json["width"], 10);
        assert!(json.get("scale").is_none());
    }
}
