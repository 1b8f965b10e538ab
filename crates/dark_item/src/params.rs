use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a single detection.
///
/// The core uses these values as given. Callers that accept them from an untrusted
/// source should run [`DetectParams::clamped`] first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectParams {
    /// Working resolution width in pixels
    #[serde(alias = "target_width")]
    #[schemars(range(min = 200, max = 4000))]
    pub target_width: u32,

    /// Gaussian kernel size, forced odd
    #[serde(alias = "blur_kernel")]
    #[schemars(range(min = 1, max = 51))]
    pub blur_kernel: u32,

    /// Smallest accepted region, as a fraction of the working image area
    #[serde(alias = "min_area_ratio")]
    #[schemars(range(min = 0.0, max = 0.5))]
    pub min_area_ratio: f64,

    /// Largest accepted region, as a fraction of the working image area
    #[serde(alias = "max_area_ratio")]
    #[schemars(range(min = 0.1, max = 1.0))]
    pub max_area_ratio: f64,

    /// Score multiplier for regions touching the image border
    #[serde(alias = "edge_penalty")]
    #[schemars(range(min = 0.0, max = 1.0))]
    pub edge_penalty: f64,

    /// Polygon simplification tolerance in working-resolution pixels
    #[serde(alias = "approx_eps")]
    #[schemars(range(min = 0.0, max = 20.0))]
    pub approx_eps: f64,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            target_width: 960,
            blur_kernel: 5,
            min_area_ratio: 0.005,
            max_area_ratio: 0.90,
            edge_penalty: 0.8,
            approx_eps: 2.0,
        }
    }
}

impl DetectParams {
    pub const TARGET_WIDTH_RANGE: (u32, u32) = (200, 4000);
    pub const BLUR_KERNEL_RANGE: (u32, u32) = (1, 51);
    pub const MIN_AREA_RATIO_RANGE: (f64, f64) = (0.0, 0.5);
    pub const MAX_AREA_RATIO_RANGE: (f64, f64) = (0.1, 1.0);
    pub const EDGE_PENALTY_RANGE: (f64, f64) = (0.0, 1.0);
    pub const APPROX_EPS_RANGE: (f64, f64) = (0.0, 20.0);

    /// Get the JSON schema for the parameter set
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DetectParams)
    }

    /// Blur kernel size rounded up to the next odd value (`0` becomes `1`).
    pub fn odd_blur_kernel(&self) -> u32 {
        self.blur_kernel | 1
    }

    /// Copy with every field pulled into its accepted range. Non-finite reals
    /// fall back to their defaults.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            target_width: self
                .target_width
                .clamp(Self::TARGET_WIDTH_RANGE.0, Self::TARGET_WIDTH_RANGE.1),
            blur_kernel: self
                .blur_kernel
                .clamp(Self::BLUR_KERNEL_RANGE.0, Self::BLUR_KERNEL_RANGE.1),
            min_area_ratio: clamp_finite(
                self.min_area_ratio,
                Self::MIN_AREA_RATIO_RANGE,
                defaults.min_area_ratio,
            ),
            max_area_ratio: clamp_finite(
                self.max_area_ratio,
                Self::MAX_AREA_RATIO_RANGE,
                defaults.max_area_ratio,
            ),
            edge_penalty: clamp_finite(
                self.edge_penalty,
                Self::EDGE_PENALTY_RANGE,
                defaults.edge_penalty,
            ),
            approx_eps: clamp_finite(self.approx_eps, Self::APPROX_EPS_RANGE, defaults.approx_eps),
        }
    }
}

fn clamp_finite(value: f64, (min, max): (f64, f64), fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
