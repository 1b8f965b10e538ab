use geo_types::Coord;
use image::{DynamicImage, RgbImage};
use crate::{
    algorithms::{
        CandidateScorer, DarkMaskBuilder, ExternalContourExtractor, GaussianSmoother,
        GeometryProjector, LuminanceExtractor, MaskCleaner, OverlayRenderer, Resizer,
    },
    error::Result,
    params::DetectParams,
    traits::{GrayStage, RegionExtractor},
    types::{DetectionItem, DetectionResult, ScaleFactor},
};

/// Single-object dark item detection, run once per image.
///
/// Stages run strictly forward: resize, luminance, smoothing, dark mask and cleanup,
/// region extraction, scoring, then projection back to original coordinates. A
/// pipeline holds configuration only, so one instance can serve any number of
/// images, including concurrently.
pub struct Pipeline {
    resizer: Resizer,
    luminance: LuminanceExtractor,
    smoother: Box<dyn GrayStage>,
    mask_stages: Vec<Box<dyn GrayStage>>,
    region_extractor: Box<dyn RegionExtractor>,
    scorer: CandidateScorer,
    projector: GeometryProjector,
    renderer: OverlayRenderer,
}

/// Everything one run produces before it is packaged for a caller.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub width: u32,
    pub height: u32,
    pub scale: ScaleFactor,
    /// Resized copy all detection work ran on
    pub working: RgbImage,
    pub item: Option<DetectionItem>,
    /// Simplified outline of the item in working coordinates
    pub outline: Vec<Coord<f64>>,
}

impl Pipeline {
    /// Build the standard stage sequence from a parameter set. Values are used as
    /// given; see [`DetectParams::clamped`].
    pub fn new(params: &DetectParams) -> Self {
        Self {
            resizer: Resizer::new(params.target_width),
            luminance: LuminanceExtractor::default(),
            smoother: Box::new(GaussianSmoother::new(params.odd_blur_kernel())),
            mask_stages: vec![
                Box::new(DarkMaskBuilder::default()),
                Box::new(MaskCleaner::default()),
            ],
            region_extractor: Box::new(ExternalContourExtractor),
            scorer: CandidateScorer::from_params(params),
            projector: GeometryProjector::new(params.approx_eps),
            renderer: OverlayRenderer::default(),
        }
    }

    /// Swap the region extractor. Candidate order, and with it tie resolution, is
    /// whatever the replacement yields.
    pub fn with_region_extractor<E>(mut self, extractor: E) -> Self
    where
        E: RegionExtractor + 'static,
    {
        self.region_extractor = Box::new(extractor);
        self
    }

    pub fn with_renderer(mut self, renderer: OverlayRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn analyze(&self, image: &DynamicImage) -> Result<Analysis> {
        let (width, height) = (image.width(), image.height());
        let (working, scale) = self.resizer.resize(image)?;

        let luminance = self.luminance.extract(&working)?;
        let smoothed = self.smoother.apply(&luminance)?;

        let mut mask = smoothed.clone();
        for stage in &self.mask_stages {
            mask = stage.apply(&mask)?;
        }

        let regions = self.region_extractor.extract_regions(&mask)?;
        let candidates = regions.len();
        let winner = self.scorer.select(regions, &smoothed);

        let (item, outline) = match winner {
            Some(winner) => {
                tracing::debug!(
                    candidates,
                    area = winner.region.area,
                    score = winner.score,
                    touches_edge = winner.touches_edge,
                    "selected dark item"
                );
                let outline = self.projector.simplify(&winner.region.contour);
                (Some(self.projector.project(&winner, scale)), outline)
            }
            None => {
                tracing::debug!(candidates, "no region passed the area filter");
                (None, Vec::new())
            }
        };

        Ok(Analysis {
            width,
            height,
            scale,
            working,
            item,
            outline,
        })
    }

    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult> {
        Ok(self.analyze(image)?.into_result(None))
    }

    pub fn detect_with_overlay(&self, image: &DynamicImage) -> Result<DetectionResult> {
        let analysis = self.analyze(image)?;
        let overlay = analysis.overlay(&self.renderer);
        Ok(analysis.into_result(Some(overlay)))
    }

    /// Working-resolution image with the item outline drawn on it.
    pub fn render_overlay(&self, image: &DynamicImage) -> Result<RgbImage> {
        Ok(self.analyze(image)?.overlay(&self.renderer))
    }
}

impl Analysis {
    /// The working image with the outline drawn, or an unchanged copy when nothing
    /// was selected.
    pub fn overlay(&self, renderer: &OverlayRenderer) -> RgbImage {
        renderer.render(&self.working, &self.outline)
    }

    pub fn into_result(self, overlay: Option<RgbImage>) -> DetectionResult {
        DetectionResult {
            width: self.width,
            height: self.height,
            item: self.item,
            scale: self.scale.forward(),
            overlay,
        }
    }
}
