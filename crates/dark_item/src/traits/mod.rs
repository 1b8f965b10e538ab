use image::GrayImage;
use crate::{error::Result, types::Region};

/// A single-channel image-to-image stage (equalization, blur, thresholding, morphology)
pub trait GrayStage: Send + Sync {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for turning a cleaned binary mask into candidate regions
pub trait RegionExtractor: Send + Sync {
    /// Extract the outer regions of a binary mask, in a deterministic order
    fn extract_regions(&self, mask: &GrayImage) -> Result<Vec<Region>>;
}
