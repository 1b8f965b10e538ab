pub mod resize;
pub mod luminance;
pub mod smoothing;
pub mod threshold;
pub mod morphology;
pub mod extraction;
pub mod scoring;
pub mod projection;
pub mod overlay;

pub use resize::*;
pub use luminance::*;
pub use smoothing::*;
pub use threshold::*;
pub use morphology::*;
pub use extraction::*;
pub use scoring::*;
pub use projection::*;
pub use overlay::*;
