//! Image re-targeting in pure Rust, no system image libraries.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Load** | [`ImageSource`] → `image::ImageReader` |
//! | **Saliency** | content-fill resize to a small square + [`ContrastSaliency`] |
//! | **Focal point** | [`focal_point`] (min/max reduction over the box) |
//! | **Cover scale** | `resize_exact` to [`scaled_dimensions`] (Lanczos3 by default) |
//! | **Crop** | [`window_origin`] + `crop_imm` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Saliency**: [`SaliencyModel`] trait + [`SaliencyAnalyzer`]
//! - **Source**: [`ImageSource`] trait + [`FileImageSource`]
//! - **Operations**: Pixel work combining calculations, saliency and scaling

mod calculations;
pub mod operations;
pub mod saliency;
pub mod source;

pub use calculations::{
    analysis_dimensions, focal_point, pixel_origin, scaled_dimensions, window_origin,
};
pub use operations::{
    CropError, MAX_SCALED_PIXELS, PipelineOptions, RetargetError, RetargetPlan, check_target, crop,
    plan_retarget, retarget_image, scale,
};
pub use saliency::{ContrastSaliency, SaliencyAnalyzer, SaliencyError, SaliencyModel};
pub use source::{FileImageSource, ImageSource, SourceError, is_supported_photo};
