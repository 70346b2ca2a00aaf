//! High-level image operations.
//!
//! These functions combine the pure calculations with pixel work on the
//! `image` crate. [`retarget_image`] is the whole pipeline:
//!
//! ```text
//! source ─┬─ analysis copy (≤ max_analysis_dimension) → saliency → focal point
//!         └─ scale to cover target ──────────────────────────────┐
//!                                                   crop window ─┴→ target-size image
//! ```

use super::calculations::{
    analysis_dimensions, focal_point, pixel_origin, scaled_dimensions, window_origin,
};
use super::saliency::SaliencyAnalyzer;
use crate::config::RetargetConfig;
use crate::types::{Image, NormalizedPoint, Size};
use image::DynamicImage;
use image::imageops::FilterType;
use std::borrow::Cow;
use thiserror::Error;

/// Errors a caller of the pipeline can see.
///
/// Saliency and crop failures never surface here; they degrade to a
/// best-effort image instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetargetError {
    #[error("Invalid source image: {0}")]
    InvalidSource(String),
    #[error("Source image not found: {0}")]
    SourceNotFound(String),
    #[error("Retarget task did not complete: {0}")]
    Runtime(String),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, RetargetError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CropError {
    #[error("Crop {width}x{height} at ({x}, {y}) exceeds {bounds_width}x{bounds_height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bounds_width: u32,
        bounds_height: u32,
    },
}

/// Tunables for [`retarget_image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    /// Longest side of the copy handed to saliency analysis.
    pub max_analysis_dimension: u32,
    /// Resampling filter for the cover scale.
    pub filter: FilterType,
}

impl PipelineOptions {
    pub fn from_config(config: &RetargetConfig) -> Self {
        Self {
            max_analysis_dimension: config.saliency.max_analysis_dimension,
            filter: config.scaling.filter.into(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&RetargetConfig::default())
    }
}

/// Pixel geometry for one re-targeting, computed without touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetargetPlan {
    /// Buffer size the source is scaled to.
    pub scaled: (u32, u32),
    /// Top-left of the crop window inside the scaled buffer.
    pub origin: (u32, u32),
    /// Final crop size.
    pub crop: (u32, u32),
}

/// Plan a re-targeting without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_retarget(source: Size, target: Size, focal: NormalizedPoint) -> RetargetPlan {
    let scaled = scaled_pixel_dimensions(source, target);
    let crop = target.pixel_dimensions();
    let origin = window_origin(Size::from(scaled), target, focal);

    RetargetPlan {
        scaled,
        origin: pixel_origin(origin, crop, scaled),
        crop,
    }
}

/// Whole-pixel buffer size for a cover scale. Rounds up so the buffer still
/// covers the target after fractional math.
fn scaled_pixel_dimensions(source: Size, target: Size) -> (u32, u32) {
    let dims = scaled_dimensions(source, target);
    let cover = |v: f64| (v - 1e-6).ceil().max(1.0) as u32;
    (cover(dims.width), cover(dims.height))
}

/// Largest cover-scale buffer the pipeline will allocate: 2^28 pixels, 1 GiB of RGBA.
pub const MAX_SCALED_PIXELS: f64 = 268_435_456.0;

/// Reject targets that can never be rendered, before any I/O.
pub fn check_target(target: Size) -> Result<()> {
    if !target.is_positive() {
        return Err(RetargetError::InvalidSource(format!(
            "target size must be positive, got {}x{}",
            target.width, target.height
        )));
    }
    Ok(())
}

fn check_inputs(source: &Image, target: Size) -> Result<()> {
    if source.width() == 0 || source.height() == 0 {
        return Err(RetargetError::InvalidSource(format!(
            "source has zero dimension ({}x{})",
            source.width(),
            source.height()
        )));
    }
    check_target(target)?;

    let scaled = scaled_dimensions(source.size(), target);
    let pixels = scaled.width.ceil() * scaled.height.ceil();
    if !pixels.is_finite() || pixels > MAX_SCALED_PIXELS {
        return Err(RetargetError::InvalidSource(format!(
            "covering {} from {}x{} needs a {:.0}x{:.0} buffer, over the {} pixel limit",
            target,
            source.width(),
            source.height(),
            scaled.width,
            scaled.height,
            MAX_SCALED_PIXELS
        )));
    }
    Ok(())
}

/// Scale `source` so it covers `target` on both axes, preserving aspect.
pub fn scale(source: &Image, target: Size, filter: FilterType) -> Result<Image> {
    check_inputs(source, target)?;
    let (width, height) = scaled_pixel_dimensions(source.size(), target);
    let resized = source.pixels().resize_exact(width, height, filter);
    Ok(Image::with_scale(resized, source.scale()))
}

/// Cut a `size` window at `origin` out of `image`.
pub fn crop(
    image: &Image,
    origin: (u32, u32),
    size: (u32, u32),
) -> std::result::Result<Image, CropError> {
    let (x, y) = origin;
    let (width, height) = size;
    let fits_x = x.checked_add(width).is_some_and(|end| end <= image.width());
    let fits_y = y.checked_add(height).is_some_and(|end| end <= image.height());
    if !fits_x || !fits_y {
        return Err(CropError::OutOfBounds {
            x,
            y,
            width,
            height,
            bounds_width: image.width(),
            bounds_height: image.height(),
        });
    }

    let cropped = image.pixels().crop_imm(x, y, width, height);
    Ok(Image::with_scale(cropped, image.scale()))
}

/// Crop, falling back to the uncropped image if the crop cannot be taken.
fn crop_or_scaled(scaled: Image, origin: (u32, u32), size: (u32, u32)) -> Image {
    match crop(&scaled, origin, size) {
        Ok(cropped) => cropped,
        Err(e) => {
            tracing::warn!(error = %e, "crop failed, returning scaled image");
            scaled
        }
    }
}

/// Produce the copy used for saliency analysis.
fn analysis_copy(image: &DynamicImage, max_dimension: u32) -> Cow<'_, DynamicImage> {
    match analysis_dimensions((image.width(), image.height()), max_dimension) {
        Some((w, h)) => Cow::Owned(image.resize_exact(w, h, FilterType::Triangle)),
        None => Cow::Borrowed(image),
    }
}

/// Re-target `source` to exactly `target` pixels around its salient region.
///
/// Synchronous and CPU-bound; async callers go through
/// [`Retargeter`](crate::retarget::Retargeter), which moves this onto the
/// blocking pool.
pub fn retarget_image(
    source: &Image,
    target: Size,
    analyzer: &SaliencyAnalyzer,
    options: &PipelineOptions,
) -> Result<Image> {
    check_inputs(source, target)?;

    let analysis = analysis_copy(source.pixels(), options.max_analysis_dimension);
    let focal = focal_point(&analyzer.analyze(&analysis));
    drop(analysis);

    let plan = plan_retarget(source.size(), target, focal);
    let scaled = scale(source, target, options.filter)?;
    tracing::debug!(
        source_width = source.width(),
        source_height = source.height(),
        scaled_width = scaled.width(),
        scaled_height = scaled.height(),
        origin_x = plan.origin.0,
        origin_y = plan.origin.1,
        focal_x = focal.x,
        focal_y = focal.y,
        "retarget plan"
    );

    Ok(crop_or_scaled(scaled, plan.origin, plan.crop))
}
