//! Pure calculation functions for re-targeting geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::{BoundingBox, NormalizedPoint, Point, Size};

/// Reduce a saliency box to its centre.
///
/// The box's corner labels are never trusted: all four x-values and all four
/// y-values are reduced independently, so swapped or inverted corners give
/// the same answer as a well-ordered box.
///
/// ```
/// # use stayhappy_imaging::imaging::focal_point;
/// # use stayhappy_imaging::types::BoundingBox;
/// let bbox = BoundingBox::from_extents(0.2, 0.4, 0.6, 1.0);
/// let focal = focal_point(&bbox);
/// assert!((focal.x - 0.4).abs() < 1e-9);
/// assert!((focal.y - 0.7).abs() < 1e-9);
/// ```
pub fn focal_point(bbox: &BoundingBox) -> NormalizedPoint {
    let (min_x, max_x) = (bbox.min_x(), bbox.max_x());
    let (min_y, max_y) = (bbox.min_y(), bbox.max_y());

    NormalizedPoint::new(
        min_x + (max_x - min_x) / 2.0,
        min_y + (max_y - min_y) / 2.0,
    )
}

/// Calculate dimensions that cover `target` on both axes while keeping the
/// source aspect ratio.
///
/// Width drives first; if that leaves the height short, height drives
/// instead. The result may be fractional. Callers must pass a source with
/// non-zero dimensions.
///
/// # Arguments
/// * `source` - Original image dimensions
/// * `target` - Area the result must cover
///
/// # Returns
/// * `Size` - At least `target` on both axes, same aspect as `source`
pub fn scaled_dimensions(source: Size, target: Size) -> Size {
    let aspect = source.width / source.height;

    let width = target.width;
    let height = target.width / aspect;
    if height < target.height {
        let height = target.height;
        return Size::new(height * aspect, height);
    }
    Size::new(width, height)
}

/// Calculate the top-left origin of a `target`-sized window inside `scaled`,
/// centred on `focal` and clamped so the window never leaves the image.
///
/// When `scaled` equals `target` on an axis the clamp range collapses to 0.
pub fn window_origin(scaled: Size, target: Size, focal: NormalizedPoint) -> Point {
    let center_x = focal.x * scaled.width;
    let center_y = focal.y * scaled.height;

    let raw_x = center_x - target.width / 2.0;
    let raw_y = center_y - target.height / 2.0;

    Point::new(
        clamp_axis(raw_x, scaled.width - target.width),
        clamp_axis(raw_y, scaled.height - target.height),
    )
}

fn clamp_axis(value: f64, upper: f64) -> f64 {
    if upper <= 0.0 {
        return 0.0;
    }
    value.clamp(0.0, upper)
}

/// Dimensions of the copy handed to saliency analysis.
///
/// Images whose longest side is within `max_dimension` are analysed as-is;
/// larger ones are scaled down so the longest side equals `max_dimension`.
/// Returns `None` when no downscale is needed.
pub fn analysis_dimensions(source: (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let (w, h) = source;
    let longest = w.max(h);
    if longest <= max_dimension {
        return None;
    }

    let ratio = max_dimension as f64 / longest as f64;
    let scale = |v: u32| ((v as f64 * ratio).round() as u32).max(1);
    Some((scale(w), scale(h)))
}

/// Round a fractional window origin to whole pixels and clamp it so a
/// `crop`-sized window stays inside `bounds`.
pub fn pixel_origin(origin: Point, crop: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let max_x = bounds.0.saturating_sub(crop.0);
    let max_y = bounds.1.saturating_sub(crop.1);
    let round = |v: f64, max: u32| {
        if v.is_finite() && v > 0.0 {
            (v.round() as u64).min(max as u64) as u32
        } else {
            0
        }
    };
    (round(origin.x, max_x), round(origin.y, max_y))
}
