//! Geometry and image types shared by the imaging pipeline and the cache.
//!
//! Pixel geometry ([`Size`], [`Point`]) is kept in `f64` while the pipeline
//! computes; it is rounded to whole pixels only at the final crop and when
//! building cache keys.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Width and height in pixels. May be fractional mid-calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Round to whole pixels, never below 1×1.
    ///
    /// This is the rounding used for cache keys and the final crop, so two
    /// sizes that round to the same integers are the same request.
    pub fn pixel_dimensions(self) -> (u32, u32) {
        (round_pixels(self.width), round_pixels(self.height))
    }

    /// True when both dimensions are finite and strictly positive.
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.pixel_dimensions();
        write!(f, "{}x{}", w, h)
    }
}

fn round_pixels(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    value.round().min(u32::MAX as f64) as u32
}

/// A pixel-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point relative to an image's width and height, both components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Build a point, clamping each component into `[0, 1]`. NaN maps to 0.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// The salient region reported by a saliency model.
///
/// Saliency models label their corners inconsistently: the point called
/// "top left" is not guaranteed to hold the smallest x or y, and some models
/// report in a bottom-left-origin space. A `BoundingBox` is therefore stored
/// as an unordered cloud of four points. There are deliberately no
/// positional accessors; consumers reduce over [`points`](Self::points) or
/// use the min/max helpers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    points: [NormalizedPoint; 4],
}

impl BoundingBox {
    /// The box a model reports when it finds nothing: all four points at `{0,0}`.
    pub const DEGENERATE: Self = Self {
        points: [NormalizedPoint::ORIGIN; 4],
    };

    /// Build from a model's labelled corners. The labels are discarded.
    pub fn from_corners(
        top_left: NormalizedPoint,
        top_right: NormalizedPoint,
        bottom_left: NormalizedPoint,
        bottom_right: NormalizedPoint,
    ) -> Self {
        Self {
            points: [top_left, top_right, bottom_left, bottom_right],
        }
    }

    /// Build the axis-aligned box spanning `[min_x, max_x] × [min_y, max_y]`.
    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::from_corners(
            NormalizedPoint::new(min_x, min_y),
            NormalizedPoint::new(max_x, min_y),
            NormalizedPoint::new(min_x, max_y),
            NormalizedPoint::new(max_x, max_y),
        )
    }

    pub fn points(&self) -> &[NormalizedPoint; 4] {
        &self.points
    }

    pub fn min_x(&self) -> f64 {
        self.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
    }

    pub fn max_x(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_y(&self) -> f64 {
        self.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
    }

    pub fn max_y(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// True when every point sits on the same coordinate.
    pub fn is_degenerate(&self) -> bool {
        self.min_x() == self.max_x() && self.min_y() == self.max_y()
    }

    /// Centre of the box. See [`focal_point`](crate::imaging::focal_point).
    pub fn focal_point(&self) -> NormalizedPoint {
        crate::imaging::focal_point(self)
    }
}

/// An immutable decoded image.
///
/// The pixel buffer is shared: cloning an `Image` is cheap and every
/// transform in the pipeline produces a new one.
#[derive(Debug, Clone)]
pub struct Image {
    pixels: Arc<DynamicImage>,
    scale: f32,
}

impl Image {
    /// Wrap a decoded buffer at scale factor 1.0.
    pub fn new(pixels: DynamicImage) -> Self {
        Self::with_scale(pixels, 1.0)
    }

    /// Wrap a decoded buffer with an explicit device pixel ratio.
    pub fn with_scale(pixels: DynamicImage, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            pixels: Arc::new(pixels),
            scale,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn size(&self) -> Size {
        Size::from((self.width(), self.height()))
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    /// Cache accounting cost: four bytes per pixel regardless of encoding.
    pub fn cost(&self) -> usize {
        self.width() as usize * self.height() as usize * 4
    }

    /// True when both images share the same pixel buffer.
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}
