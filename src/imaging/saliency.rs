//! Saliency analysis: where is the interesting part of a photo?
//!
//! [`SaliencyAnalyzer`] owns the fixed-cost preprocessing (a content-fill
//! resize to a small square) and the fallback policy. The actual detector is
//! a [`SaliencyModel`], so tests and embedders can swap it out.
//!
//! ## Default model
//!
//! [`ContrastSaliency`] is a pure-Rust edge/texture detector:
//!
//! | Step | Detail |
//! |---|---|
//! | Luminance | `DynamicImage::to_luma8` |
//! | Per-pixel score | `0.6 × gradient magnitude + 0.4 × 3×3 standard deviation` |
//! | Threshold | `mean + threshold_sigma × stddev` over the whole map |
//! | Object test | salient fraction ≥ `min_coverage`, map not flat |
//! | Box | `trim`…`1 − trim` percentile of salient columns and rows |
//!
//! Rows are scored in parallel with rayon.

use crate::config::SaliencyConfig;
use crate::types::BoundingBox;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaliencyError {
    #[error("Saliency model failed: {0}")]
    ModelFailed(String),
}

/// A detector that reports at most one salient object.
///
/// Coordinates are normalized to the analysed image. Corner order is not
/// part of the contract.
pub trait SaliencyModel: Send + Sync {
    fn salient_object(&self, image: &RgbImage) -> Result<Option<BoundingBox>, SaliencyError>;
}

/// Runs a [`SaliencyModel`] over a fixed-size copy of an image.
#[derive(Clone)]
pub struct SaliencyAnalyzer {
    model: Arc<dyn SaliencyModel>,
    analysis_side: u32,
}

impl SaliencyAnalyzer {
    pub fn new(model: Arc<dyn SaliencyModel>, analysis_side: u32) -> Self {
        Self {
            model,
            analysis_side: analysis_side.max(1),
        }
    }

    /// Analyzer backed by [`ContrastSaliency`] with the given settings.
    pub fn from_config(config: &SaliencyConfig) -> Self {
        Self::new(
            Arc::new(ContrastSaliency::from_config(config)),
            config.analysis_side,
        )
    }

    pub fn analysis_side(&self) -> u32 {
        self.analysis_side
    }

    /// Locate the salient region of `image`.
    ///
    /// Never fails: a model error or an empty result yields
    /// [`BoundingBox::DEGENERATE`], which downstream clamps into a valid
    /// top-left-biased crop.
    pub fn analyze(&self, image: &DynamicImage) -> BoundingBox {
        // Exact resize keeps normalized coordinates valid for the source.
        let square = image
            .resize_exact(self.analysis_side, self.analysis_side, FilterType::Triangle)
            .to_rgb8();

        match self.model.salient_object(&square) {
            Ok(Some(bbox)) => {
                tracing::debug!(
                    min_x = bbox.min_x(),
                    min_y = bbox.min_y(),
                    max_x = bbox.max_x(),
                    max_y = bbox.max_y(),
                    "salient object found"
                );
                bbox
            }
            Ok(None) => {
                tracing::debug!("no salient object, using degenerate box");
                BoundingBox::DEGENERATE
            }
            Err(e) => {
                tracing::warn!(error = %e, "saliency analysis failed, using degenerate box");
                BoundingBox::DEGENERATE
            }
        }
    }
}

impl std::fmt::Debug for SaliencyAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaliencyAnalyzer")
            .field("analysis_side", &self.analysis_side)
            .finish_non_exhaustive()
    }
}

/// Edge-density and local-contrast saliency detector.
///
/// See the [module docs](self) for the scoring steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastSaliency {
    pub threshold_sigma: f64,
    pub min_coverage: f64,
    pub trim: f64,
}

impl Default for ContrastSaliency {
    fn default() -> Self {
        Self::from_config(&SaliencyConfig::default())
    }
}

impl ContrastSaliency {
    pub fn from_config(config: &SaliencyConfig) -> Self {
        Self {
            threshold_sigma: config.threshold_sigma,
            min_coverage: config.min_coverage,
            trim: config.trim,
        }
    }
}

impl SaliencyModel for ContrastSaliency {
    fn salient_object(&self, image: &RgbImage) -> Result<Option<BoundingBox>, SaliencyError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SaliencyError::ModelFailed(format!(
                "cannot analyse a {}x{} image",
                width, height
            )));
        }

        let luma = DynamicImage::ImageRgb8(image.clone()).to_luma8();
        let map = saliency_map(&luma);

        let n = map.len() as f64;
        let mean = map.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = map
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let stddev = variance.sqrt();
        if stddev < 1e-6 {
            return Ok(None);
        }
        let threshold = mean + self.threshold_sigma * stddev;

        let mut columns = vec![0u32; width as usize];
        let mut rows = vec![0u32; height as usize];
        let mut salient = 0u64;
        for (idx, &score) in map.iter().enumerate() {
            if score as f64 > threshold {
                columns[idx % width as usize] += 1;
                rows[idx / width as usize] += 1;
                salient += 1;
            }
        }

        if salient == 0 || (salient as f64 / n) < self.min_coverage {
            return Ok(None);
        }

        let (lo_x, hi_x) = trimmed_span(&columns, self.trim);
        let (lo_y, hi_y) = trimmed_span(&rows, self.trim);

        Ok(Some(BoundingBox::from_extents(
            lo_x as f64 / width as f64,
            lo_y as f64 / height as f64,
            (hi_x + 1) as f64 / width as f64,
            (hi_y + 1) as f64 / height as f64,
        )))
    }
}

/// Score every pixel, row-major.
fn saliency_map(luma: &GrayImage) -> Vec<f32> {
    let (width, height) = luma.dimensions();
    let mut map = vec![0.0f32; width as usize * height as usize];

    map.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (x, out) in row.iter_mut().enumerate() {
                *out = pixel_score(luma, x as u32, y);
            }
        });

    map
}

fn pixel_score(luma: &GrayImage, x: u32, y: u32) -> f32 {
    let (width, height) = luma.dimensions();
    let at = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, width as i64 - 1) as u32;
        let cy = y.clamp(0, height as i64 - 1) as u32;
        luma.get_pixel(cx, cy)[0] as f32
    };
    let (xi, yi) = (x as i64, y as i64);

    let gx = at(xi + 1, yi) - at(xi - 1, yi);
    let gy = at(xi, yi + 1) - at(xi, yi - 1);
    let gradient = (gx * gx + gy * gy).sqrt();

    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let v = at(xi + dx, yi + dy);
            sum += v;
            sum_sq += v * v;
        }
    }
    let local_mean = sum / 9.0;
    let local_std = (sum_sq / 9.0 - local_mean * local_mean).max(0.0).sqrt();

    gradient * 0.6 + local_std * 0.4
}

/// Inclusive index span of a histogram after trimming `trim` of the mass
/// from each end. The histogram must be non-empty.
fn trimmed_span(histogram: &[u32], trim: f64) -> (usize, usize) {
    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    let cut = (total as f64 * trim).floor() as u64;

    let mut acc = 0u64;
    let mut lo = 0;
    for (i, &count) in histogram.iter().enumerate() {
        acc += count as u64;
        if acc > cut {
            lo = i;
            break;
        }
    }

    acc = 0;
    let mut hi = histogram.len() - 1;
    for (i, &count) in histogram.iter().enumerate().rev() {
        acc += count as u64;
        if acc > cut {
            hi = i;
            break;
        }
    }

    (lo, hi.max(lo))
}
