//! Re-targeting configuration.
//!
//! Handles loading, validating, and merging `stayhappy.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [cache]
//! max_entries = 50            # Cached images before LRU eviction
//! max_bytes = 104857600       # Byte budget (width * height * 4 per image)
//!
//! [saliency]
//! analysis_side = 250         # Square the analysis copy is resized to
//! max_analysis_dimension = 1024
//! threshold_sigma = 1.0       # Salient if score > mean + sigma * stddev
//! min_coverage = 0.005        # Fraction of salient pixels needed for an object
//! trim = 0.05                 # Percentile trimmed off each side of the box
//!
//! [scaling]
//! filter = "lanczos3"         # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [prerender]
//! batch_size = 5              # Photos rendered concurrently per batch
//! batch_pause_ms = 100        # Pause between batches
//! sizes = [[170, 170], [364, 170], [364, 382]]
//!
//! [processing]
//! max_threads = 4             # Saliency worker threads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `stayhappy.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetargetConfig {
    /// Retargeted-image cache limits.
    pub cache: CacheConfig,
    /// Saliency analysis settings.
    pub saliency: SaliencyConfig,
    /// Cover-scale resampling.
    pub scaling: ScalingConfig,
    /// Batch pre-rendering of widget sizes.
    pub prerender: PrerenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl RetargetConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache.max_entries must be non-zero".into(),
            ));
        }
        if self.cache.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "cache.max_bytes must be non-zero".into(),
            ));
        }
        if self.saliency.analysis_side < 8 {
            return Err(ConfigError::Validation(
                "saliency.analysis_side must be at least 8".into(),
            ));
        }
        if self.saliency.max_analysis_dimension == 0 {
            return Err(ConfigError::Validation(
                "saliency.max_analysis_dimension must be non-zero".into(),
            ));
        }
        if !(self.saliency.threshold_sigma.is_finite() && self.saliency.threshold_sigma >= 0.0) {
            return Err(ConfigError::Validation(
                "saliency.threshold_sigma must be a non-negative number".into(),
            ));
        }
        if !(self.saliency.min_coverage > 0.0 && self.saliency.min_coverage < 1.0) {
            return Err(ConfigError::Validation(
                "saliency.min_coverage must be between 0 and 1 (exclusive)".into(),
            ));
        }
        if !(self.saliency.trim >= 0.0 && self.saliency.trim < 0.5) {
            return Err(ConfigError::Validation(
                "saliency.trim must be in [0, 0.5)".into(),
            ));
        }
        if self.prerender.batch_size == 0 {
            return Err(ConfigError::Validation(
                "prerender.batch_size must be non-zero".into(),
            ));
        }
        if self.prerender.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "prerender.sizes must not be empty".into(),
            ));
        }
        if self.prerender.sizes.iter().any(|[w, h]| *w == 0 || *h == 0) {
            return Err(ConfigError::Validation(
                "prerender.sizes values must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Retargeted-image cache limits. Whichever limit is hit first evicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of cached images.
    pub max_entries: usize,
    /// Maximum total cost in bytes, counted as `width * height * 4` per image.
    pub max_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Saliency analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaliencyConfig {
    /// Side of the square the analysis copy is content-fill resized to.
    pub analysis_side: u32,
    /// Sources with a longer side than this are downscaled before analysis.
    pub max_analysis_dimension: u32,
    /// A pixel is salient when its score exceeds `mean + threshold_sigma * stddev`.
    pub threshold_sigma: f64,
    /// Minimum fraction of salient pixels for an object to be reported.
    pub min_coverage: f64,
    /// Fraction of salient pixels trimmed from each side of the bounding box.
    pub trim: f64,
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        Self {
            analysis_side: 250,
            max_analysis_dimension: 1024,
            threshold_sigma: 1.0,
            min_coverage: 0.005,
            trim: 0.05,
        }
    }
}

/// Cover-scale settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    pub filter: ResizeFilter,
}

/// Resampling filter names accepted in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Batch pre-rendering settings.
///
/// Widget extensions run under tight memory ceilings, so pre-rendering walks
/// the photo library a few images at a time with a pause in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrerenderConfig {
    /// Photos rendered concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches, in milliseconds.
    pub batch_pause_ms: u64,
    /// Target sizes as `[width, height]` pixels.
    pub sizes: Vec<[u32; 2]>,
}

impl PrerenderConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause_ms: 100,
            // Small, medium and large home-screen widget tiles.
            sizes: vec![[170, 170], [364, 170], [364, 382]],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads for saliency scoring.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RetargetConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RetargetConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RetargetConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<RetargetConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `stayhappy.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# StayHappy Imaging Configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Retargeted-image cache
# ---------------------------------------------------------------------------
[cache]
# Number of cached images before least-recently-used ones are evicted.
max_entries = 50

# Byte budget, counted as width * height * 4 per image (100 MiB).
max_bytes = 104857600

# ---------------------------------------------------------------------------
# Saliency analysis
# ---------------------------------------------------------------------------
[saliency]
# Photos are stretched to this square before analysis, so the cost does not
# depend on the source resolution.
analysis_side = 250

# Photos with a longer side than this are downscaled first.
max_analysis_dimension = 1024

# A pixel is salient when its edge/contrast score exceeds
# mean + threshold_sigma * stddev over the whole photo.
threshold_sigma = 1.0

# Fraction of salient pixels below which no object is reported and the crop
# falls back to the top-left corner.
min_coverage = 0.005

# Fraction of salient pixels ignored on each side when framing the object.
trim = 0.05

# ---------------------------------------------------------------------------
# Scaling
# ---------------------------------------------------------------------------
[scaling]
# nearest | triangle | catmull-rom | gaussian | lanczos3
filter = "lanczos3"

# ---------------------------------------------------------------------------
# Pre-rendering (widget migration)
# ---------------------------------------------------------------------------
[prerender]
# Photos rendered concurrently per batch. Keep small for memory-limited hosts.
batch_size = 5

# Pause between batches, in milliseconds.
batch_pause_ms = 100

# Target sizes as [width, height] pixels: small, medium, large widget tiles.
sizes = [[170, 170], [364, 170], [364, 382]]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum saliency worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
