//! # StayHappy Imaging
//!
//! Photo re-targeting for a journaling app. Any stored photo can be asked for
//! at any size (widget tile, detail view, thumbnail); the result is exactly
//! that size, framed around the photo's visually salient region.
//!
//! # Architecture: Re-targeting Pipeline
//!
//! ```text
//! 1. Load       file name  →  Image            (ImageSource)
//! 2. Analyze    Image      →  BoundingBox      (saliency on a small square copy)
//! 3. Focus      BoundingBox → focal point      (centre of the box)
//! 4. Scale      Image      →  Image            (cover the target, keep aspect)
//! 5. Crop       Image      →  Image            (window around the focal point)
//! ```
//!
//! Steps 2-5 are synchronous and pure ([`imaging::retarget_image`]).
//! [`retarget::Retargeter`] runs them on tokio's blocking pool behind a
//! bounded [`cache::RetargetedImageCache`], and can pre-render a whole photo
//! library in small batches.
//!
//! Only loading can fail. A photo with no detectable subject, or a crop that
//! cannot be taken, still yields a best-effort image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Geometry (`Size`, `Point`, `NormalizedPoint`, `BoundingBox`) and `Image` |
//! | [`imaging`] | Pure geometry, saliency, image sources, and the synchronous pipeline |
//! | [`cache`] | Bounded LRU cache of retargeted images with per-filename invalidation |
//! | [`retarget`] | Async service: cache-then-pipeline lookups and batch pre-rendering |
//! | [`config`] | `stayhappy.toml` loading, validation, and merging onto stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Unordered Bounding Boxes
//!
//! Saliency models disagree on which corner is which. A [`types::BoundingBox`]
//! is four points with no labels, and every consumer reduces over min/max.
//! Swapped or inverted corners produce the same crop.
//!
//! ## Explicit Cache Ownership
//!
//! There is no global cache. The composition root creates one
//! `Arc<RetargetedImageCache>` and hands it to every `Retargeter` that should
//! share it. Separate processes (the app and its widget extension) each own
//! their own.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod output;
pub mod retarget;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
