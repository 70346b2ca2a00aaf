//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Analyze
//!
//! ```text
//! beach.jpg (4000x3000)
//!     Salient box: (0.612, 0.240) to (0.884, 0.710)
//!     Focal point: (0.748, 0.475)
//! ```
//!
//! A photo with no detectable subject shows `Salient box: none` and a focal
//! point at the origin, which frames the top-left of the scaled photo.
//!
//! ## Retarget
//!
//! ```text
//! beach.jpg (4000x3000) → beach-170x170.png (170x170)
//! ```
//!
//! ## Prerender
//!
//! ```text
//! Batch 1/2 (5 photos)
//!     beach.jpg 170x170: rendered
//!     beach.jpg 364x170: cached
//!     lost.jpg 170x170: failed
//!         Error: Source image not found: lost.jpg
//! Batch 2/2 (1 photos)
//!     ...
//! Rendered 11, cached 1, failed 1
//! Cache: 12 images, 4.3 MiB (0 hits, 12 misses, 12 stored)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability; the CLI prints the lines. Format functions are pure.

use crate::cache::RetargetedImageCache;
use crate::retarget::PrerenderEvent;
use crate::types::{BoundingBox, NormalizedPoint};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn point(p: NormalizedPoint) -> String {
    format!("({:.3}, {:.3})", p.x, p.y)
}

/// Human-readable byte count in binary units.
fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

// ============================================================================
// Analyze
// ============================================================================

pub fn format_analysis(
    source: &Path,
    dimensions: (u32, u32),
    bbox: &BoundingBox,
    focal: NormalizedPoint,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}x{})",
        file_label(source),
        dimensions.0,
        dimensions.1
    )];
    if bbox.is_degenerate() {
        lines.push(format!("{}Salient box: none", indent(1)));
    } else {
        lines.push(format!(
            "{}Salient box: {} to {}",
            indent(1),
            point(NormalizedPoint::new(bbox.min_x(), bbox.min_y())),
            point(NormalizedPoint::new(bbox.max_x(), bbox.max_y())),
        ));
    }
    lines.push(format!("{}Focal point: {}", indent(1), point(focal)));
    lines
}

// ============================================================================
// Retarget
// ============================================================================

pub fn format_retarget_output(
    source: &Path,
    source_dimensions: (u32, u32),
    output: &Path,
    output_dimensions: (u32, u32),
) -> Vec<String> {
    vec![format!(
        "{} ({}x{}) → {} ({}x{})",
        file_label(source),
        source_dimensions.0,
        source_dimensions.1,
        file_label(output),
        output_dimensions.0,
        output_dimensions.1
    )]
}

// ============================================================================
// Prerender
// ============================================================================

/// Format a single pre-render progress event.
pub fn format_prerender_event(event: &PrerenderEvent) -> Vec<String> {
    match event {
        PrerenderEvent::BatchStarted {
            batch,
            batches,
            files,
        } => vec![format!("Batch {}/{} ({} photos)", batch, batches, files)],
        PrerenderEvent::Rendered {
            file_name,
            width,
            height,
        } => vec![format!(
            "{}{} {}x{}: rendered",
            indent(1),
            file_name,
            width,
            height
        )],
        PrerenderEvent::Cached {
            file_name,
            width,
            height,
        } => vec![format!(
            "{}{} {}x{}: cached",
            indent(1),
            file_name,
            width,
            height
        )],
        PrerenderEvent::Failed {
            file_name,
            width,
            height,
            error,
        } => vec![
            format!("{}{} {}x{}: failed", indent(1), file_name, width, height),
            format!("{}Error: {}", indent(2), error),
        ],
        PrerenderEvent::Finished {
            rendered,
            cached,
            failed,
        } => vec![format!(
            "Rendered {}, cached {}, failed {}",
            rendered, cached, failed
        )],
    }
}

/// One-line cache summary: size, footprint and activity counters.
pub fn format_cache_summary(cache: &RetargetedImageCache) -> String {
    let len = cache.len();
    format!(
        "Cache: {} {}, {} ({})",
        len,
        if len == 1 { "image" } else { "images" },
        format_bytes(cache.total_cost()),
        cache.stats()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::flat_image;
    use crate::types::{Image, Size};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(100 * 1024 * 1024), "100.0 MiB");
    }

    #[test]
    fn file_label_uses_file_name() {
        assert_eq!(file_label(Path::new("photos/beach.jpg")), "beach.jpg");
    }

    // =========================================================================
    // Analyze output
    // =========================================================================

    #[test]
    fn analysis_output_with_object() {
        let bbox = BoundingBox::from_extents(0.25, 0.5, 0.75, 1.0);
        let lines = format_analysis(
            Path::new("photos/beach.jpg"),
            (4000, 3000),
            &bbox,
            bbox.focal_point(),
        );
        assert_eq!(
            lines,
            vec![
                "beach.jpg (4000x3000)",
                "    Salient box: (0.250, 0.500) to (0.750, 1.000)",
                "    Focal point: (0.500, 0.750)",
            ]
        );
    }

    #[test]
    fn analysis_output_without_object() {
        let lines = format_analysis(
            Path::new("flat.png"),
            (10, 10),
            &BoundingBox::DEGENERATE,
            NormalizedPoint::ORIGIN,
        );
        assert_eq!(lines[1], "    Salient box: none");
        assert_eq!(lines[2], "    Focal point: (0.000, 0.000)");
    }

    // =========================================================================
    // Retarget output
    // =========================================================================

    #[test]
    fn retarget_output_line() {
        let lines = format_retarget_output(
            Path::new("photos/beach.jpg"),
            (4000, 3000),
            Path::new("rendered/beach-170x170.png"),
            (170, 170),
        );
        assert_eq!(
            lines,
            vec!["beach.jpg (4000x3000) → beach-170x170.png (170x170)"]
        );
    }

    // =========================================================================
    // Prerender output
    // =========================================================================

    #[test]
    fn prerender_batch_header() {
        let lines = format_prerender_event(&PrerenderEvent::BatchStarted {
            batch: 1,
            batches: 3,
            files: 5,
        });
        assert_eq!(lines, vec!["Batch 1/3 (5 photos)"]);
    }

    #[test]
    fn prerender_rendition_lines() {
        let rendered = format_prerender_event(&PrerenderEvent::Rendered {
            file_name: "a.jpg".into(),
            width: 170,
            height: 170,
        });
        assert_eq!(rendered, vec!["    a.jpg 170x170: rendered"]);

        let cached = format_prerender_event(&PrerenderEvent::Cached {
            file_name: "a.jpg".into(),
            width: 364,
            height: 170,
        });
        assert_eq!(cached, vec!["    a.jpg 364x170: cached"]);
    }

    #[test]
    fn prerender_failure_shows_error() {
        let lines = format_prerender_event(&PrerenderEvent::Failed {
            file_name: "lost.jpg".into(),
            width: 170,
            height: 170,
            error: "Source image not found: lost.jpg".into(),
        });
        assert_eq!(
            lines,
            vec![
                "    lost.jpg 170x170: failed",
                "        Error: Source image not found: lost.jpg",
            ]
        );
    }

    #[test]
    fn prerender_finished_summary() {
        let lines = format_prerender_event(&PrerenderEvent::Finished {
            rendered: 11,
            cached: 1,
            failed: 1,
        });
        assert_eq!(lines, vec!["Rendered 11, cached 1, failed 1"]);
    }

    #[test]
    fn cache_summary_counts_images_and_bytes() {
        let cache = RetargetedImageCache::default();
        cache.put("a", Size::new(32.0, 32.0), Image::new(flat_image(32, 32)));
        cache.get("a", Size::new(32.0, 32.0));
        assert_eq!(
            format_cache_summary(&cache),
            "Cache: 1 image, 4.0 KiB (1 hits, 0 misses, 1 stored)"
        );
    }
}
