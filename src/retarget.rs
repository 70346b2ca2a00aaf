//! Async entry point: source loading, re-targeting and caching.
//!
//! [`Retargeter`] ties an [`ImageSource`], a [`RetargetedImageCache`] and the
//! synchronous pipeline together. It is cheap to clone; clones share the
//! same cache and source.
//!
//! CPU-bound work (saliency, resampling, cropping) runs on tokio's blocking
//! pool so the async workers stay responsive.
//!
//! ## Pre-rendering
//!
//! [`Retargeter::prerender`] fills the cache for a photo library ahead of
//! time, e.g. when migrating widgets to new tile sizes. Photos are processed
//! `batch_size` at a time, each photo loaded once for all its sizes, with a
//! short pause between batches so a memory-limited host can reclaim buffers.
//! Failures are recorded in the [`PrerenderReport`] and never stop the run.
//!
//! Progress is sent as [`PrerenderEvent`]s over an optional channel; the
//! caller decides how to display them (see
//! [`output::format_prerender_event`](crate::output::format_prerender_event)).

use crate::cache::{Generation, RetargetedImageCache};
use crate::config::{PrerenderConfig, RetargetConfig};
use crate::imaging::{
    ImageSource, PipelineOptions, RetargetError, SaliencyAnalyzer, check_target, retarget_image,
};
use crate::types::{Image, Size};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tokio::task::JoinSet;

type Result<T> = std::result::Result<T, RetargetError>;

/// Called with every freshly rendered image during pre-rendering.
///
/// Runs on the blocking pool. An error marks that rendition as failed in the
/// report; the image stays cached.
pub type RenditionSink = Arc<dyn Fn(&str, Size, &Image) -> std::io::Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct Retargeter {
    source: Arc<dyn ImageSource>,
    cache: Arc<RetargetedImageCache>,
    analyzer: SaliencyAnalyzer,
    options: PipelineOptions,
    prerender: PrerenderConfig,
}

impl Retargeter {
    pub fn new(
        source: Arc<dyn ImageSource>,
        cache: Arc<RetargetedImageCache>,
        analyzer: SaliencyAnalyzer,
        config: &RetargetConfig,
    ) -> Self {
        Self {
            source,
            cache,
            analyzer,
            options: PipelineOptions::from_config(config),
            prerender: config.prerender.clone(),
        }
    }

    /// Build a retargeter with a fresh cache and the built-in saliency model.
    pub fn from_config(source: Arc<dyn ImageSource>, config: &RetargetConfig) -> Self {
        Self::new(
            source,
            Arc::new(RetargetedImageCache::new(config.cache)),
            SaliencyAnalyzer::from_config(&config.saliency),
            config,
        )
    }

    pub fn cache(&self) -> &Arc<RetargetedImageCache> {
        &self.cache
    }

    /// The stored photo `file_name` re-targeted to `target`, from cache when
    /// possible.
    ///
    /// Only a successfully rendered image is ever cached. A render that
    /// overlaps an [`invalidate`](Self::invalidate) of the same photo is
    /// returned but not cached.
    pub async fn image_for(&self, file_name: &str, target: Size) -> Result<Image> {
        check_target(target)?;
        let generation = self.cache.generation(file_name);
        if let Some(hit) = self.cache.get(file_name, target) {
            tracing::debug!(file = %file_name, %target, "cache hit");
            return Ok(hit);
        }
        tracing::debug!(file = %file_name, %target, "cache miss");

        let source = self.source.load(file_name).await?;
        let image = self.retarget(source, target).await?;
        self.cache
            .put_if_generation(file_name, target, image.clone(), generation);
        Ok(image)
    }

    /// Run the pipeline on an already-loaded image. Bypasses the cache.
    pub async fn retarget(&self, image: Image, target: Size) -> Result<Image> {
        let analyzer = self.analyzer.clone();
        let options = self.options;
        tokio::task::spawn_blocking(move || retarget_image(&image, target, &analyzer, &options))
            .await
            .map_err(|e| RetargetError::Runtime(e.to_string()))?
    }

    /// Drop every cached size of a photo that was deleted or replaced.
    pub fn invalidate(&self, file_name: &str) -> usize {
        self.cache.invalidate(file_name)
    }

    /// Drop all cached images, e.g. on a low-memory signal.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Render every photo at every size into the cache.
    pub async fn prerender(
        &self,
        file_names: &[String],
        sizes: &[Size],
        events: Option<Sender<PrerenderEvent>>,
    ) -> PrerenderReport {
        self.prerender_to(file_names, sizes, events, None).await
    }

    /// Like [`prerender`](Self::prerender), additionally handing each newly
    /// rendered image to `sink`.
    pub async fn prerender_to(
        &self,
        file_names: &[String],
        sizes: &[Size],
        events: Option<Sender<PrerenderEvent>>,
        sink: Option<RenditionSink>,
    ) -> PrerenderReport {
        let sizes = distinct_renditions(sizes);
        let batch_size = self.prerender.batch_size.max(1);
        let batches = file_names.len().div_ceil(batch_size);
        let emit = |event: PrerenderEvent| {
            if let Some(tx) = &events {
                tx.send(event).ok();
            }
        };

        let mut report = PrerenderReport::default();
        for (index, batch) in file_names.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.prerender.batch_pause()).await;
            }
            tracing::info!(batch = index + 1, batches, files = batch.len(), "pre-render batch");
            emit(PrerenderEvent::BatchStarted {
                batch: index + 1,
                batches,
                files: batch.len(),
            });

            let mut tasks = JoinSet::new();
            for file_name in batch {
                let this = self.clone();
                let file_name = file_name.clone();
                let sizes = Arc::clone(&sizes);
                let sink = sink.clone();
                tasks.spawn(async move { this.prerender_photo(file_name, &sizes, sink).await });
            }

            while let Some(joined) = tasks.join_next().await {
                let outcomes = match joined {
                    Ok(outcomes) => outcomes,
                    Err(e) => {
                        // The task's file name is lost with the panic.
                        tracing::warn!(error = %e, "pre-render task did not complete");
                        report.incomplete_tasks += 1;
                        continue;
                    }
                };
                for outcome in outcomes {
                    emit(outcome.event());
                    report.record(outcome);
                }
            }
            report.batches += 1;
        }

        report.sort();
        emit(PrerenderEvent::Finished {
            rendered: report.rendered.len(),
            cached: report.cached.len(),
            failed: report.failed.len(),
        });
        report
    }

    /// Render one photo at all `sizes`, loading the source at most once.
    async fn prerender_photo(
        &self,
        file_name: String,
        sizes: &[Size],
        sink: Option<RenditionSink>,
    ) -> Vec<Outcome> {
        let generation = self.cache.generation(&file_name);
        let (cached, missing): (Vec<Size>, Vec<Size>) = sizes
            .iter()
            .copied()
            .partition(|size| self.cache.contains(&file_name, *size));

        let mut outcomes: Vec<Outcome> = cached
            .into_iter()
            .map(|target| Outcome::new(&file_name, target, Status::Cached))
            .collect();
        if missing.is_empty() {
            return outcomes;
        }

        let source = match self.source.load(&file_name).await {
            Ok(source) => source,
            Err(e) => {
                let error = RetargetError::from(e).to_string();
                tracing::warn!(file = %file_name, %error, "pre-render load failed");
                outcomes.extend(missing.into_iter().map(|target| {
                    Outcome::new(&file_name, target, Status::Failed(error.clone()))
                }));
                return outcomes;
            }
        };

        for target in missing {
            let status = match self
                .render_and_store(&file_name, &source, target, generation, &sink)
                .await
            {
                Ok(()) => Status::Rendered,
                Err(error) => Status::Failed(error),
            };
            outcomes.push(Outcome::new(&file_name, target, status));
        }
        outcomes
    }

    async fn render_and_store(
        &self,
        file_name: &str,
        source: &Image,
        target: Size,
        generation: Generation,
        sink: &Option<RenditionSink>,
    ) -> std::result::Result<(), String> {
        let image = self
            .retarget(source.clone(), target)
            .await
            .map_err(|e| e.to_string())?;
        self.cache
            .put_if_generation(file_name, target, image.clone(), generation);

        if let Some(sink) = sink {
            let sink = Arc::clone(sink);
            let name = file_name.to_string();
            tokio::task::spawn_blocking(move || sink(&name, target, &image))
                .await
                .map_err(|e| e.to_string())?
                .map_err(|e| format!("failed to store rendition: {}", e))?;
        }
        Ok(())
    }
}

/// Sizes in request order, dropping any that land on an already listed
/// pixel size. Those would share one cache key.
fn distinct_renditions(sizes: &[Size]) -> Arc<[Size]> {
    let mut seen = HashSet::new();
    sizes
        .iter()
        .copied()
        .filter(|size| seen.insert(size.pixel_dimensions()))
        .collect()
}

impl std::fmt::Debug for Retargeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retargeter")
            .field("cache", &self.cache)
            .field("analyzer", &self.analyzer)
            .field("options", &self.options)
            .field("prerender", &self.prerender)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Progress events and report
// ============================================================================

/// Progress events emitted during pre-rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum PrerenderEvent {
    BatchStarted {
        batch: usize,
        batches: usize,
        files: usize,
    },
    Rendered {
        file_name: String,
        width: u32,
        height: u32,
    },
    /// Already in the cache; nothing was loaded or rendered.
    Cached {
        file_name: String,
        width: u32,
        height: u32,
    },
    Failed {
        file_name: String,
        width: u32,
        height: u32,
        error: String,
    },
    Finished {
        rendered: usize,
        cached: usize,
        failed: usize,
    },
}

/// One photo at one size.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Rendition {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FailedRendition {
    #[serde(flatten)]
    pub rendition: Rendition,
    pub error: String,
}

/// Summary of a pre-render run, sorted by file name then size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrerenderReport {
    pub batches: usize,
    pub rendered: Vec<Rendition>,
    pub cached: Vec<Rendition>,
    pub failed: Vec<FailedRendition>,
    /// Tasks that panicked or were cancelled before reporting.
    pub incomplete_tasks: usize,
}

impl PrerenderReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.incomplete_tasks == 0
    }

    fn record(&mut self, outcome: Outcome) {
        let Outcome { rendition, status } = outcome;
        match status {
            Status::Rendered => self.rendered.push(rendition),
            Status::Cached => self.cached.push(rendition),
            Status::Failed(error) => self.failed.push(FailedRendition { rendition, error }),
        }
    }

    fn sort(&mut self) {
        self.rendered.sort();
        self.cached.sort();
        self.failed.sort();
    }
}

#[derive(Debug)]
enum Status {
    Rendered,
    Cached,
    Failed(String),
}

#[derive(Debug)]
struct Outcome {
    rendition: Rendition,
    status: Status,
}

impl Outcome {
    fn new(file_name: &str, target: Size, status: Status) -> Self {
        let (width, height) = target.pixel_dimensions();
        Self {
            rendition: Rendition {
                file_name: file_name.to_string(),
                width,
                height,
            },
            status,
        }
    }

    fn event(&self) -> PrerenderEvent {
        let Rendition {
            file_name,
            width,
            height,
        } = self.rendition.clone();
        match &self.status {
            Status::Rendered => PrerenderEvent::Rendered {
                file_name,
                width,
                height,
            },
            Status::Cached => PrerenderEvent::Cached {
                file_name,
                width,
                height,
            },
            Status::Failed(error) => PrerenderEvent::Failed {
                file_name,
                width,
                height,
                error: error.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::imaging::source::tests::MockSource;
    use crate::test_helpers::{flat_image, is_mid_gray, textured_patch_image};
    use std::sync::Mutex;
    use std::time::Duration;

    fn config(batch_size: usize) -> RetargetConfig {
        let mut config = RetargetConfig::default();
        config.saliency.analysis_side = 32;
        config.prerender.batch_size = batch_size;
        config.prerender.batch_pause_ms = 1;
        config
    }

    fn retargeter(source: MockSource, config: &RetargetConfig) -> (Retargeter, Arc<MockSource>) {
        let source = Arc::new(source);
        let r = Retargeter::from_config(source.clone(), config);
        (r, source)
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("photo-{:02}.jpg", i)).collect()
    }

    fn library(names: &[String]) -> MockSource {
        let images = names
            .iter()
            .map(|n| (n.as_str(), Image::new(flat_image(60, 40))))
            .collect();
        MockSource::with_images(images)
    }

    // =========================================================================
    // image_for
    // =========================================================================

    #[tokio::test]
    async fn image_for_returns_exact_target_size() {
        let source = MockSource::with_images(vec![(
            "a.jpg",
            Image::new(textured_patch_image(400, 300, (300, 100, 60, 120))),
        )]);
        let (r, _) = retargeter(source, &config(5));

        let img = r.image_for("a.jpg", Size::new(120.0, 120.0)).await.unwrap();
        assert_eq!((img.width(), img.height()), (120, 120));
    }

    #[tokio::test]
    async fn image_for_caches_and_reuses() {
        let source = MockSource::with_images(vec![("a.jpg", Image::new(flat_image(80, 60)))]);
        let (r, source) = retargeter(source, &config(5));
        let target = Size::new(30.0, 30.0);

        let first = r.image_for("a.jpg", target).await.unwrap();
        let second = r.image_for("a.jpg", target).await.unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(source.load_count("a.jpg"), 1);
        assert_eq!(r.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn image_for_missing_source_is_not_cached() {
        let (r, _) = retargeter(MockSource::new(), &config(5));
        let target = Size::new(30.0, 30.0);

        let err = r.image_for("gone.jpg", target).await.unwrap_err();
        assert_eq!(err, RetargetError::SourceNotFound("gone.jpg".into()));
        assert!(r.cache().is_empty());
        assert!(!r.cache().contains("gone.jpg", target));
    }

    #[tokio::test]
    async fn image_for_invalid_target_fails_without_loading() {
        let source = MockSource::with_images(vec![("a.jpg", Image::new(flat_image(8, 8)))]);
        let (r, source) = retargeter(source, &config(5));

        for target in [Size::new(0.0, 10.0), Size::new(f64::NAN, 10.0)] {
            let err = r.image_for("a.jpg", target).await.unwrap_err();
            assert!(matches!(err, RetargetError::InvalidSource(_)));
        }
        assert_eq!(source.load_count("a.jpg"), 0);
        assert!(r.cache().is_empty());
    }

    #[tokio::test]
    async fn invalidate_during_render_discards_stale_result() {
        let source = MockSource::with_images(vec![("a.jpg", Image::new(flat_image(80, 60)))])
            .with_delay(Duration::from_millis(100));
        let (r, source) = retargeter(source, &config(5));
        let target = Size::new(40.0, 40.0);

        let pending = {
            let r = r.clone();
            tokio::spawn(async move { r.image_for("a.jpg", target).await })
        };
        // The pending call has read the old photo and is waiting on the slow source.
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.images.lock().unwrap().insert(
            "a.jpg".to_string(),
            Image::new(textured_patch_image(80, 60, (0, 0, 80, 60))),
        );
        r.invalidate("a.jpg");

        let stale = pending.await.unwrap().unwrap();
        assert!(stale.pixels().to_rgb8().pixels().all(is_mid_gray));
        assert!(!r.cache().contains("a.jpg", target));

        let fresh = r.image_for("a.jpg", target).await.unwrap();
        assert!(!fresh.pixels().to_rgb8().pixels().all(is_mid_gray));
        assert!(r.cache().contains("a.jpg", target));
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let source = MockSource::with_images(vec![("a.jpg", Image::new(flat_image(80, 60)))]);
        let (r, source) = retargeter(source, &config(5));

        r.image_for("a.jpg", Size::new(20.0, 20.0)).await.unwrap();
        r.image_for("a.jpg", Size::new(40.0, 20.0)).await.unwrap();
        assert_eq!(r.invalidate("a.jpg"), 2);

        r.image_for("a.jpg", Size::new(20.0, 20.0)).await.unwrap();
        assert_eq!(source.load_count("a.jpg"), 3);
    }

    #[tokio::test]
    async fn clear_empties_shared_cache() {
        let source = MockSource::with_images(vec![("a.jpg", Image::new(flat_image(10, 10)))]);
        let (r, _) = retargeter(source, &config(5));
        let clone = r.clone();

        r.image_for("a.jpg", Size::new(5.0, 5.0)).await.unwrap();
        assert_eq!(clone.cache().len(), 1);
        clone.clear();
        assert!(r.cache().is_empty());
    }

    #[tokio::test]
    async fn retarget_keeps_source_scale() {
        let (r, _) = retargeter(MockSource::new(), &config(5));
        let src = Image::with_scale(flat_image(100, 50), 2.0);

        let out = r.retarget(src, Size::new(25.0, 25.0)).await.unwrap();
        assert_eq!((out.width(), out.height()), (25, 25));
        assert_eq!(out.scale(), 2.0);
        assert!(r.cache().is_empty());
    }

    #[tokio::test]
    async fn custom_cache_is_shared() {
        let cache = Arc::new(RetargetedImageCache::new(CacheConfig {
            max_entries: 1,
            max_bytes: usize::MAX,
        }));
        let source = Arc::new(MockSource::with_images(vec![
            ("a", Image::new(flat_image(10, 10))),
            ("b", Image::new(flat_image(10, 10))),
        ]));
        let cfg = config(5);
        let r = Retargeter::new(
            source,
            Arc::clone(&cache),
            SaliencyAnalyzer::from_config(&cfg.saliency),
            &cfg,
        );

        r.image_for("a", Size::new(4.0, 4.0)).await.unwrap();
        r.image_for("b", Size::new(4.0, 4.0)).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b", Size::new(4.0, 4.0)));
    }

    // =========================================================================
    // prerender
    // =========================================================================

    #[tokio::test]
    async fn prerender_renders_every_photo_at_every_size() {
        let files = names(7);
        let sizes = [Size::new(20.0, 20.0), Size::new(30.0, 12.0)];
        let (r, source) = retargeter(library(&files), &config(3));

        let report = r.prerender(&files, &sizes, None).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.rendered.len(), 14);
        assert!(report.is_complete());
        assert_eq!(r.cache().len(), 14);
        // One load per photo, shared by both sizes.
        for f in &files {
            assert_eq!(source.load_count(f), 1);
        }
    }

    #[tokio::test]
    async fn prerender_honours_batch_size() {
        let files = names(10);
        let source = library(&files).with_delay(Duration::from_millis(20));
        let (r, source) = retargeter(source, &config(3));

        let report = r.prerender(&files, &[Size::new(10.0, 10.0)], None).await;

        assert_eq!(report.rendered.len(), 10);
        assert!(source.peak() <= 3, "peak concurrency {}", source.peak());
        assert!(source.peak() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn prerender_pauses_between_batches() {
        let files = names(6);
        let mut cfg = config(2);
        cfg.prerender.batch_pause_ms = 100;
        let (r, _) = retargeter(library(&files), &cfg);

        let started = tokio::time::Instant::now();
        let report = r.prerender(&files, &[Size::new(10.0, 10.0)], None).await;

        assert_eq!(report.batches, 3);
        // Two pauses: none before the first batch.
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn prerender_renders_sizes_sharing_a_pixel_size_once() {
        let files = names(2);
        let (r, _) = retargeter(library(&files), &config(5));
        let sizes = [
            Size::new(20.2, 20.0),
            Size::new(20.0, 20.0),
            Size::new(8.0, 8.0),
        ];

        let report = r.prerender(&files, &sizes, None).await;

        assert_eq!(report.rendered.len(), 4);
        assert!(report.cached.is_empty());
        assert_eq!(r.cache().len(), 4);
        assert_eq!(r.cache().stats().insertions, 4);
    }

    #[tokio::test]
    async fn prerender_records_failures_without_aborting() {
        let mut files = names(4);
        let source = library(&files);
        files.insert(2, "missing.jpg".to_string());
        let (r, _) = retargeter(source, &config(2));

        let report = r
            .prerender(&files, &[Size::new(10.0, 10.0), Size::new(12.0, 8.0)], None)
            .await;

        assert_eq!(report.rendered.len(), 8);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|f| f.rendition.file_name == "missing.jpg"));
        assert!(!report.is_complete());
        assert!(!r.cache().contains("missing.jpg", Size::new(10.0, 10.0)));
    }

    #[tokio::test]
    async fn prerender_skips_cached_renditions() {
        let files = names(2);
        let (r, source) = retargeter(library(&files), &config(5));
        let size = Size::new(16.0, 16.0);

        r.prerender(&files, &[size], None).await;
        let report = r.prerender(&files, &[size], None).await;

        assert!(report.rendered.is_empty());
        assert_eq!(report.cached.len(), 2);
        assert_eq!(source.load_count(&files[0]), 1);
    }

    #[tokio::test]
    async fn prerender_emits_events_in_order() {
        let files = names(3);
        let (r, _) = retargeter(library(&files), &config(2));
        let (tx, rx) = std::sync::mpsc::channel();

        r.prerender(&files, &[Size::new(10.0, 10.0)], Some(tx)).await;
        let events: Vec<PrerenderEvent> = rx.iter().collect();

        assert_eq!(
            events.first(),
            Some(&PrerenderEvent::BatchStarted {
                batch: 1,
                batches: 2,
                files: 2
            })
        );
        assert_eq!(
            events.last(),
            Some(&PrerenderEvent::Finished {
                rendered: 3,
                cached: 0,
                failed: 0
            })
        );
        let rendered = events
            .iter()
            .filter(|e| matches!(e, PrerenderEvent::Rendered { .. }))
            .count();
        assert_eq!(rendered, 3);
    }

    #[tokio::test]
    async fn prerender_to_hands_images_to_sink() {
        let files = names(2);
        let (r, _) = retargeter(library(&files), &config(5));
        let seen: Arc<Mutex<Vec<(String, u32, u32)>>> = Arc::default();
        let sink_seen = Arc::clone(&seen);
        let sink: RenditionSink = Arc::new(move |name: &str, _target: Size, img: &Image| {
            sink_seen
                .lock()
                .unwrap()
                .push((name.to_string(), img.width(), img.height()));
            Ok(())
        });

        let report = r
            .prerender_to(&files, &[Size::new(14.0, 9.0)], None, Some(sink))
            .await;

        assert!(report.is_complete());
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                (files[0].clone(), 14, 9),
                (files[1].clone(), 14, 9)
            ]
        );
    }

    #[tokio::test]
    async fn prerender_sink_errors_are_failures() {
        let files = names(1);
        let (r, _) = retargeter(library(&files), &config(5));
        let sink: RenditionSink = Arc::new(|_: &str, _: Size, _: &Image| {
            Err(std::io::Error::other("disk full"))
        });

        let report = r
            .prerender_to(&files, &[Size::new(10.0, 10.0)], None, Some(sink))
            .await;

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.contains("disk full"));
        // Rendering itself succeeded, so the cache keeps it.
        assert!(r.cache().contains(&files[0], Size::new(10.0, 10.0)));
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = PrerenderReport {
            batches: 1,
            ..Default::default()
        };
        report.record(Outcome::new(
            "b.jpg",
            Size::new(10.0, 10.0),
            Status::Failed("nope".into()),
        ));
        report.record(Outcome::new("a.jpg", Size::new(10.0, 10.0), Status::Rendered));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rendered"][0]["file_name"], "a.jpg");
        assert_eq!(json["failed"][0]["file_name"], "b.jpg");
        assert_eq!(json["failed"][0]["error"], "nope");
        assert_eq!(json["failed"][0]["width"], 10);
    }
}
