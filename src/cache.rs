//! In-memory cache of retargeted images.
//!
//! Re-targeting a photo costs a decode, a saliency pass and a full-resolution
//! resample, and widget hosts ask for the same few sizes over and over. This
//! module memoizes pipeline outputs per process.
//!
//! # Design
//!
//! ## Cache keys
//!
//! Keys are `"<fileName>::<w>x<h>"` where `w`/`h` are the target size rounded
//! to whole pixels, so two requests whose sizes round to the same pixel grid
//! share an entry. The `::` delimiter keeps the filename segment unambiguous.
//!
//! Invalidation goes through a per-filename index rather than string prefix
//! matching: dropping `"img1"` never touches `"img10"`.
//!
//! ## Bounds
//!
//! Two limits, whichever is hit first evicts: an entry count (the
//! [`LruCache`] capacity) and a byte budget enforced with `pop_lru`. Each
//! entry's cost is `width * height * 4` no matter how the pixels are actually
//! stored. An image whose cost alone exceeds the byte budget is never stored;
//! the caller still gets it, it just isn't memoized.
//!
//! ## Generations
//!
//! A render started before an `invalidate` must not land in the cache after
//! it. Every filename carries a generation that `invalidate` bumps (and
//! `clear` bumps for all files). Callers read [`RetargetedImageCache::generation`]
//! before loading the source and store with
//! [`put_if_generation`](RetargetedImageCache::put_if_generation), which
//! discards the rendition if the photo was invalidated in the meantime.
//!
//! ## Locking
//!
//! The LRU list, the filename index, the byte total and the generations live
//! in one struct behind a single `parking_lot::Mutex`, so they are always
//! updated together. Every operation holds the lock only for map updates;
//! no pixel work happens under it.

use crate::config::CacheConfig;
use crate::types::{Image, Size};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;

/// Separator between the filename and size segments of a key.
const KEY_DELIMITER: &str = "::";

/// Identity of one cached rendition: a source filename plus an integer target size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    file_name: String,
    width: u32,
    height: u32,
}

impl CacheKey {
    pub fn new(file_name: &str, target: Size) -> Self {
        let (width, height) = target.pixel_dimensions();
        Self {
            file_name: file_name.to_string(),
            width,
            height,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}x{}",
            self.file_name, KEY_DELIMITER, self.width, self.height
        )
    }
}

/// Snapshot of a filename's invalidation state. Compare, don't inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    file: u64,
}

struct Entry {
    image: Image,
    cost: usize,
}

struct State {
    entries: LruCache<CacheKey, Entry>,
    by_file: HashMap<String, HashSet<CacheKey>>,
    total_cost: usize,
    /// Bumped by `clear`.
    epoch: u64,
    /// Bumped per filename by `invalidate`. Reset by `clear`.
    generations: HashMap<String, u64>,
    stats: CacheStats,
}

impl State {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN)),
            by_file: HashMap::new(),
            total_cost: 0,
            epoch: 0,
            generations: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    fn generation(&self, file_name: &str) -> Generation {
        Generation {
            epoch: self.epoch,
            file: self.generations.get(file_name).copied().unwrap_or(0),
        }
    }

    /// Drop `key` from the filename index after its entry left the LRU.
    fn unindex(&mut self, key: &CacheKey, entry: &Entry) {
        self.total_cost -= entry.cost;
        if let Some(keys) = self.by_file.get_mut(key.file_name()) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_file.remove(key.file_name());
            }
        }
    }

    fn insert(&mut self, key: CacheKey, image: Image, cost: usize, max_bytes: usize) {
        if let Some(old) = self.entries.pop(&key) {
            self.unindex(&key, &old);
        }

        self.total_cost += cost;
        self.by_file
            .entry(key.file_name.clone())
            .or_default()
            .insert(key.clone());
        // At capacity, push hands back the least-recently-used entry.
        if let Some((victim, entry)) = self.entries.push(key, Entry { image, cost }) {
            self.evicted(&victim, &entry);
        }
        self.stats.insertions += 1;

        while self.total_cost > max_bytes {
            let Some((victim, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.evicted(&victim, &entry);
        }
    }

    fn evicted(&mut self, key: &CacheKey, entry: &Entry) {
        self.unindex(key, entry);
        self.stats.evictions += 1;
        tracing::trace!(%key, "evicted");
    }
}

/// Counters for cache activity since creation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.evictions > 0 {
            write!(
                f,
                "{} hits, {} misses, {} stored, {} evicted",
                self.hits, self.misses, self.insertions, self.evictions
            )
        } else {
            write!(
                f,
                "{} hits, {} misses, {} stored",
                self.hits, self.misses, self.insertions
            )
        }
    }
}

/// Bounded LRU cache of retargeted images, shared across tasks via `Arc`.
pub struct RetargetedImageCache {
    limits: CacheConfig,
    state: Mutex<State>,
}

impl RetargetedImageCache {
    pub fn new(limits: CacheConfig) -> Self {
        Self {
            limits,
            state: Mutex::new(State::new(limits.max_entries)),
        }
    }

    pub fn limits(&self) -> CacheConfig {
        self.limits
    }

    /// Look up a rendition, marking it most recently used on a hit.
    pub fn get(&self, file_name: &str, target: Size) -> Option<Image> {
        let key = CacheKey::new(file_name, target);
        let mut state = self.state.lock();
        let hit = state.entries.get(&key).map(|entry| entry.image.clone());
        match hit {
            Some(_) => state.stats.hits += 1,
            None => state.stats.misses += 1,
        }
        hit
    }

    /// True if a rendition is cached. Does not count as an access.
    pub fn contains(&self, file_name: &str, target: Size) -> bool {
        self.state
            .lock()
            .entries
            .contains(&CacheKey::new(file_name, target))
    }

    /// Current invalidation generation of `file_name`.
    pub fn generation(&self, file_name: &str) -> Generation {
        self.state.lock().generation(file_name)
    }

    /// Store a rendition, evicting least-recently-used entries until both
    /// limits hold again. Returns `false` if the image alone is over budget
    /// and was not stored.
    pub fn put(&self, file_name: &str, target: Size, image: Image) -> bool {
        let key = CacheKey::new(file_name, target);
        let cost = image.cost();
        if cost > self.limits.max_bytes {
            tracing::debug!(%key, cost, "image exceeds cache budget, not stored");
            return false;
        }
        self.state
            .lock()
            .insert(key, image, cost, self.limits.max_bytes);
        true
    }

    /// Like [`put`](Self::put), but only if `file_name` has not been
    /// invalidated (or the cache cleared) since `generation` was read.
    pub fn put_if_generation(
        &self,
        file_name: &str,
        target: Size,
        image: Image,
        generation: Generation,
    ) -> bool {
        let key = CacheKey::new(file_name, target);
        let cost = image.cost();
        if cost > self.limits.max_bytes {
            tracing::debug!(%key, cost, "image exceeds cache budget, not stored");
            return false;
        }
        let mut state = self.state.lock();
        if state.generation(file_name) != generation {
            tracing::debug!(%key, "source invalidated during render, not stored");
            return false;
        }
        state.insert(key, image, cost, self.limits.max_bytes);
        true
    }

    /// Drop every cached size of `file_name`. Returns how many entries went.
    ///
    /// Renders of `file_name` already in flight will not be stored.
    pub fn invalidate(&self, file_name: &str) -> usize {
        let mut state = self.state.lock();
        *state.generations.entry(file_name.to_string()).or_insert(0) += 1;
        let Some(keys) = state.by_file.remove(file_name) else {
            return 0;
        };
        for key in &keys {
            if let Some(entry) = state.entries.pop(key) {
                state.total_cost -= entry.cost;
            }
        }
        tracing::debug!(file_name, removed = keys.len(), "invalidated cached renditions");
        keys.len()
    }

    /// Drop everything. Counters are kept; in-flight renders are not stored.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.by_file.clear();
        state.total_cost = 0;
        state.generations.clear();
        state.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of entry costs in bytes.
    pub fn total_cost(&self) -> usize {
        self.state.lock().total_cost
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}

impl Default for RetargetedImageCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl fmt::Debug for RetargetedImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RetargetedImageCache")
            .field("limits", &self.limits)
            .field("len", &state.entries.len())
            .field("total_cost", &state.total_cost)
            .finish()
    }
}
