//! Bitmap cache for rendered pages.

use image::RgbaImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use crate::layout::Zoom;

/// `(page index, zoom percent)`.
pub type RenderKey = (usize, u32);

/// Rendered pages of one document, valid for a single content revision.
#[derive(Debug)]
pub struct RenderCache {
    entries: LruCache<RenderKey, RgbaImage>,
    revision: u64,
    hits: u64,
    misses: u64,
}

impl RenderCache {
    /// Hold at most `capacity` bitmaps; zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            revision: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Drop everything if the document moved past the cached revision.
    pub fn sync(&mut self, revision: u64) {
        if revision != self.revision {
            debug!(
                from = self.revision,
                to = revision,
                dropped = self.entries.len(),
                "render cache invalidated"
            );
            self.entries.clear();
            self.revision = revision;
        }
    }

    pub fn contains(&self, page: usize, zoom: Zoom) -> bool {
        self.entries.contains(&(page, zoom.percent()))
    }

    pub fn get(&mut self, page: usize, zoom: Zoom) -> Option<&RgbaImage> {
        let found = self.entries.get(&(page, zoom.percent()));
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Cached bitmap, or the result of `render` stored for next time.
    pub fn get_or_render<E>(
        &mut self,
        page: usize,
        zoom: Zoom,
        render: impl FnOnce() -> Result<RgbaImage, E>,
    ) -> Result<&RgbaImage, E> {
        let key = (page, zoom.percent());
        if self.entries.contains(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries.try_get_or_insert(key, render)
    }

    pub fn insert(&mut self, page: usize, zoom: Zoom, image: RgbaImage) {
        self.entries.put((page, zoom.percent()), image);
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
