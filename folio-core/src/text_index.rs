//! Lazy per-page caches for extracted glyphs and links.
//!
//! Extraction is paid once per page per open document: the first hit-test
//! or search touching a page fills its slot, later consumers share the
//! `Arc`. A failed extraction caches an empty slice so a broken page is
//! probed exactly once.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::types::{Glyph, Link};

pub type GlyphIndex = PageArena<Glyph>;
pub type LinkIndex = PageArena<Link>;

/// One `Arc<[T]>` slot per page, filled on demand.
pub struct PageArena<T> {
    slots: Vec<Option<Arc<[T]>>>,
}

impl<T> PageArena<T> {
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: (0..page_count).map(|_| None).collect(),
        }
    }

    /// Drops all cached slots and resizes for a newly opened document.
    pub fn reset(&mut self, page_count: usize) {
        self.slots.clear();
        self.slots.resize_with(page_count, || None);
    }

    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_filled(&self, page_index: usize) -> bool {
        self.slots
            .get(page_index)
            .is_some_and(|slot| slot.is_some())
    }

    /// Read-only view of a slot that has already been filled.
    pub fn peek(&self, page_index: usize) -> Option<Arc<[T]>> {
        self.slots.get(page_index)?.as_ref().map(Arc::clone)
    }

    /// Returns the cached slice for `page_index`, running `fill` on a
    /// miss. Out-of-range pages and extraction failures yield an empty
    /// slice; failures are cached so the backend is not re-probed.
    pub fn get_or_fill<F>(&mut self, page_index: usize, fill: F) -> Arc<[T]>
    where
        F: FnOnce() -> Result<Vec<T>>,
    {
        let Some(slot) = self.slots.get_mut(page_index) else {
            return Arc::from(Vec::new());
        };
        if let Some(cached) = slot {
            return Arc::clone(cached);
        }
        let items = match fill() {
            Ok(items) => items,
            Err(err) => {
                warn!(page = page_index, error = %err, "page extraction failed, caching empty result");
                Vec::new()
            }
        };
        let cached: Arc<[T]> = Arc::from(items);
        *slot = Some(Arc::clone(&cached));
        cached
    }
}
