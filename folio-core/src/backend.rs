//! The seam to the external document backend.
//!
//! The backend owns parsing, decoding, decryption, and glyph shaping. This
//! crate consumes it purely through [`DocumentBackend`]: rasterize one
//! page, extract its positioned glyphs, extract its links. Backend handles
//! never cross this boundary as raw pointers; an implementation wraps its
//! native state and releases it on drop.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Glyph, Link};

/// One rasterized page. `pixels` is a tightly packed BGRA8 buffer of
/// `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Backend-reported page geometry in document points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    pub width: f32,
    pub height: f32,
    /// Intrinsic page rotation in degrees (0, 90, 180, 270). Distinct from
    /// the UI rotation applied by the rotate-all command.
    pub rotation: u16,
}

/// Per-page capabilities of an open document. Implementations must be
/// callable from a background render worker, hence `Send + Sync`.
pub trait DocumentBackend: Send + Sync {
    fn page_count(&self) -> usize;

    fn page_info(&self, page_index: usize) -> Result<PageInfo>;

    /// Rasterizes a page at `effective_zoom` (on-screen zoom multiplied by
    /// display pixel density). An error here means this page stays blank;
    /// it never aborts rendering of the rest of the document.
    fn render_page(&self, page_index: usize, effective_zoom: f32) -> Result<RenderedBitmap>;

    /// Positioned glyphs in backend order. Backend order is not guaranteed
    /// to be visual reading order.
    fn extract_glyphs(&self, page_index: usize) -> Result<Vec<Glyph>>;

    fn extract_links(&self, page_index: usize) -> Result<Vec<Link>>;
}

/// Opens documents. Separated from [`DocumentBackend`] so the engine can be
/// handed different backends (and tests can hand it fakes).
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Arc<dyn DocumentBackend>>;
}
