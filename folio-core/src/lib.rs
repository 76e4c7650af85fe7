//! Interactive document viewport engine.
//!
//! `folio-core` turns the raw per-page capabilities of a document backend
//! (rasterize a page, extract positioned glyphs, extract links) into a
//! multi-page, zoomable, searchable, selectable viewing surface. It owns no
//! windowing code: the host feeds it normalized pointer/scroll/keyboard
//! input and drains notification events; the backend lives behind the
//! [`DocumentBackend`] trait.

use std::path::Path;

use once_cell::sync::Lazy;
use uuid::Uuid;

pub mod backend;
pub mod error;
pub mod geometry;
pub mod print;
pub mod render;
pub mod scroll;
pub mod search;
pub mod selection;
pub mod text_index;
pub mod types;
pub mod viewer;
pub mod zoom;

pub use backend::{DocumentBackend, DocumentProvider, PageInfo, RenderedBitmap};
pub use error::ViewerError;
pub use geometry::{screen_to_page_point, PagePoint, ScreenPoint};
pub use print::{paginate, PrintArea, PrintPage};
pub use render::{pre_render_pages, spawn_render_pass, RenderMessage, PRINT_ZOOM};
pub use scroll::ScrollPageTracker;
pub use search::{SearchEngine, SearchMatch, SearchState};
pub use selection::{GlyphRef, SelectionEngine};
pub use text_index::{GlyphIndex, LinkIndex, PageArena};
pub use types::{CursorHint, Generation, Glyph, Link, ViewerCommand, ViewerEvent};
pub use viewer::{RenderedPage, ViewerEngine, ViewportMetrics};
pub use zoom::{anchored_offset, DebounceTimer, ViewportZoomController, ZoomChange};

pub type DocumentId = Uuid;

static DOCUMENT_NAMESPACE: Lazy<Uuid> = Lazy::new(|| {
    Uuid::parse_str("9c41d7a3-4e0b-5f62-8d17-2a64c0b3ef55").expect("valid namespace UUID")
});

/// Stable identifier for a document path, used for logging and event
/// correlation. Two opens of the same file yield the same id; the
/// [`Generation`](types::Generation) token is what distinguishes open
/// instances of the same document.
pub fn document_id_for_path(path: &Path) -> DocumentId {
    let resolved = path
        .canonicalize()
        .or_else(|_| {
            if path.is_absolute() {
                Ok(path.to_path_buf())
            } else {
                std::env::current_dir().map(|cwd| cwd.join(path))
            }
        })
        .unwrap_or_else(|_| path.to_path_buf());
    let rendered = resolved.to_string_lossy();
    Uuid::new_v5(&DOCUMENT_NAMESPACE, rendered.as_bytes())
}
