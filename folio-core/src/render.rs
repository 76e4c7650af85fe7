//! Background rasterization passes.
//!
//! A render pass walks every page at one effective zoom on a worker thread
//! and streams bitmaps back over a channel. Each message carries the
//! generation current when the pass was scheduled; the receiving side drops
//! anything stale. A page that fails to rasterize is reported as `None` and
//! the pass continues.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::backend::{DocumentBackend, RenderedBitmap};
use crate::error::ViewerError;
use crate::types::Generation;

/// Zoom used when pre-rendering pages for print layout.
pub const PRINT_ZOOM: f32 = 2.0;

#[derive(Debug)]
pub enum RenderMessage {
    PageRendered {
        generation: Generation,
        page: usize,
        /// Zoom the bitmap was rasterized at. The receiver divides the
        /// live effective zoom by this to display a bitmap from a pass
        /// that a later zoom change has overtaken.
        effective_zoom: f32,
        bitmap: Option<RenderedBitmap>,
    },
    PassComplete {
        generation: Generation,
        effective_zoom: f32,
    },
}

/// Starts a worker that renders pages 0..page_count in order, sending one
/// [`RenderMessage::PageRendered`] per page and a trailing
/// [`RenderMessage::PassComplete`]. The pass aborts quietly if the receiver
/// is dropped.
pub fn spawn_render_pass(
    backend: Arc<dyn DocumentBackend>,
    generation: Generation,
    effective_zoom: f32,
    tx: Sender<RenderMessage>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let page_count = backend.page_count();
        debug!(
            generation = generation.value(),
            page_count, effective_zoom, "render pass started"
        );
        for page in 0..page_count {
            let bitmap = match backend.render_page(page, effective_zoom) {
                Ok(bitmap) => Some(bitmap),
                Err(source) => {
                    let err = ViewerError::Render { page, source };
                    warn!(error = %err, "continuing without the page");
                    None
                }
            };
            if tx
                .send(RenderMessage::PageRendered {
                    generation,
                    page,
                    effective_zoom,
                    bitmap,
                })
                .is_err()
            {
                return;
            }
        }
        let _ = tx.send(RenderMessage::PassComplete {
            generation,
            effective_zoom,
        });
    })
}

/// Renders every page synchronously at `zoom`, for print layout. Failed
/// pages come back as `None` slots.
pub fn pre_render_pages(
    backend: &dyn DocumentBackend,
    zoom: f32,
) -> Vec<Option<RenderedBitmap>> {
    (0..backend.page_count())
        .map(|page| match backend.render_page(page, zoom) {
            Ok(bitmap) => Some(bitmap),
            Err(source) => {
                let err = ViewerError::Render { page, source };
                warn!(error = %err, "continuing without the page");
                None
            }
        })
        .collect()
}
