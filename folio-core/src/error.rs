//! Error taxonomy for the viewport engine.
//!
//! Nothing here is fatal to the process: open failures surface as a
//! `DocumentFailed` event, per-page render failures degrade to a blank
//! slot, out-of-range lookups are ignored, and stale async results are
//! dropped silently.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Generation;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to open document {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("page {page} failed to rasterize")]
    Render {
        page: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("page {page} is out of range for a {page_count}-page document")]
    OutOfRange { page: usize, page_count: usize },

    #[error("result for generation {stale:?} arrived after generation {current:?} became active")]
    StaleResult {
        stale: Generation,
        current: Generation,
    },
}
