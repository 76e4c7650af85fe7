//! Pdfium-backed implementation of the `folio-core` document backend.
//!
//! The pdfium library is bound once per process; each open document wraps
//! its native handle behind a mutex and never leaks raw pointers to the
//! engine.

#[cfg(feature = "pdf")]
mod pdfium_backend;

#[cfg(feature = "pdf")]
pub use pdfium_backend::PdfiumRenderFactory;

/// Swaps the red and blue channels in place, converting the RGBA buffers
/// produced by pdfium's image path into the BGRA layout the engine's
/// bitmap contract promises.
pub(crate) fn rgba_to_bgra_in_place(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }
}
