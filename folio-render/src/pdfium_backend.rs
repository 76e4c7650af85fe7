use std::convert::TryFrom;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use folio_core::{DocumentBackend, DocumentProvider, Glyph, Link, PageInfo, RenderedBitmap};
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use tracing::{instrument, warn};

use crate::rgba_to_bgra_in_place;

pub struct PdfiumRenderFactory {
    pdfium: Arc<Pdfium>,
}

impl PdfiumRenderFactory {
    pub fn new() -> Result<Self> {
        let pdfium = match bind_pdfium_from_build_hint() {
            Some(pdfium) => pdfium,
            None => bind_pdfium_default()?,
        };
        Ok(Self {
            pdfium: Arc::new(pdfium),
        })
    }
}

#[async_trait]
impl DocumentProvider for PdfiumRenderFactory {
    async fn open(&self, path: &Path) -> Result<Arc<dyn DocumentBackend>> {
        let absolute = path
            .canonicalize()
            .with_context(|| format!("failed to resolve path for {:?}", path))?;
        let page_count = probe_page_count(&self.pdfium, &absolute)?;
        Ok(Arc::new(PdfiumDocument::new(
            Arc::clone(&self.pdfium),
            absolute,
            page_count,
        )))
    }
}

struct PdfiumDocument {
    pdfium: Arc<Pdfium>,
    path: PathBuf,
    page_count: usize,
    cache: Mutex<Option<RenderCacheEntry>>,
    document: Mutex<Option<PdfDocument<'static>>>,
}

struct RenderCacheEntry {
    page_index: usize,
    effective_zoom: f32,
    bitmap: RenderedBitmap,
}

impl PdfiumDocument {
    fn new(pdfium: Arc<Pdfium>, path: PathBuf, page_count: usize) -> Self {
        Self {
            pdfium,
            path,
            page_count,
            cache: Mutex::new(None),
            document: Mutex::new(None),
        }
    }

    fn open_document(&self) -> Result<PdfDocument<'static>> {
        let document = self
            .pdfium
            .load_pdf_from_file(&self.path, None)
            .with_context(|| format!("failed to open {:?}", self.path))?;
        // SAFETY: the returned PdfDocument borrows the Pdfium bindings owned
        // by self.pdfium. It is stored in self.document, which is declared
        // after pdfium on this struct, so it drops first and the borrow
        // never outlives the bindings.
        let document = unsafe { mem::transmute::<PdfDocument<'_>, PdfDocument<'static>>(document) };
        Ok(document)
    }

    fn with_document<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&PdfDocument<'static>) -> Result<R>,
    {
        let mut guard = self.document.lock();
        if guard.is_none() {
            let document = self.open_document()?;
            *guard = Some(document);
        }
        let document = guard.as_ref().expect("document must be loaded");
        f(document)
    }

    fn page_at<'a>(
        &self,
        document: &'a PdfDocument<'static>,
        page_index: usize,
    ) -> Result<PdfPage<'a>> {
        let index: PdfPageIndex = page_index
            .try_into()
            .map_err(|_| anyhow!("page {} is out of supported range", page_index))?;
        document
            .pages()
            .get(index)
            .with_context(|| format!("page {} out of range", page_index))
    }

    fn link_destination(&self, link: &PdfLink<'_>) -> Option<(i32, Option<String>)> {
        if let Some(action) = link.action() {
            match action.action_type() {
                PdfActionType::GoToDestinationInSameDocument => {
                    if let Some(local) = action.as_local_destination_action() {
                        if let Ok(destination) = local.destination() {
                            if let Ok(page_index) = destination.page_index() {
                                return Some((page_index as i32, None));
                            }
                        }
                    }
                }
                PdfActionType::Uri => {
                    if let Some(uri_action) = action.as_uri_action() {
                        if let Ok(uri) = uri_action.uri() {
                            if !uri.is_empty() {
                                return Some((-1, Some(uri)));
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(destination) = link.destination() {
            if let Ok(page_index) = destination.page_index() {
                return Some((page_index as i32, None));
            }
        }

        None
    }
}

impl DocumentBackend for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_info(&self, page_index: usize) -> Result<PageInfo> {
        self.with_document(|document| {
            let page = self.page_at(document, page_index)?;
            Ok(PageInfo {
                width: page.width().value,
                height: page.height().value,
                rotation: rotation_degrees(&page),
            })
        })
    }

    #[instrument(skip(self))]
    fn render_page(&self, page_index: usize, effective_zoom: f32) -> Result<RenderedBitmap> {
        {
            let cache = self.cache.lock();
            if let Some(entry) = cache.as_ref() {
                if entry.page_index == page_index
                    && (entry.effective_zoom - effective_zoom).abs() < f32::EPSILON
                {
                    return Ok(entry.bitmap.clone());
                }
            }
        }

        let bitmap = self.with_document(|document| {
            let page = self.page_at(document, page_index)?;
            let config = PdfRenderConfig::new().scale_page_by_factor(effective_zoom.max(0.1));
            let rendered = page
                .render_with_config(&config)
                .with_context(|| format!("failed to render page {}", page_index))?;
            let image = rendered.as_image().to_rgba8();
            let width = u32::try_from(rendered.width()).unwrap_or_default();
            let height = u32::try_from(rendered.height()).unwrap_or_default();
            let mut pixels = image.into_raw();
            rgba_to_bgra_in_place(&mut pixels);
            Ok(RenderedBitmap {
                width,
                height,
                pixels,
            })
        })?;

        let mut cache = self.cache.lock();
        *cache = Some(RenderCacheEntry {
            page_index,
            effective_zoom,
            bitmap: bitmap.clone(),
        });

        Ok(bitmap)
    }

    fn extract_glyphs(&self, page_index: usize) -> Result<Vec<Glyph>> {
        self.with_document(|document| {
            let page = self.page_at(document, page_index)?;
            let page_height = page.height().value;
            let text = page
                .text()
                .with_context(|| format!("failed to extract text for page {}", page_index))?;

            let mut glyphs = Vec::new();
            for ch in text.chars().iter() {
                let bounds = match ch.loose_bounds() {
                    Ok(bounds) => bounds,
                    Err(err) => {
                        warn!(
                            ?err,
                            page = page_index,
                            path = %self.path.display(),
                            "failed to resolve glyph bounds"
                        );
                        continue;
                    }
                };
                let left = bounds.left().value;
                let right = bounds.right().value;
                let top = bounds.top().value;
                let bottom = bounds.bottom().value;
                glyphs.push(Glyph {
                    code_point: ch
                        .unicode_char()
                        .map(|c| c as u32)
                        .unwrap_or(u32::from('\u{FFFD}')),
                    // Pdfium reports bottom-up page coordinates; the engine
                    // works with a top-left origin.
                    x: left,
                    y: page_height - top,
                    width: right - left,
                    height: top - bottom,
                    font_size: ch.scaled_font_size().value,
                });
            }
            Ok(glyphs)
        })
    }

    fn extract_links(&self, page_index: usize) -> Result<Vec<Link>> {
        self.with_document(|document| {
            let page = self.page_at(document, page_index)?;
            let page_height = page.height().value;

            let mut links = Vec::new();
            for link in page.links().iter() {
                let rect = match link.rect() {
                    Ok(rect) => rect,
                    Err(err) => {
                        warn!(
                            ?err,
                            page = page_index,
                            path = %self.path.display(),
                            "failed to resolve link rectangle"
                        );
                        continue;
                    }
                };

                let Some((dest_page, uri)) = self.link_destination(&link) else {
                    continue;
                };

                links.push(Link {
                    x1: rect.left().value,
                    y1: page_height - rect.top().value,
                    x2: rect.right().value,
                    y2: page_height - rect.bottom().value,
                    dest_page,
                    uri,
                });
            }
            Ok(links)
        })
    }
}

fn rotation_degrees(page: &PdfPage<'_>) -> u16 {
    match page.rotation() {
        Ok(PdfPageRenderRotation::Degrees90) => 90,
        Ok(PdfPageRenderRotation::Degrees180) => 180,
        Ok(PdfPageRenderRotation::Degrees270) => 270,
        _ => 0,
    }
}

fn probe_page_count(pdfium: &Pdfium, path: &Path) -> Result<usize> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .with_context(|| format!("failed to open {:?}", path))?;
    Ok(usize::from(document.pages().len()))
}

fn bind_pdfium_from_build_hint() -> Option<Pdfium> {
    match option_env!("FOLIO_PDFIUM_LIBRARY_PATH") {
        Some(path) if !path.is_empty() => match Pdfium::bind_to_library(path) {
            Ok(bindings) => Some(Pdfium::new(bindings)),
            Err(err) => {
                warn!(
                    "failed to load Pdfium from build-provided path {}: {}",
                    path, err
                );
                None
            }
        },
        _ => None,
    }
}

fn bind_pdfium_default() -> Result<Pdfium> {
    let mut errors = Vec::new();

    let cwd_path = Pdfium::pdfium_platform_library_name_at_path("./");

    match Pdfium::bind_to_library(&cwd_path) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(err) => {
            errors.push(format!("{}: {}", cwd_path.display(), err));
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(err) => {
            errors.push(format!("system: {err}"));
            Err(anyhow!(
                "failed to bind to a pdfium library; ensure it is installed ({})",
                errors.join(", ")
            ))
        }
    }
}
