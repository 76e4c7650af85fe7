//! The owner-thread façade over every viewport subsystem.
//!
//! A [`ViewerEngine`] holds the open document, its page slots, the
//! glyph/link caches, search, selection, zoom, and scroll state. All
//! mutation happens on the thread that owns the engine; render workers
//! only feed bitmaps back over a channel which [`ViewerEngine::pump`]
//! drains. Hosts drive the engine with [`ViewerCommand`]s and normalized
//! pointer input, and drain [`ViewerEvent`]s after each call.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::backend::{DocumentBackend, DocumentProvider, PageInfo};
use crate::document_id_for_path;
use crate::error::ViewerError;
use crate::geometry::{screen_to_page_point, ScreenPoint};
use crate::print::{paginate, PrintArea, PrintPage};
use crate::render::{pre_render_pages, spawn_render_pass, RenderMessage, PRINT_ZOOM};
use crate::scroll::ScrollPageTracker;
use crate::search::{SearchEngine, SearchMatch};
use crate::selection::{hit_test_loose, hit_test_strict, GlyphRef, SelectionEngine};
use crate::text_index::{GlyphIndex, LinkIndex};
use crate::types::{CursorHint, Generation, Glyph, Link, ViewerCommand, ViewerEvent};
use crate::zoom::{ViewportZoomController, WHEEL_ZOOM_STEP, ZOOM_EPSILON, ZOOM_STEP};
use crate::DocumentId;

/// A page bitmap plus the cheap visual rescale applied during the zoom
/// transient. Display size is `pixel size × display_scale`; a sharp
/// re-render resets the scale to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub bitmap: crate::backend::RenderedBitmap,
    pub display_scale: f32,
}

impl RenderedPage {
    pub fn display_width(&self) -> f32 {
        self.bitmap.width as f32 * self.display_scale
    }

    pub fn display_height(&self) -> f32 {
        self.bitmap.height as f32 * self.display_scale
    }
}

/// Viewport geometry and scroll position, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    pub width: f32,
    pub height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

#[derive(Debug, Default)]
struct PageSlot {
    info: Option<PageInfo>,
    rendered: Option<RenderedPage>,
    /// UI rotation in degrees, advanced by the rotate-all command. Affects
    /// presentation only, never glyph coordinates.
    ui_rotation: u16,
}

struct OpenDocument {
    id: DocumentId,
    path: PathBuf,
    backend: Arc<dyn DocumentBackend>,
    page_count: usize,
}

pub struct ViewerEngine {
    document: Option<OpenDocument>,
    generation: Generation,
    pages: Vec<PageSlot>,
    glyphs: GlyphIndex,
    links: LinkIndex,
    search: SearchEngine,
    selection: SelectionEngine,
    zoom: ViewportZoomController,
    tracker: ScrollPageTracker,
    viewport: ViewportMetrics,
    events: Vec<ViewerEvent>,
    render_tx: Sender<RenderMessage>,
    render_rx: Receiver<RenderMessage>,
}

impl ViewerEngine {
    pub fn new(dpi_scale: f32) -> Self {
        let (render_tx, render_rx) = mpsc::channel();
        Self {
            document: None,
            generation: Generation::default(),
            pages: Vec::new(),
            glyphs: GlyphIndex::new(0),
            links: LinkIndex::new(0),
            search: SearchEngine::new(),
            selection: SelectionEngine::new(),
            zoom: ViewportZoomController::new(dpi_scale),
            tracker: ScrollPageTracker::new(),
            viewport: ViewportMetrics::default(),
            events: Vec::new(),
            render_tx,
            render_rx,
        }
    }

    /// Opens `path` through `provider`, replacing any open document. All
    /// caches reset, the generation bumps, and a render pass starts. On
    /// failure a `DocumentFailed` event is queued and no partial state is
    /// retained.
    #[instrument(skip(self, provider))]
    pub async fn open_with(
        &mut self,
        provider: &dyn DocumentProvider,
        path: &Path,
    ) -> Result<(), ViewerError> {
        self.close();
        let backend = match provider.open(path).await {
            Ok(backend) => backend,
            Err(source) => {
                self.events.push(ViewerEvent::DocumentFailed {
                    path: path.to_path_buf(),
                    cause: source.to_string(),
                });
                return Err(ViewerError::Open {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        self.generation = self.generation.next();
        let page_count = backend.page_count();
        self.pages = (0..page_count)
            .map(|i| PageSlot {
                info: backend.page_info(i).ok(),
                ..PageSlot::default()
            })
            .collect();
        self.glyphs.reset(page_count);
        self.links.reset(page_count);
        self.zoom.reset();
        self.tracker.reset();
        self.viewport.scroll_x = 0.0;
        self.viewport.scroll_y = 0.0;

        let id = document_id_for_path(path);
        info!(document = %id, page_count, "document opened");
        self.events.push(ViewerEvent::DocumentOpened {
            path: path.to_path_buf(),
            page_count,
        });
        self.document = Some(OpenDocument {
            id,
            path: path.to_path_buf(),
            backend,
            page_count,
        });
        self.start_render_pass();
        Ok(())
    }

    /// Closes the open document. The generation bump makes any in-flight
    /// render result stale; it is dropped when it arrives.
    pub fn close(&mut self) {
        if let Some(doc) = self.document.take() {
            info!(document = %doc.id, "document closed");
            self.generation = self.generation.next();
        }
        self.pages.clear();
        self.glyphs.reset(0);
        self.links.reset(0);
        self.search.clear();
        self.selection.clear();
        self.zoom.cancel_pending();
        self.tracker.reset();
    }

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.page_count)
    }

    pub fn current_page(&self) -> usize {
        self.tracker.current()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom.zoom()
    }

    pub fn is_zoom_transient(&self) -> bool {
        self.zoom.is_transient()
    }

    pub fn viewport(&self) -> ViewportMetrics {
        self.viewport
    }

    pub fn rendered_page(&self, page: usize) -> Option<&RenderedPage> {
        self.pages.get(page)?.rendered.as_ref()
    }

    pub fn page_info(&self, page: usize) -> Option<PageInfo> {
        self.pages.get(page)?.info
    }

    pub fn ui_rotation(&self, page: usize) -> u16 {
        self.pages.get(page).map_or(0, |slot| slot.ui_rotation)
    }

    pub fn search_summary(&self) -> String {
        self.search.summary()
    }

    /// Glyph ranges to highlight on `page` for the active query, with the
    /// current match flagged.
    pub fn search_highlights(&self, page: usize) -> Vec<(SearchMatch, bool)> {
        self.search.highlights_on_page(page)
    }

    /// Selected glyph range on `page` for highlight drawing. The pointer
    /// path fills the glyph cache before any drag exists, so a page with
    /// an unfilled cache has no selection on it.
    pub fn selection_range_on_page(&self, page: usize) -> Option<(usize, usize)> {
        let glyphs = self.glyphs.peek(page)?;
        self.selection.glyph_range_on_page(page, glyphs.len())
    }

    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport.width = width.max(0.0);
        self.viewport.height = height.max(0.0);
        self.refresh_current_page();
    }

    pub fn set_scroll(&mut self, x: f32, y: f32) {
        self.viewport.scroll_x = x.max(0.0);
        self.viewport.scroll_y = y.max(0.0);
        self.refresh_current_page();
    }

    /// Display heights per page at the current zoom; unrendered pages
    /// contribute zero until their bitmap arrives.
    pub fn page_display_heights(&self) -> Vec<f32> {
        self.pages
            .iter()
            .map(|slot| {
                slot.rendered
                    .as_ref()
                    .map_or(0.0, RenderedPage::display_height)
            })
            .collect()
    }

    /// Drains pending render results, applies those from the live
    /// generation, drops the rest, then fires the zoom debounce if due.
    pub fn pump(&mut self, now: Instant) {
        loop {
            match self.render_rx.try_recv() {
                Ok(RenderMessage::PageRendered {
                    generation,
                    page,
                    effective_zoom,
                    bitmap,
                }) => {
                    if generation != self.generation || self.document.is_none() {
                        let err = ViewerError::StaleResult {
                            stale: generation,
                            current: self.generation,
                        };
                        debug!(error = %err, page, "dropping render result");
                        continue;
                    }
                    let display_scale = self.zoom.effective_zoom() / effective_zoom;
                    if let Some(slot) = self.pages.get_mut(page) {
                        slot.rendered = bitmap.map(|bitmap| RenderedPage {
                            bitmap,
                            display_scale,
                        });
                    }
                }
                Ok(RenderMessage::PassComplete {
                    generation,
                    effective_zoom,
                }) => {
                    if generation != self.generation {
                        continue;
                    }
                    if (effective_zoom - self.zoom.effective_zoom()).abs() < ZOOM_EPSILON {
                        self.zoom.mark_sharp();
                        self.events
                            .push(ViewerEvent::RenderingComplete { generation });
                        self.refresh_current_page();
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if self.zoom.poll_debounce(now) {
            self.start_render_pass();
        }
    }

    pub fn apply(&mut self, command: ViewerCommand, now: Instant) -> Result<()> {
        match command {
            ViewerCommand::Close => self.close(),
            ViewerCommand::GoToPage { page } => self.go_to_page(page),
            ViewerCommand::NextPage => self.go_to_page(self.tracker.current() + 1),
            ViewerCommand::PrevPage => {
                if let Some(prev) = self.tracker.current().checked_sub(1) {
                    self.go_to_page(prev);
                }
            }
            ViewerCommand::ZoomIn => self.zoom_centered(self.zoom.zoom() * ZOOM_STEP, now),
            ViewerCommand::ZoomOut => self.zoom_centered(self.zoom.zoom() / ZOOM_STEP, now),
            ViewerCommand::SetZoom { level } => self.zoom_centered(level, now),
            ViewerCommand::RotateAll => {
                for slot in &mut self.pages {
                    slot.ui_rotation = (slot.ui_rotation + 90) % 360;
                }
            }
            ViewerCommand::Search { query } => self.run_search(&query),
            ViewerCommand::NextMatch => {
                if let Some(m) = self.search.next() {
                    self.go_to_page(m.page);
                }
            }
            ViewerCommand::PrevMatch => {
                if let Some(m) = self.search.previous() {
                    self.go_to_page(m.page);
                }
            }
            ViewerCommand::ClearSearch => self.search.clear(),
            ViewerCommand::SaveCopyAs { dest } => self.save_copy_as(&dest)?,
        }
        Ok(())
    }

    /// Cursor-anchored zoom: the content under `anchor` (viewport-relative
    /// pixels) stays put while everything scales around it.
    pub fn zoom_at(&mut self, target: f32, anchor: ScreenPoint, now: Instant) {
        if let Some(change) = self.zoom.set_zoom(target, now) {
            self.apply_zoom_change(change.scale, change.new, anchor);
        }
    }

    /// Wheel zoom by one multiplicative step toward or away, anchored at
    /// the cursor.
    pub fn wheel_zoom(&mut self, zoom_in: bool, cursor: ScreenPoint, now: Instant) {
        let factor = if zoom_in {
            WHEEL_ZOOM_STEP
        } else {
            1.0 / WHEEL_ZOOM_STEP
        };
        self.zoom_at(self.zoom.zoom() * factor, cursor, now);
    }

    fn zoom_centered(&mut self, target: f32, now: Instant) {
        let center = ScreenPoint::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.zoom_at(target, center, now);
    }

    fn apply_zoom_change(&mut self, scale: f32, new_level: f32, anchor: ScreenPoint) {
        for slot in &mut self.pages {
            if let Some(rendered) = &mut slot.rendered {
                rendered.display_scale *= scale;
            }
        }
        self.viewport.scroll_x = crate::zoom::anchored_offset(self.viewport.scroll_x, anchor.x, scale);
        self.viewport.scroll_y = crate::zoom::anchored_offset(self.viewport.scroll_y, anchor.y, scale);
        self.events.push(ViewerEvent::ZoomChanged { level: new_level });
        self.refresh_current_page();
    }

    /// Pointer press on `page` at `at` (page-relative display pixels).
    /// A press on a link activates it; otherwise the press clears any
    /// selection and, on a loose glyph hit, starts a new drag.
    pub fn pointer_down(&mut self, page: usize, at: ScreenPoint) {
        let point = screen_to_page_point(at, self.zoom.zoom(), self.zoom.dpi_scale());
        let links = self.links_on(page);
        if let Some(link) = links.iter().find(|l| l.contains(point.x, point.y)) {
            let link = link.clone();
            self.activate_link(link);
            return;
        }
        self.selection.clear();
        let glyphs = self.glyphs_on(page);
        if let Some(glyph) = hit_test_loose(&glyphs, point) {
            self.selection.begin(GlyphRef { page, glyph });
        }
    }

    /// Pointer move: extends an active drag, otherwise reports the cursor
    /// shape from strict link/glyph hit-tests.
    pub fn pointer_move(&mut self, page: usize, at: ScreenPoint) -> CursorHint {
        let point = screen_to_page_point(at, self.zoom.zoom(), self.zoom.dpi_scale());
        if self.selection.is_dragging() {
            let glyphs = self.glyphs_on(page);
            if let Some(glyph) = hit_test_loose(&glyphs, point) {
                self.selection.update(GlyphRef { page, glyph });
            }
            return CursorHint::IBeam;
        }
        let links = self.links_on(page);
        if links.iter().any(|l| l.contains(point.x, point.y)) {
            return CursorHint::Hand;
        }
        let glyphs = self.glyphs_on(page);
        if hit_test_strict(&glyphs, point).is_some() {
            CursorHint::IBeam
        } else {
            CursorHint::Arrow
        }
    }

    /// Pointer release commits the drag and emits the reconstructed text.
    pub fn pointer_up(&mut self) {
        if !self.selection.is_dragging() {
            return;
        }
        self.selection.commit();
        let text = self.selected_text();
        if !text.is_empty() {
            self.events.push(ViewerEvent::SelectionChanged { text });
        }
    }

    /// Glyph text of one page in backend order, for diagnostics and text
    /// dumps.
    pub fn page_text(&mut self, page: usize) -> String {
        self.glyphs_on(page).iter().map(Glyph::to_char).collect()
    }

    pub fn selected_text(&mut self) -> String {
        let Some(doc) = &self.document else {
            return String::new();
        };
        let page_count = doc.page_count;
        let backend = Arc::clone(&doc.backend);
        let glyphs = &mut self.glyphs;
        self.selection.selected_text(page_count, |page| {
            glyphs.get_or_fill(page, || backend.extract_glyphs(page))
        })
    }

    /// Copies the open document's file to `dest`.
    pub fn save_copy_as(&self, dest: &Path) -> Result<()> {
        let doc = self.document.as_ref().context("no document open")?;
        fs::copy(&doc.path, dest)
            .with_context(|| format!("failed to copy {:?} to {:?}", doc.path, dest))?;
        info!(document = %doc.id, dest = %dest.display(), "saved copy");
        Ok(())
    }

    /// Pre-renders every page at the fixed print zoom and lays each onto
    /// its own sheet. Failed pages come back as missing sheets.
    pub fn print_pages(&self, area: PrintArea) -> Vec<PrintPage> {
        let Some(doc) = &self.document else {
            return Vec::new();
        };
        let bitmaps = pre_render_pages(doc.backend.as_ref(), PRINT_ZOOM);
        paginate(&bitmaps, area)
    }

    fn start_render_pass(&mut self) {
        if let Some(doc) = &self.document {
            let _ = spawn_render_pass(
                Arc::clone(&doc.backend),
                self.generation,
                self.zoom.effective_zoom(),
                self.render_tx.clone(),
            );
        }
    }

    fn go_to_page(&mut self, page: usize) {
        if page >= self.page_count() {
            let err = ViewerError::OutOfRange {
                page,
                page_count: self.page_count(),
            };
            debug!(error = %err, "ignoring page jump");
            return;
        }
        if let Some(index) = self.tracker.force(page) {
            self.events.push(ViewerEvent::CurrentPageChanged { index });
        }
    }

    fn run_search(&mut self, query: &str) {
        let Some(doc) = &self.document else {
            self.search.clear();
            return;
        };
        let page_count = doc.page_count;
        let backend = Arc::clone(&doc.backend);
        let current_page = self.tracker.current();
        let glyphs = &mut self.glyphs;
        self.search.run(query, current_page, page_count, |page| {
            glyphs
                .get_or_fill(page, || backend.extract_glyphs(page))
                .iter()
                .map(Glyph::to_char)
                .collect()
        });
        if let Some(m) = self.search.current() {
            self.go_to_page(m.page);
        }
    }

    fn activate_link(&mut self, link: Link) {
        if link.is_internal() {
            self.go_to_page(link.dest_page as usize);
        } else if link.is_external() {
            self.events.push(ViewerEvent::LinkActivated { link });
        }
    }

    fn refresh_current_page(&mut self) {
        let heights = self.page_display_heights();
        if let Some(index) =
            self.tracker
                .update(&heights, self.viewport.scroll_y, self.viewport.height)
        {
            self.events.push(ViewerEvent::CurrentPageChanged { index });
        }
    }

    fn glyphs_on(&mut self, page: usize) -> Arc<[Glyph]> {
        let Some(doc) = &self.document else {
            return Arc::from(Vec::new());
        };
        let backend = Arc::clone(&doc.backend);
        self.glyphs
            .get_or_fill(page, || backend.extract_glyphs(page))
    }

    fn links_on(&mut self, page: usize) -> Arc<[Link]> {
        let Some(doc) = &self.document else {
            return Arc::from(Vec::new());
        };
        let backend = Arc::clone(&doc.backend);
        self.links.get_or_fill(page, || backend.extract_links(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use crate::backend::RenderedBitmap;
    use crate::zoom::RENDER_DEBOUNCE;

    #[derive(Default, Clone)]
    struct FakePage {
        text: String,
        links: Vec<Link>,
        fail_render: bool,
    }

    struct FakeBackend {
        pages: Vec<FakePage>,
        bitmap_side: u32,
    }

    impl FakeBackend {
        fn with_texts(texts: &[&str]) -> Self {
            Self {
                pages: texts
                    .iter()
                    .map(|t| FakePage {
                        text: (*t).to_string(),
                        ..FakePage::default()
                    })
                    .collect(),
                bitmap_side: 10,
            }
        }
    }

    impl DocumentBackend for FakeBackend {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_info(&self, _page_index: usize) -> Result<PageInfo> {
            Ok(PageInfo {
                width: 612.0,
                height: 792.0,
                rotation: 0,
            })
        }

        fn render_page(&self, page_index: usize, effective_zoom: f32) -> Result<RenderedBitmap> {
            let page = self
                .pages
                .get(page_index)
                .ok_or_else(|| anyhow!("no such page"))?;
            if page.fail_render {
                return Err(anyhow!("render failed"));
            }
            let side = (self.bitmap_side as f32 * effective_zoom).round() as u32;
            Ok(RenderedBitmap {
                width: side,
                height: side,
                pixels: vec![0; (side * side * 4) as usize],
            })
        }

        fn extract_glyphs(&self, page_index: usize) -> Result<Vec<Glyph>> {
            let page = self
                .pages
                .get(page_index)
                .ok_or_else(|| anyhow!("no such page"))?;
            Ok(page
                .text
                .chars()
                .enumerate()
                .map(|(i, c)| Glyph {
                    code_point: c as u32,
                    x: i as f32 * 10.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    font_size: 10.0,
                })
                .collect())
        }

        fn extract_links(&self, page_index: usize) -> Result<Vec<Link>> {
            Ok(self
                .pages
                .get(page_index)
                .map(|p| p.links.clone())
                .unwrap_or_default())
        }
    }

    struct FakeProvider {
        backend: Option<Arc<FakeBackend>>,
    }

    #[async_trait]
    impl DocumentProvider for FakeProvider {
        async fn open(&self, _path: &Path) -> Result<Arc<dyn DocumentBackend>> {
            match &self.backend {
                Some(backend) => Ok(Arc::clone(backend) as Arc<dyn DocumentBackend>),
                None => Err(anyhow!("unreadable document")),
            }
        }
    }

    async fn open(engine: &mut ViewerEngine, backend: FakeBackend) {
        let provider = FakeProvider {
            backend: Some(Arc::new(backend)),
        };
        engine
            .open_with(&provider, Path::new("/tmp/fake.pdf"))
            .await
            .unwrap();
    }

    fn pump_until_complete(engine: &mut ViewerEngine) -> Vec<ViewerEvent> {
        let mut events = Vec::new();
        for _ in 0..400 {
            engine.pump(Instant::now());
            events.extend(engine.take_events());
            if events
                .iter()
                .any(|e| matches!(e, ViewerEvent::RenderingComplete { .. }))
            {
                return events;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("render pass did not complete");
    }

    #[tokio::test]
    async fn open_renders_every_page() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["a", "b", "c"])).await;

        let events = pump_until_complete(&mut engine);
        assert!(events.iter().any(|e| matches!(
            e,
            ViewerEvent::DocumentOpened { page_count: 3, .. }
        )));
        for page in 0..3 {
            let rendered = engine.rendered_page(page).unwrap();
            assert_eq!(rendered.bitmap.width, 10);
            assert_eq!(rendered.display_scale, 1.0);
        }
    }

    #[tokio::test]
    async fn failed_page_leaves_a_blank_slot_only() {
        let mut backend = FakeBackend::with_texts(&["a", "b", "c", "d", "e"]);
        backend.pages[3].fail_render = true;
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, backend).await;

        pump_until_complete(&mut engine);
        for page in [0, 1, 2, 4] {
            assert!(engine.rendered_page(page).is_some(), "page {page}");
        }
        assert!(engine.rendered_page(3).is_none());
    }

    #[tokio::test]
    async fn open_failure_emits_document_failed_and_keeps_no_state() {
        let mut engine = ViewerEngine::new(1.0);
        let provider = FakeProvider { backend: None };
        let result = engine.open_with(&provider, Path::new("/tmp/bad.pdf")).await;

        assert!(matches!(result, Err(ViewerError::Open { .. })));
        assert!(engine
            .take_events()
            .iter()
            .any(|e| matches!(e, ViewerEvent::DocumentFailed { .. })));
        assert_eq!(engine.page_count(), 0);
    }

    #[tokio::test]
    async fn stale_results_from_a_replaced_document_are_dropped() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["a", "b"])).await;

        let mut second = FakeBackend::with_texts(&["a", "b"]);
        second.bitmap_side = 20;
        open(&mut engine, second).await;

        pump_until_complete(&mut engine);
        // Give the first pass time to flush, then confirm nothing from it
        // landed.
        std::thread::sleep(Duration::from_millis(50));
        engine.pump(Instant::now());
        for page in 0..2 {
            assert_eq!(engine.rendered_page(page).unwrap().bitmap.width, 20);
        }
    }

    #[tokio::test]
    async fn search_example_two_pages_current_page_aware() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["helloworld", "worldwide"])).await;

        engine
            .apply(ViewerCommand::GoToPage { page: 1 }, Instant::now())
            .unwrap();
        engine
            .apply(
                ViewerCommand::Search {
                    query: "world".into(),
                },
                Instant::now(),
            )
            .unwrap();

        assert_eq!(engine.search_summary(), "2/2");
        let page1 = engine.search_highlights(1);
        assert_eq!(page1, vec![(SearchMatch { page: 1, start: 0, end: 5 }, true)]);
        let page0 = engine.search_highlights(0);
        assert_eq!(page0, vec![(SearchMatch { page: 0, start: 5, end: 10 }, false)]);
    }

    #[tokio::test]
    async fn next_match_cycles_back_to_the_start() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["helloworld", "worldwide"])).await;

        engine
            .apply(
                ViewerCommand::Search {
                    query: "world".into(),
                },
                Instant::now(),
            )
            .unwrap();
        let start = engine.search_summary();
        engine.apply(ViewerCommand::NextMatch, Instant::now()).unwrap();
        engine.apply(ViewerCommand::NextMatch, Instant::now()).unwrap();
        assert_eq!(engine.search_summary(), start);
    }

    #[tokio::test]
    async fn search_without_a_document_is_a_safe_no_op() {
        let mut engine = ViewerEngine::new(1.0);
        engine
            .apply(
                ViewerCommand::Search {
                    query: "anything".into(),
                },
                Instant::now(),
            )
            .unwrap();
        assert_eq!(engine.search_summary(), "0/0");
    }

    #[test]
    fn viewport_centered_zoom_in_moves_offsets_to_keep_the_center() {
        let mut engine = ViewerEngine::new(1.0);
        engine.set_viewport_size(600.0, 800.0);
        engine.set_scroll(0.0, 0.0);

        engine.apply(ViewerCommand::ZoomIn, Instant::now()).unwrap();

        assert!((engine.zoom_level() - 1.25).abs() < 1e-6);
        // max(0, (0 + 300) * 1.25 - 300) = 75; same with 400 -> 100.
        let viewport = engine.viewport();
        assert!((viewport.scroll_x - 75.0).abs() < 1e-3);
        assert!((viewport.scroll_y - 100.0).abs() < 1e-3);
        assert!(engine
            .take_events()
            .iter()
            .any(|e| matches!(e, ViewerEvent::ZoomChanged { .. })));
    }

    #[test]
    fn cursor_anchored_zoom_is_invertible() {
        let mut engine = ViewerEngine::new(1.0);
        engine.set_viewport_size(800.0, 600.0);
        engine.set_scroll(120.0, 260.0);
        let anchor = ScreenPoint::new(300.0, 200.0);

        engine.zoom_at(2.0, anchor, Instant::now());
        engine.zoom_at(1.0, anchor, Instant::now());

        let viewport = engine.viewport();
        assert!((viewport.scroll_x - 120.0).abs() < 1e-3);
        assert!((viewport.scroll_y - 260.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn zoom_change_rescales_bitmaps_then_sharp_render_resets() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["a"])).await;
        pump_until_complete(&mut engine);

        let start = Instant::now();
        engine
            .apply(ViewerCommand::SetZoom { level: 2.0 }, start)
            .unwrap();
        assert!(engine.is_zoom_transient());
        let rendered = engine.rendered_page(0).unwrap();
        assert_eq!(rendered.bitmap.width, 10);
        assert!((rendered.display_scale - 2.0).abs() < 1e-6);

        // Before the debounce deadline nothing re-renders.
        engine.pump(start + Duration::from_millis(100));
        assert!(engine.is_zoom_transient());

        engine.pump(start + RENDER_DEBOUNCE);
        pump_until_complete(&mut engine);
        assert!(!engine.is_zoom_transient());
        let rendered = engine.rendered_page(0).unwrap();
        assert_eq!(rendered.bitmap.width, 20);
        assert!((rendered.display_scale - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn drag_selection_emits_text_and_is_direction_independent() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["helloworld"])).await;

        engine.pointer_down(0, ScreenPoint::new(15.0, 5.0));
        engine.pointer_move(0, ScreenPoint::new(35.0, 5.0));
        engine.pointer_up();
        let forward: Vec<_> = engine
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                ViewerEvent::SelectionChanged { text } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(forward, vec!["ell".to_string()]);

        engine.pointer_down(0, ScreenPoint::new(35.0, 5.0));
        engine.pointer_move(0, ScreenPoint::new(15.0, 5.0));
        engine.pointer_up();
        assert_eq!(engine.selected_text(), "ell");
    }

    #[tokio::test]
    async fn link_clicks_navigate_or_notify() {
        let mut backend = FakeBackend::with_texts(&["ab", "", ""]);
        backend.pages[0].links = vec![
            Link {
                x1: 0.0,
                y1: 100.0,
                x2: 50.0,
                y2: 110.0,
                dest_page: 2,
                uri: None,
            },
            Link {
                x1: 60.0,
                y1: 100.0,
                x2: 90.0,
                y2: 110.0,
                dest_page: -1,
                uri: Some("https://example.org".into()),
            },
        ];
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, backend).await;
        engine.take_events();

        engine.pointer_down(0, ScreenPoint::new(25.0, 105.0));
        assert!(engine
            .take_events()
            .iter()
            .any(|e| matches!(e, ViewerEvent::CurrentPageChanged { index: 2 })));

        engine.pointer_down(0, ScreenPoint::new(70.0, 105.0));
        assert!(engine
            .take_events()
            .iter()
            .any(|e| matches!(e, ViewerEvent::LinkActivated { .. })));
    }

    #[tokio::test]
    async fn pointer_move_reports_cursor_hints() {
        let mut backend = FakeBackend::with_texts(&["ab"]);
        backend.pages[0].links = vec![Link {
            x1: 0.0,
            y1: 100.0,
            x2: 50.0,
            y2: 110.0,
            dest_page: 1,
            uri: None,
        }];
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, backend).await;

        assert_eq!(
            engine.pointer_move(0, ScreenPoint::new(25.0, 105.0)),
            CursorHint::Hand
        );
        assert_eq!(
            engine.pointer_move(0, ScreenPoint::new(5.0, 5.0)),
            CursorHint::IBeam
        );
        assert_eq!(
            engine.pointer_move(0, ScreenPoint::new(400.0, 400.0)),
            CursorHint::Arrow
        );
    }

    #[tokio::test]
    async fn out_of_range_navigation_is_ignored() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["a", "b"])).await;
        engine.take_events();

        engine
            .apply(ViewerCommand::GoToPage { page: 99 }, Instant::now())
            .unwrap();
        assert_eq!(engine.current_page(), 0);
        assert!(engine.take_events().is_empty());
    }

    #[tokio::test]
    async fn rotate_all_advances_every_page_by_a_quarter_turn() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["a", "b"])).await;

        engine.apply(ViewerCommand::RotateAll, Instant::now()).unwrap();
        assert_eq!(engine.ui_rotation(0), 90);
        assert_eq!(engine.ui_rotation(1), 90);
        for _ in 0..3 {
            engine.apply(ViewerCommand::RotateAll, Instant::now()).unwrap();
        }
        assert_eq!(engine.ui_rotation(0), 0);
    }

    #[tokio::test]
    async fn save_copy_as_duplicates_the_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("doc.pdf");
        std::fs::write(&src, b"content").unwrap();
        let dest = dir.path().join("copy.pdf");

        let mut engine = ViewerEngine::new(1.0);
        let provider = FakeProvider {
            backend: Some(Arc::new(FakeBackend::with_texts(&["a"]))),
        };
        engine.open_with(&provider, &src).await.unwrap();

        engine
            .apply(ViewerCommand::SaveCopyAs { dest: dest.clone() }, Instant::now())
            .unwrap();
        assert_eq!(std::fs::read(dest).unwrap(), b"content");
    }

    #[tokio::test]
    async fn print_pages_places_each_bitmap_and_marks_failures() {
        let mut backend = FakeBackend::with_texts(&["a", "b"]);
        backend.pages[1].fail_render = true;
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, backend).await;

        let sheets = engine.print_pages(PrintArea {
            width: 100.0,
            height: 100.0,
        });
        assert_eq!(sheets.len(), 2);
        assert!(matches!(sheets[0], PrintPage::Placed { .. }));
        assert_eq!(sheets[1], PrintPage::Missing);
    }

    #[tokio::test]
    async fn resize_before_the_first_render_keeps_page_zero() {
        let mut engine = ViewerEngine::new(1.0);
        open(&mut engine, FakeBackend::with_texts(&["a", "b", "c"])).await;
        engine.take_events();

        // No pump yet, so every page height is still zero.
        engine.set_viewport_size(800.0, 600.0);
        engine.set_scroll(0.0, 1200.0);
        assert_eq!(engine.current_page(), 0);
        assert!(engine.take_events().is_empty());
    }

    #[tokio::test]
    async fn scrolling_updates_the_current_page() {
        let mut engine = ViewerEngine::new(1.0);
        let mut backend = FakeBackend::with_texts(&["a", "b", "c"]);
        backend.bitmap_side = 1000;
        open(&mut engine, backend).await;
        pump_until_complete(&mut engine);

        engine.set_viewport_size(800.0, 600.0);
        engine.set_scroll(0.0, 1200.0);
        assert_eq!(engine.current_page(), 1);
        assert!(engine
            .take_events()
            .iter()
            .any(|e| matches!(e, ViewerEvent::CurrentPageChanged { index: 1 })));
    }
}
