//! Core data model shared across the viewport engine.

use std::path::PathBuf;

/// Monotonic token identifying one open-document instance. Every
/// asynchronous render result carries the generation current when the work
/// was scheduled; results from a stale generation are discarded on arrival
/// and never touch visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// One positioned character-equivalent unit, in backend point space at
/// zoom = 1 with a top-left origin. Backend order is extraction order, not
/// guaranteed visual reading order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub code_point: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

impl Glyph {
    /// Space characters break words in selection output: U+0020 or U+00A0.
    pub fn is_space(&self) -> bool {
        self.code_point == 0x20 || self.code_point == 0xA0
    }

    /// Converts the code point to a `char`, substituting U+FFFD for values
    /// that do not map to a scalar (surrogate range, out of range).
    pub fn to_char(&self) -> char {
        char::from_u32(self.code_point).unwrap_or('\u{FFFD}')
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// A hyperlink region on a page, in point space. External iff it carries a
/// URI and no internal destination page.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// 0-based destination page, or -1 for external links.
    pub dest_page: i32,
    pub uri: Option<String>,
}

impl Link {
    pub fn is_internal(&self) -> bool {
        self.dest_page >= 0
    }

    pub fn is_external(&self) -> bool {
        self.dest_page < 0 && self.uri.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

/// What the host should show for the pointer, derived from strict
/// link/glyph hit-tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Arrow,
    Hand,
    IBeam,
}

/// Notifications emitted by the engine, delivered synchronously and in the
/// order of the state changes that produced them. The owner thread drains
/// them via [`ViewerEngine::take_events`](crate::viewer::ViewerEngine::take_events).
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    DocumentOpened { path: PathBuf, page_count: usize },
    DocumentFailed { path: PathBuf, cause: String },
    CurrentPageChanged { index: usize },
    ZoomChanged { level: f32 },
    RenderingComplete { generation: Generation },
    LinkActivated { link: Link },
    SelectionChanged { text: String },
}

/// Commands accepted by [`ViewerEngine::apply`](crate::viewer::ViewerEngine::apply).
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    Close,
    GoToPage { page: usize },
    NextPage,
    PrevPage,
    ZoomIn,
    ZoomOut,
    SetZoom { level: f32 },
    RotateAll,
    Search { query: String },
    NextMatch,
    PrevMatch,
    ClearSearch,
    SaveCopyAs { dest: PathBuf },
}
