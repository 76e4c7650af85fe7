//! Glyph hit-testing and drag text selection.
//!
//! Selections are anchored to glyph indices, not pixels, so they survive
//! zoom changes. A drag may span multiple pages; the selected range on each
//! page depends on the drag direction.

use std::sync::Arc;

use crate::geometry::PagePoint;
use crate::types::Glyph;

/// Vertical band, as a fraction of glyph height, within which a glyph is
/// considered to be on the probed line.
const LINE_BAND: f32 = 0.7;
/// Padding fraction for the forgiving hit-test box.
const LOOSE_PAD: f32 = 0.15;
/// Maximum horizontal distance (points) for a nearest-glyph fallback hit.
const NEAREST_CUTOFF: f32 = 200.0;
/// Vertical jump, as a fraction of glyph height, treated as a line break
/// when reconstructing selected text.
const LINE_BREAK_JUMP: f32 = 0.5;

/// A glyph pinned to its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRef {
    pub page: usize,
    pub glyph: usize,
}

/// Exact-box hit-test, used for cursor hints and link disambiguation.
pub fn hit_test_strict(glyphs: &[Glyph], point: PagePoint) -> Option<usize> {
    glyphs.iter().position(|g| {
        point.x >= g.x && point.x <= g.x + g.width && point.y >= g.y && point.y <= g.y + g.height
    })
}

/// Forgiving hit-test for starting and extending drags. A point inside a
/// glyph's padded box hits immediately; otherwise the nearest glyph by
/// horizontal center on the probed line wins, up to a cutoff distance.
pub fn hit_test_loose(glyphs: &[Glyph], point: PagePoint) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, g) in glyphs.iter().enumerate() {
        let pad = LOOSE_PAD * g.height;
        if point.x >= g.x - pad
            && point.x <= g.x + g.width + pad
            && point.y >= g.y - pad
            && point.y <= g.y + g.height + pad
        {
            return Some(i);
        }
        if (point.y - g.center_y()).abs() < LINE_BAND * g.height {
            let dx = (point.x - g.center_x()).abs();
            if best.map_or(true, |(_, d)| dx < d) {
                best = Some((i, dx));
            }
        }
    }
    best.filter(|&(_, d)| d < NEAREST_CUTOFF).map(|(i, _)| i)
}

/// Tracks an in-progress or committed drag selection.
pub struct SelectionEngine {
    anchor: Option<GlyphRef>,
    head: Option<GlyphRef>,
    dragging: bool,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self {
            anchor: None,
            head: None,
            dragging: false,
        }
    }

    pub fn begin(&mut self, at: GlyphRef) {
        self.anchor = Some(at);
        self.head = Some(at);
        self.dragging = true;
    }

    pub fn update(&mut self, to: GlyphRef) {
        if self.dragging {
            self.head = Some(to);
        }
    }

    /// Ends the drag, keeping the selection for copy/extract.
    pub fn commit(&mut self) {
        self.dragging = false;
    }

    pub fn clear(&mut self) {
        self.anchor = None;
        self.head = None;
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() || self.head.is_none()
    }

    fn endpoints(&self) -> Option<(GlyphRef, GlyphRef)> {
        Some((self.anchor?, self.head?))
    }

    /// Selected glyph index range on `page`, half-open, clamped to
    /// `glyph_count`. The drag direction decides which side of a boundary
    /// page is included.
    pub fn glyph_range_on_page(&self, page: usize, glyph_count: usize) -> Option<(usize, usize)> {
        let (anchor, head) = self.endpoints()?;
        let forward = (head.page, head.glyph) >= (anchor.page, anchor.glyph);
        let (first, last) = if forward { (anchor, head) } else { (head, anchor) };
        if page < first.page || page > last.page {
            return None;
        }

        let (start, end) = if first.page == last.page {
            (first.glyph, last.glyph + 1)
        } else if page == first.page {
            (first.glyph, glyph_count)
        } else if page == last.page {
            (0, last.glyph + 1)
        } else {
            (0, glyph_count)
        };

        let start = start.min(glyph_count);
        let end = end.min(glyph_count);
        if start >= end {
            None
        } else {
            Some((start, end))
        }
    }

    /// Reconstructs the selected text in visual reading order. Glyphs on
    /// each page are re-sorted by line then x before concatenation; page
    /// fragments are joined by a blank line. Space glyphs (including
    /// non-breaking ones) come out as plain spaces.
    pub fn selected_text<F>(&self, page_count: usize, mut glyphs_for: F) -> String
    where
        F: FnMut(usize) -> Arc<[Glyph]>,
    {
        let Some((anchor, head)) = self.endpoints() else {
            return String::new();
        };
        let first_page = anchor.page.min(head.page);
        let last_page = anchor.page.max(head.page).min(page_count.saturating_sub(1));

        let mut fragments: Vec<String> = Vec::new();
        for page in first_page..=last_page {
            let glyphs = glyphs_for(page);
            let Some((start, end)) = self.glyph_range_on_page(page, glyphs.len()) else {
                continue;
            };
            // Cluster into visual lines by Y, then read each line left to
            // right. Two glyphs share a line when their Y gap stays within
            // half a glyph height.
            let mut picked: Vec<Glyph> = glyphs[start..end].to_vec();
            picked.sort_by(|a, b| a.y.total_cmp(&b.y));
            let mut lined: Vec<(usize, Glyph)> = Vec::with_capacity(picked.len());
            let mut line = 0usize;
            for (i, g) in picked.iter().enumerate() {
                if i > 0 {
                    let prev = &picked[i - 1];
                    if (g.y - prev.y).abs() > LINE_BREAK_JUMP * prev.height.max(g.height) {
                        line += 1;
                    }
                }
                lined.push((line, *g));
            }
            lined.sort_by(|(la, a), (lb, b)| la.cmp(lb).then(a.x.total_cmp(&b.x)));

            let mut text = String::new();
            for (i, (line, g)) in lined.iter().enumerate() {
                if i > 0 && *line != lined[i - 1].0 {
                    text.push('\n');
                }
                text.push(if g.is_space() { ' ' } else { g.to_char() });
            }
            if !text.is_empty() {
                fragments.push(text);
            }
        }
        fragments.join("\n\n")
    }
}
