//! Derives the current page from the scroll position.
//!
//! The current page is the one whose band contains the vertical midline of
//! the viewport, computed from cumulative page display heights. Pages whose
//! bitmaps have not arrived yet contribute zero height.

#[derive(Debug, Default)]
pub struct ScrollPageTracker {
    current: usize,
}

impl ScrollPageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Jump-to-page commands set the page directly; the next scroll update
    /// re-derives it from the offset.
    pub fn force(&mut self, page: usize) -> Option<usize> {
        if page == self.current {
            return None;
        }
        self.current = page;
        Some(page)
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Recomputes the current page for `scroll_offset`. Returns the new
    /// index only when it changed. When the midline lies past all measured
    /// content (every page still unmeasured, or the document shorter than
    /// half the viewport) the current page is left alone.
    pub fn update(
        &mut self,
        page_heights: &[f32],
        scroll_offset: f32,
        viewport_height: f32,
    ) -> Option<usize> {
        let midline = scroll_offset + viewport_height / 2.0;
        let mut cumulative = 0.0;
        for (i, height) in page_heights.iter().enumerate() {
            cumulative += height.max(0.0);
            if cumulative > midline {
                if i == self.current {
                    return None;
                }
                self.current = i;
                return Some(i);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_under_the_viewport_midline_is_current() {
        let heights = [1000.0, 1000.0, 1000.0];
        let mut tracker = ScrollPageTracker::new();

        assert_eq!(tracker.update(&heights, 0.0, 600.0), None);
        assert_eq!(tracker.current(), 0);

        // Midline at 1500 falls inside page 1.
        assert_eq!(tracker.update(&heights, 1200.0, 600.0), Some(1));
        assert_eq!(tracker.update(&heights, 1200.0, 600.0), None);

        assert_eq!(tracker.update(&heights, 2600.0, 600.0), Some(2));
    }

    #[test]
    fn midline_past_the_measured_content_keeps_the_current_page() {
        let heights = [500.0, 500.0];
        let mut tracker = ScrollPageTracker::new();
        assert_eq!(tracker.update(&heights, 0.0, 600.0), None);
        assert_eq!(tracker.current(), 0);

        // Overscrolled: the midline is beyond the last band.
        assert_eq!(tracker.update(&heights, 5000.0, 600.0), None);
        assert_eq!(tracker.current(), 0);
    }

    #[test]
    fn unmeasured_document_keeps_the_current_page() {
        // Between open and the first render pass every height is zero; a
        // viewport resize must not yank the page away from where it is.
        let mut tracker = ScrollPageTracker::new();
        assert_eq!(tracker.update(&[0.0, 0.0, 0.0], 0.0, 600.0), None);
        assert_eq!(tracker.current(), 0);

        tracker.force(1);
        assert_eq!(tracker.update(&[0.0, 0.0, 0.0], 0.0, 600.0), None);
        assert_eq!(tracker.current(), 1);
    }

    #[test]
    fn unmeasured_pages_contribute_no_height() {
        // Page 0 not yet rendered: page 1 starts at offset zero.
        let heights = [0.0, 1000.0];
        let mut tracker = ScrollPageTracker::new();
        assert_eq!(tracker.update(&heights, 0.0, 600.0), Some(1));
    }

    #[test]
    fn force_reports_only_real_changes() {
        let mut tracker = ScrollPageTracker::new();
        assert_eq!(tracker.force(0), None);
        assert_eq!(tracker.force(4), Some(4));
        assert_eq!(tracker.current(), 4);
    }

    #[test]
    fn empty_document_stays_on_page_zero() {
        let mut tracker = ScrollPageTracker::new();
        assert_eq!(tracker.update(&[], 100.0, 600.0), None);
        assert_eq!(tracker.current(), 0);
    }
}
