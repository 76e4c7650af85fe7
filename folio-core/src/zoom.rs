//! Zoom state, anchored-offset math, and the re-render debounce.
//!
//! A zoom change takes effect visually right away by rescaling the
//! already-rendered bitmaps, then a single-slot debounce timer coalesces
//! rapid changes into one sharp re-render pass.

use std::time::{Duration, Instant};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;
/// Zoom changes smaller than this are treated as no-ops.
pub const ZOOM_EPSILON: f32 = 0.001;
/// Multiplicative step for the zoom-in/zoom-out commands.
pub const ZOOM_STEP: f32 = 1.25;
/// Multiplicative step for pointer-wheel zoom.
pub const WHEEL_ZOOM_STEP: f32 = 1.15;
pub const RENDER_DEBOUNCE: Duration = Duration::from_millis(150);

/// Scroll offset that keeps `anchor` (viewport-relative, pixels) over the
/// same content point when the zoom scales by `scale`.
pub fn anchored_offset(old_offset: f32, anchor: f32, scale: f32) -> f32 {
    ((old_offset + anchor) * scale - anchor).max(0.0)
}

/// Single-slot countdown. Restarting while pending cancels the previous
/// deadline, so a burst of zoom changes fires exactly once.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + RENDER_DEBOUNCE);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, when `now` passes the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// A committed zoom change: `scale` is the ratio the host applies to
/// scroll offsets and bitmap display sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomChange {
    pub old: f32,
    pub new: f32,
    pub scale: f32,
}

/// Owns the zoom level, the display density factor, and the transient
/// (cheap-rescale) flag between a zoom change and its sharp re-render.
pub struct ViewportZoomController {
    zoom: f32,
    dpi_scale: f32,
    transient: bool,
    debounce: DebounceTimer,
}

impl ViewportZoomController {
    pub fn new(dpi_scale: f32) -> Self {
        let dpi_scale = if dpi_scale.is_finite() && dpi_scale > 0.0 {
            dpi_scale
        } else {
            1.0
        };
        Self {
            zoom: 1.0,
            dpi_scale,
            transient: false,
            debounce: DebounceTimer::default(),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    /// Zoom the backend rasterizes at: on-screen zoom times display density.
    pub fn effective_zoom(&self) -> f32 {
        self.zoom * self.dpi_scale
    }

    /// True between a zoom change and the debounced sharp re-render, while
    /// the viewport shows rescaled stale-resolution bitmaps.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Clamps and applies `target`. Returns `None` for changes inside the
    /// no-op epsilon; otherwise arms the debounce and reports the ratio.
    pub fn set_zoom(&mut self, target: f32, now: Instant) -> Option<ZoomChange> {
        if !target.is_finite() {
            return None;
        }
        let new = target.clamp(MIN_ZOOM, MAX_ZOOM);
        if (new - self.zoom).abs() < ZOOM_EPSILON {
            return None;
        }
        let old = self.zoom;
        self.zoom = new;
        self.transient = true;
        self.debounce.restart(now);
        Some(ZoomChange {
            old,
            new,
            scale: new / old,
        })
    }

    pub fn step_in(&mut self, now: Instant) -> Option<ZoomChange> {
        self.set_zoom(self.zoom * ZOOM_STEP, now)
    }

    pub fn step_out(&mut self, now: Instant) -> Option<ZoomChange> {
        self.set_zoom(self.zoom / ZOOM_STEP, now)
    }

    /// True when the debounce expires; the caller starts the sharp
    /// re-render pass and the transient flag clears once it completes.
    pub fn poll_debounce(&mut self, now: Instant) -> bool {
        self.debounce.poll(now)
    }

    /// Called when a sharp render pass at the current zoom finishes.
    pub fn mark_sharp(&mut self) {
        self.transient = false;
    }

    /// Drops any pending re-render, e.g. when the document closes.
    pub fn cancel_pending(&mut self) {
        self.debounce.cancel();
        self.transient = false;
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.cancel_pending();
    }
}
