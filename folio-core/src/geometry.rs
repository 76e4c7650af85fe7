//! Coordinate transforms between screen space and backend point space.
//!
//! Every hit-test path goes through [`screen_to_page_point`] so the
//! zoom/DPI math lives in exactly one place.

/// A point in screen space: physical pixels relative to a page's top-left
/// corner at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A point in backend point space at zoom = 1, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Converts a screen-space point on a page to backend point space by
/// undoing the zoom and display-density scaling. Degenerate scale factors
/// fall back to 1.0 rather than producing NaN/Inf coordinates.
pub fn screen_to_page_point(point: ScreenPoint, zoom: f32, dpi_scale: f32) -> PagePoint {
    let scale = zoom * dpi_scale;
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    PagePoint {
        x: point.x / scale,
        y: point.y / scale,
    }
}
