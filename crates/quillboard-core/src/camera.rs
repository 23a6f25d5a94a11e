//! Camera: zoom and viewport state layered over logical item geometry.
//!
//! The viewport is expressed as fraction ranges of a scroll region, so the
//! device-to-logical conversion is an offset lookup; the zoom component of
//! the view transform is folded into item coordinates by
//! [`crate::canvas::Canvas::scale`], which keeps `zoom` here as the
//! cumulative factor.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Scroll region covering an empty canvas.
pub const DEFAULT_SCROLL_REGION: Rect = Rect::new(0.0, 0.0, 1600.0, 1200.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Cumulative zoom factor. Always strictly positive.
    pub zoom: f64,
    /// Visible fraction range of the scroll region, horizontally.
    pub viewport_x: (f64, f64),
    /// Visible fraction range of the scroll region, vertically.
    pub viewport_y: (f64, f64),
    /// Logical extent the viewport fractions refer to.
    pub scroll_region: Rect,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            viewport_x: (0.0, 1.0),
            viewport_y: (0.0, 1.0),
            scroll_region: DEFAULT_SCROLL_REGION,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert device coordinates to logical canvas coordinates by undoing
    /// the current viewport offset.
    pub fn to_logical(&self, device_x: f64, device_y: f64) -> Point {
        Point::new(
            self.scroll_region.x0 + self.viewport_x.0 * self.scroll_region.width() + device_x,
            self.scroll_region.y0 + self.viewport_y.0 * self.scroll_region.height() + device_y,
        )
    }

    /// Convert a logical point back to device coordinates.
    pub fn to_device(&self, logical: Point) -> Point {
        Point::new(
            logical.x - self.scroll_region.x0 - self.viewport_x.0 * self.scroll_region.width(),
            logical.y - self.scroll_region.y0 - self.viewport_y.0 * self.scroll_region.height(),
        )
    }

    /// The logical rectangle currently visible.
    pub fn visible_rect(&self) -> Rect {
        let w = self.scroll_region.width();
        let h = self.scroll_region.height();
        Rect::new(
            self.scroll_region.x0 + self.viewport_x.0 * w,
            self.scroll_region.y0 + self.viewport_y.0 * h,
            self.scroll_region.x0 + self.viewport_x.1 * w,
            self.scroll_region.y0 + self.viewport_y.1 * h,
        )
    }

    /// Center of the visible viewport in logical space (paste anchor).
    pub fn visible_center(&self) -> Point {
        self.visible_rect().center()
    }

    /// Scroll so the visible window starts at the given fractions,
    /// preserving the window span and clamping to `[0, 1]`.
    pub fn scroll_to(&mut self, x_fraction: f64, y_fraction: f64) {
        let span_x = self.viewport_x.1 - self.viewport_x.0;
        let span_y = self.viewport_y.1 - self.viewport_y.0;
        let x0 = x_fraction.clamp(0.0, (1.0 - span_x).max(0.0));
        let y0 = y_fraction.clamp(0.0, (1.0 - span_y).max(0.0));
        self.viewport_x = (x0, x0 + span_x);
        self.viewport_y = (y0, y0 + span_y);
    }

    /// Restore viewport fraction ranges verbatim (document load path).
    pub fn set_viewport(&mut self, x: (f64, f64), y: (f64, f64)) {
        self.viewport_x = x;
        self.viewport_y = y;
    }

    /// Multiply the stored zoom. Non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f64) {
        if factor > 0.0 {
            self.zoom *= factor;
        }
    }

    /// Set the zoom absolutely. Non-positive values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    /// Recompute the scroll region from content bounds. The region never
    /// shrinks below the default extent, and the viewport fractions are
    /// re-derived so the view does not jump: the logical point at the device
    /// origin and the visible span both stay fixed.
    pub fn recompute_scroll_region(&mut self, content: Option<Rect>) {
        let origin = self.to_logical(0.0, 0.0);
        let span_x = (self.viewport_x.1 - self.viewport_x.0) * self.scroll_region.width();
        let span_y = (self.viewport_y.1 - self.viewport_y.0) * self.scroll_region.height();

        self.scroll_region = match content {
            Some(b) => DEFAULT_SCROLL_REGION.union(b),
            None => DEFAULT_SCROLL_REGION,
        };

        let w = self.scroll_region.width();
        let h = self.scroll_region.height();
        let x0 = (origin.x - self.scroll_region.x0) / w;
        let y0 = (origin.y - self.scroll_region.y0) / h;
        self.viewport_x = (x0, x0 + span_x / w);
        self.viewport_y = (y0, y0 + span_y / h);
    }
}
