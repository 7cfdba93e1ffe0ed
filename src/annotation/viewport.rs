//! Visible region of the annotated slice
//!
//! Coordinates are slice pixels. The framing at volume load is kept so a
//! reset can always return to it no matter how far the operator zoomed.

/// Zoom step applied per scroll notch
pub const ZOOM_STEP: f64 = 1.2;

/// Narrowest view, in slice pixels, that zooming in may reach
pub const MIN_VIEW_SIZE: f64 = 1.0;

/// Axis-aligned view rectangle in slice coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewRect {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Current and initial framing of the slice view
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    initial: ViewRect,
    current: ViewRect,
}

impl Viewport {
    /// Framing that shows a whole `width` x `height` slice
    pub fn new(width: usize, height: usize) -> Self {
        let initial = ViewRect {
            x_min: 0.0,
            x_max: width as f64,
            y_min: 0.0,
            y_max: height as f64,
        };
        Viewport { initial, current: initial }
    }

    pub fn current(&self) -> ViewRect {
        self.current
    }

    pub fn initial(&self) -> ViewRect {
        self.initial
    }

    /// Zooms around the cursor
    ///
    /// Positive `delta` zooms in by `ZOOM_STEP`, negative zooms out; the
    /// point under the cursor stays where it is. Zooming in stops once
    /// either side would drop below `MIN_VIEW_SIZE`.
    pub fn zoom(&mut self, delta: i32, anchor_x: f64, anchor_y: f64) {
        if delta == 0 || !anchor_x.is_finite() || !anchor_y.is_finite() {
            return;
        }
        let scale = if delta > 0 { 1.0 / ZOOM_STEP } else { ZOOM_STEP };
        let view = self.current;

        let new_width = view.width() * scale;
        let new_height = view.height() * scale;
        if delta > 0 && (new_width < MIN_VIEW_SIZE || new_height < MIN_VIEW_SIZE) {
            return;
        }
        let rel_x = (anchor_x - view.x_min) / view.width();
        let rel_y = (anchor_y - view.y_min) / view.height();

        self.current = ViewRect {
            x_min: anchor_x - new_width * rel_x,
            x_max: anchor_x + new_width * (1.0 - rel_x),
            y_min: anchor_y - new_height * rel_y,
            y_max: anchor_y + new_height * (1.0 - rel_y),
        };
    }

    /// Returns to the framing captured at load
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn is_reset(&self) -> bool {
        self.current == self.initial
    }

    /// Integer pixel window `(x0, y0, x1, y1)` of the current view, clipped
    /// to the slice; `None` when nothing of the slice is visible
    pub fn pixel_window(&self, width: usize, height: usize) -> Option<(u32, u32, u32, u32)> {
        let clip = |v: f64, max: usize| v.max(0.0).min(max as f64);
        let x0 = clip(self.current.x_min.floor(), width) as u32;
        let x1 = clip(self.current.x_max.ceil(), width) as u32;
        let y0 = clip(self.current.y_min.floor(), height) as u32;
        let y1 = clip(self.current.y_max.ceil(), height) as u32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new(120, 60);
        viewport.zoom(1, 30.0, 15.0);

        let view = viewport.current();
        assert!((view.width() - 100.0).abs() < 1e-9);
        assert!((view.height() - 50.0).abs() < 1e-9);
        // Anchor keeps its relative position (1/4 across, 1/4 down)
        assert!(((30.0 - view.x_min) / view.width() - 0.25).abs() < 1e-9);
        assert!(((15.0 - view.y_min) / view.height() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn zoom_out_then_reset() {
        let mut viewport = Viewport::new(100, 100);
        viewport.zoom(-1, 50.0, 50.0);
        assert!((viewport.current().width() - 120.0).abs() < 1e-9);
        assert!(!viewport.is_reset());

        viewport.reset();
        assert!(viewport.is_reset());
        assert_eq!(viewport.current(), viewport.initial());
    }

    #[test]
    fn zooming_in_stops_at_minimum_size() {
        let mut viewport = Viewport::new(100, 100);
        for _ in 0..200 {
            viewport.zoom(1, 37.0, 61.0);
        }

        let view = viewport.current();
        assert!(view.width() >= MIN_VIEW_SIZE && view.width() < MIN_VIEW_SIZE * ZOOM_STEP);
        assert!(view.x_min.is_finite() && view.y_max.is_finite());
        assert!(view.x_min <= 37.0 && 37.0 <= view.x_max);

        viewport.zoom(-1, 37.0, 61.0);
        assert!(view.width() < viewport.current().width());
    }

    #[test]
    fn pixel_window_is_clipped() {
        let mut viewport = Viewport::new(100, 80);
        assert_eq!(viewport.pixel_window(100, 80), Some((0, 0, 100, 80)));

        viewport.zoom(-1, 0.0, 0.0);
        assert_eq!(viewport.pixel_window(100, 80), Some((0, 0, 100, 80)));

        viewport.zoom(1, 0.0, 0.0);
        viewport.zoom(1, 0.0, 0.0);
        let (x0, y0, x1, y1) = viewport.pixel_window(100, 80).unwrap();
        assert_eq!((x0, y0), (0, 0));
        assert!(x1 < 100 && y1 < 80);
    }
}
