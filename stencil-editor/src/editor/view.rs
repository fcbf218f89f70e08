// Display zoom for the canvas. Purely visual: the bitmap keeps its resolution,
// only the size it is shown at and the mapping of pointer input change.

use crate::config::ZoomConfig;
use egui::Vec2;
use stencil_core::{Point, Size};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    limits: ZoomConfig,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl ViewTransform {
    pub fn new(limits: ZoomConfig) -> Self {
        let zoom = limits.initial.clamp(limits.min, limits.max);
        Self { zoom, limits }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Zoom in by one step. Returns false (and changes nothing) at the max.
    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + self.limits.step)
    }

    /// Zoom out by one step. Returns false (and changes nothing) at the min.
    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - self.limits.step)
    }

    /// Set the zoom, clamped to the configured range. Returns whether it
    /// changed. Non-finite values are rejected.
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        if !zoom.is_finite() {
            debug!(zoom, "ignoring non-finite zoom");
            return false;
        }
        let clamped = zoom.clamp(self.limits.min, self.limits.max);
        if (clamped - self.zoom).abs() < f32::EPSILON {
            return false;
        }
        debug!(from = self.zoom, to = clamped, "zoom changed");
        self.zoom = clamped;
        true
    }

    pub fn reset(&mut self) {
        self.set_zoom(self.limits.initial);
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.limits.max
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > self.limits.min
    }

    /// On-screen size of a surface at the current zoom.
    pub fn display_size(&self, surface: Size) -> Vec2 {
        Vec2::new(surface.width as f32, surface.height as f32) * self.zoom
    }

    /// Map a point relative to the displayed canvas' top-left corner back to
    /// bitmap coordinates.
    pub fn to_canvas(&self, display: Point) -> Point {
        Point::new(display.x / self.zoom, display.y / self.zoom)
    }

    /// Zoom as a whole percentage, for the toolbar label.
    pub fn percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_steps() {
        let mut view = ViewTransform::default();
        assert_eq!(view.zoom(), 1.0);
        assert!(view.zoom_in());
        assert_eq!(view.zoom(), 1.25);
        assert!(view.zoom_out());
        assert!(view.zoom_out());
        assert_eq!(view.zoom(), 0.75);
        assert_eq!(view.percent(), 75);
    }

    #[test]
    fn test_zoom_clamped_at_bounds() {
        let mut view = ViewTransform::default();
        for _ in 0..20 {
            view.zoom_in();
        }
        assert_eq!(view.zoom(), 3.0);
        assert!(!view.zoom_in());
        assert_eq!(view.zoom(), 3.0);
        assert!(!view.can_zoom_in());

        for _ in 0..20 {
            view.zoom_out();
        }
        assert_eq!(view.zoom(), 0.5);
        assert!(!view.zoom_out());
        assert_eq!(view.zoom(), 0.5);

        view.set_zoom(100.0);
        assert_eq!(view.zoom(), 3.0);
        view.set_zoom(-1.0);
        assert_eq!(view.zoom(), 0.5);
    }

    #[test]
    fn test_non_finite_zoom_is_ignored() {
        let mut view = ViewTransform::default();
        assert!(!view.set_zoom(f32::NAN));
        assert!(!view.set_zoom(f32::INFINITY));
        assert!(!view.set_zoom(f32::NEG_INFINITY));
        assert_eq!(view.zoom(), 1.0);

        assert!(view.zoom_in());
        assert!((0.5..=3.0).contains(&view.zoom()));
        let p = view.to_canvas(Point::new(25.0, 50.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_display_mapping() {
        let mut view = ViewTransform::default();
        view.set_zoom(2.0);
        assert_eq!(view.display_size(Size::new(300, 200)), Vec2::new(600.0, 400.0));
        assert_eq!(view.to_canvas(Point::new(100.0, 50.0)), Point::new(50.0, 25.0));

        view.reset();
        assert_eq!(view.zoom(), 1.0);
    }
}
