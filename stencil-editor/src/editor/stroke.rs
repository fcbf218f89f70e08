// Freehand stroke capture: pointer down/move/up turned into line segments.

use crate::editor::tools::Tool;
use crate::Canvas;
use stencil_core::Point;
use tracing::{debug, trace};

/// Kind of device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

/// What the host should do with the raw input event after the editor saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    /// Host must cancel default handling (touch scrolling) for this event.
    pub prevent_default: bool,
}

#[derive(Debug, Default)]
pub struct DrawingSurface {
    last: Option<Point>,
    segments: usize,
}

impl DrawingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    /// Segments drawn by the active stroke so far.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Start a stroke. Nothing is drawn until the pointer moves.
    pub fn begin_stroke(&mut self, position: Point) {
        trace!(?position, "begin stroke");
        self.last = Some(position);
        self.segments = 0;
    }

    /// Draw from the last position to `position`. Ignored with no active stroke.
    pub fn extend_stroke(&mut self, canvas: &mut Canvas, tool: &dyn Tool, position: Point) -> bool {
        let Some(last) = self.last else {
            return false;
        };

        tool.apply(canvas, last, position);
        self.last = Some(position);
        self.segments += 1;
        true
    }

    /// Finish the stroke. Returns the number of segments it drew, zero when
    /// no stroke was active. Snapshotting is left to the caller.
    pub fn end_stroke(&mut self) -> usize {
        if self.last.take().is_none() {
            return 0;
        }
        let drawn = std::mem::take(&mut self.segments);
        debug!(segments = drawn, "end stroke");
        drawn
    }

    /// Whether the host should suppress default handling for an event of
    /// this kind. Touch scrolling is blocked only while a stroke is live.
    pub fn response_for(&self, kind: PointerKind) -> EventResponse {
        EventResponse {
            prevent_default: kind == PointerKind::Touch && self.is_active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::Brush;
    use egui::Color32;

    #[test]
    fn test_extend_without_begin_is_noop() {
        let mut canvas = Canvas::new(10, 10, Color32::WHITE);
        let brush = Brush::new(3, Color32::BLACK);
        let mut surface = DrawingSurface::new();

        assert!(!surface.extend_stroke(&mut canvas, &brush, Point::new(5.0, 5.0)));
        assert!(canvas.is_blank());
        assert_eq!(surface.end_stroke(), 0);
    }

    #[test]
    fn test_begin_then_end_draws_nothing() {
        let mut surface = DrawingSurface::new();
        surface.begin_stroke(Point::new(5.0, 5.0));
        assert!(surface.is_active());
        assert_eq!(surface.segments(), 0);
        assert_eq!(surface.end_stroke(), 0);
    }

    #[test]
    fn test_stroke_draws_connected_segments() {
        let mut canvas = Canvas::new(20, 20, Color32::WHITE);
        let brush = Brush::new(2, Color32::BLACK);
        let mut surface = DrawingSurface::new();

        surface.begin_stroke(Point::new(2.0, 2.0));
        surface.extend_stroke(&mut canvas, &brush, Point::new(10.0, 2.0));
        surface.extend_stroke(&mut canvas, &brush, Point::new(10.0, 10.0));
        assert_eq!(surface.end_stroke(), 2);
        assert!(!surface.is_active());

        assert_eq!(canvas.get_pixel(6, 1), Some(Color32::BLACK));
        assert_eq!(canvas.get_pixel(9, 6), Some(Color32::BLACK));
        assert_eq!(canvas.get_pixel(15, 15), Some(Color32::WHITE));
    }

    #[test]
    fn test_touch_scroll_suppressed_only_while_drawing() {
        let mut surface = DrawingSurface::new();
        assert!(!surface.response_for(PointerKind::Touch).prevent_default);

        surface.begin_stroke(Point::new(1.0, 1.0));
        assert!(surface.response_for(PointerKind::Touch).prevent_default);
        assert!(!surface.response_for(PointerKind::Mouse).prevent_default);

        surface.end_stroke();
        assert!(!surface.response_for(PointerKind::Touch).prevent_default);
    }
}
