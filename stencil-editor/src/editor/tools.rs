// Drawing tools for the canvas editor.

use crate::Canvas;
use egui::Color32;
use serde::{Deserialize, Serialize};
use stencil_core::Point;
use tracing::trace;

/// How a stroke's colour lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// Source-over, so translucent colours tint what is underneath.
    Blend,
    /// Overwrite the pixel outright.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
    pub mode: PaintMode,
}

pub trait Tool {
    fn style(&self) -> StrokeStyle;

    fn name(&self) -> &str;

    /// Rasterize one segment of a stroke.
    fn apply(&self, canvas: &mut Canvas, from: Point, to: Point) {
        stroke_segment(canvas, from, to, &self.style());
    }

    fn cursor_size(&self) -> u32 {
        self.style().width.round().max(1.0) as u32
    }
}

/// Which tool the pointer currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Brush,
    Eraser,
}

#[derive(Debug, Clone)]
pub struct Brush {
    pub size: u32,
    pub color: Color32,
}

impl Brush {
    pub fn new(size: u32, color: Color32) -> Self {
        Self { size, color }
    }
}

impl Tool for Brush {
    fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color,
            width: self.size as f32,
            mode: PaintMode::Blend,
        }
    }

    fn name(&self) -> &str {
        "Brush"
    }
}

#[derive(Debug, Clone)]
pub struct Eraser {
    pub size: u32,
    pub erase_color: Color32,
}

impl Eraser {
    /// Eraser that paints `erase_color`, normally the canvas background.
    pub fn new(size: u32, erase_color: Color32) -> Self {
        Self { size, erase_color }
    }
}

impl Tool for Eraser {
    fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.erase_color,
            width: self.size as f32,
            mode: PaintMode::Replace,
        }
    }

    fn name(&self) -> &str {
        "Eraser"
    }
}

/// Draw the segment `from..to` with round caps: every pixel whose centre is
/// within `width / 2` of the segment is painted. A zero-length segment
/// paints a dot. Returns the number of pixels touched.
pub fn stroke_segment(canvas: &mut Canvas, from: Point, to: Point, style: &StrokeStyle) -> usize {
    let radius = (style.width / 2.0).max(0.5);

    let min_x = (from.x.min(to.x) - radius).floor().max(0.0) as i64;
    let min_y = (from.y.min(to.y) - radius).floor().max(0.0) as i64;
    let max_x = ((from.x.max(to.x) + radius).ceil() as i64).min(canvas.width as i64 - 1);
    let max_y = ((from.y.max(to.y) + radius).ceil() as i64).min(canvas.height as i64 - 1);

    let mut touched = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            if center.distance_to_segment(from, to) > radius {
                continue;
            }
            match style.mode {
                PaintMode::Blend => canvas.blend_pixel(x as i32, y as i32, style.color),
                PaintMode::Replace => {
                    canvas.set_pixel(x as u32, y as u32, style.color);
                }
            }
            touched += 1;
        }
    }

    trace!(
        from = ?from,
        to = ?to,
        width = style.width,
        touched,
        "stroke segment"
    );
    touched
}
