// Text overlays: lettering laid out with ab_glyph, rasterized into a coverage
// mask, then stamped onto the canvas around its centre.

use std::collections::BTreeMap;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use egui::Color32;
use serde::{Deserialize, Serialize};
use stencil_core::{color, Point, Rect};
use tracing::{debug, trace};

use crate::editor::error::CompositeError;
use crate::Canvas;

/// Horizontal shear applied for synthetic italics.
const ITALIC_SHEAR: f32 = 0.2;

/// Fonts the editor may letter with, keyed by case-insensitive family name.
#[derive(Clone, Default)]
pub struct FontBook {
    fonts: BTreeMap<String, FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: &str, font: FontArc) {
        debug!(family, "font registered");
        self.fonts.insert(family.to_lowercase(), font);
    }

    /// Register raw TTF/OTF bytes under `family`.
    pub fn load_bytes(&mut self, family: &str, data: Vec<u8>) -> Result<(), CompositeError> {
        let font = FontArc::try_from_vec(data).map_err(|_| CompositeError::InvalidFont {
            family: family.to_string(),
        })?;
        self.insert(family, font);
        Ok(())
    }

    pub fn get(&self, family: &str) -> Result<&FontArc, CompositeError> {
        self.fonts
            .get(&family.to_lowercase())
            .ok_or_else(|| CompositeError::UnknownFont(family.to_string()))
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub family: String,
    #[serde(with = "color::hex")]
    pub color: Color32,
    /// Pixel height of the em square.
    pub size: f32,
    #[serde(default)]
    pub rotation_deg: f32,
    /// Extra pixels after every character but the last on a line.
    #[serde(default)]
    pub letter_spacing: f32,
    /// Line advance as a multiple of `size`.
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub weight: FontWeight,
    #[serde(default)]
    pub italic: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_line_height() -> f32 {
    1.2
}

fn default_opacity() -> f32 {
    1.0
}

impl TextStyle {
    pub fn new(family: impl Into<String>, color: Color32, size: f32) -> Self {
        Self {
            family: family.into(),
            color,
            size,
            rotation_deg: 0.0,
            letter_spacing: 0.0,
            line_height: default_line_height(),
            align: TextAlign::default(),
            weight: FontWeight::default(),
            italic: false,
            opacity: default_opacity(),
        }
    }
}

/// Glyph coverage in text-local space. `origin` is the local position of
/// the mask's top-left pixel; local (0, 0) is the anchor.
#[derive(Debug, Clone)]
pub struct CoverageMask {
    pub width: u32,
    pub height: u32,
    pub origin: Point,
    pub data: Vec<f32>,
}

impl CoverageMask {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            origin: Point::default(),
            data: Vec::new(),
        }
    }

    fn sample(&self, local: Point) -> f32 {
        let mx = (local.x - self.origin.x).floor();
        let my = (local.y - self.origin.y).floor();
        if mx < 0.0 || my < 0.0 || mx >= self.width as f32 || my >= self.height as f32 {
            return 0.0;
        }
        self.data[my as usize * self.width as usize + mx as usize]
    }

    fn accumulate(&mut self, x: i64, y: i64, coverage: f32) {
        let mx = x - self.origin.x as i64;
        let my = y - self.origin.y as i64;
        if mx < 0 || my < 0 || mx >= self.width as i64 || my >= self.height as i64 {
            return;
        }
        let cell = &mut self.data[my as usize * self.width as usize + mx as usize];
        *cell = cell.max(coverage);
    }
}

/// Region of text-local space worth rasterizing. Coverage outside it is
/// never allocated, so oversized lettering costs no more than the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalClip {
    pub min: Point,
    pub max: Point,
}

impl LocalClip {
    fn intersects(&self, min: Point, max: Point) -> bool {
        min.x < self.max.x && max.x > self.min.x && min.y < self.max.y && max.y > self.min.y
    }
}

fn line_width(font: &FontArc, scale: PxScale, line: &str, letter_spacing: f32) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for (i, ch) in line.chars().enumerate() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        if i > 0 {
            width += letter_spacing;
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Left edge of a line of `width` relative to the anchor.
pub fn line_start(align: TextAlign, width: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -width / 2.0,
        TextAlign::Right => -width,
    }
}

/// Baselines (relative to the anchor) for `lines` lines so the block's
/// ascent-to-descent extent is vertically centred.
pub fn baselines(lines: usize, ascent: f32, descent: f32, advance: f32) -> Vec<f32> {
    if lines == 0 {
        return Vec::new();
    }
    let block = (lines - 1) as f32 * advance + (ascent - descent);
    let top = -block / 2.0;
    (0..lines).map(|i| top + ascent + i as f32 * advance).collect()
}

/// Lay out `text` around the origin and rasterize it to a coverage mask,
/// restricted to `clip` when given.
pub fn layout(font: &FontArc, text: &str, style: &TextStyle, clip: Option<LocalClip>) -> CoverageMask {
    let scale = PxScale::from(style.size.max(1.0));
    let scaled = font.as_scaled(scale);
    let lines: Vec<&str> = text.lines().collect();
    let rows = baselines(
        lines.len(),
        scaled.ascent(),
        scaled.descent(),
        style.size * style.line_height,
    );

    let mut outlines = Vec::new();
    for (line, baseline) in lines.iter().zip(rows) {
        let width = line_width(font, scale, line, style.letter_spacing);
        let mut x = line_start(style.align, width);
        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                x += scaled.kern(prev, id) + style.letter_spacing;
            }
            let glyph = id.with_scale_and_position(scale, point(x, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let b = outlined.px_bounds();
                let visible = match clip {
                    Some(c) => c.intersects(Point::new(b.min.x, b.min.y), Point::new(b.max.x + 1.0, b.max.y)),
                    None => true,
                };
                if visible {
                    outlines.push(outlined);
                }
            }
            x += scaled.h_advance(id);
            prev = Some(id);
        }
    }

    if outlines.is_empty() {
        return CoverageMask::empty();
    }

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for outlined in &outlines {
        let b = outlined.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if let Some(clip) = clip {
        min_x = min_x.max(clip.min.x);
        min_y = min_y.max(clip.min.y);
        max_x = max_x.min(clip.max.x);
        max_y = max_y.min(clip.max.y);
    }
    if max_x <= min_x || max_y <= min_y {
        return CoverageMask::empty();
    }

    // One spare column for synthetic bold.
    let bold = style.weight == FontWeight::Bold;
    let origin = Point::new(min_x.floor(), min_y.floor());
    let width = (max_x.ceil() - origin.x) as u32 + u32::from(bold);
    let height = (max_y.ceil() - origin.y) as u32;
    let mut mask = CoverageMask {
        width,
        height,
        origin,
        data: vec![0.0; width as usize * height as usize],
    };

    for outlined in &outlines {
        let b = outlined.px_bounds();
        let (gx, gy) = (b.min.x as i64, b.min.y as i64);
        outlined.draw(|x, y, c| {
            let (px, py) = (gx + x as i64, gy + y as i64);
            mask.accumulate(px, py, c);
            if bold {
                mask.accumulate(px + 1, py, c);
            }
        });
    }

    trace!(width, height, lines = lines.len(), "text laid out");
    mask
}

/// Affine map from text-local space to canvas space: shear, rotate, then
/// translate to the anchor.
#[derive(Debug, Clone, Copy)]
struct Placement {
    anchor: Point,
    sin: f32,
    cos: f32,
    shear: f32,
}

impl Placement {
    fn forward(&self, p: Point) -> Point {
        let sx = p.x - self.shear * p.y;
        Point::new(
            self.anchor.x + sx * self.cos - p.y * self.sin,
            self.anchor.y + sx * self.sin + p.y * self.cos,
        )
    }

    fn inverse(&self, p: Point) -> Point {
        let dx = p.x - self.anchor.x;
        let dy = p.y - self.anchor.y;
        let rx = dx * self.cos + dy * self.sin;
        let ry = -dx * self.sin + dy * self.cos;
        Point::new(rx + self.shear * ry, ry)
    }
}

/// The canvas rectangle pulled back into text-local space, padded a pixel.
fn canvas_clip(placement: &Placement, canvas: &Canvas) -> LocalClip {
    let (w, h) = (canvas.width as f32, canvas.height as f32);
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(0.0, h),
        Point::new(w, h),
    ]
    .map(|p| placement.inverse(p));
    let min_x = corners.iter().map(|p| p.x).fold(f32::MAX, f32::min);
    let min_y = corners.iter().map(|p| p.y).fold(f32::MAX, f32::min);
    let max_x = corners.iter().map(|p| p.x).fold(f32::MIN, f32::max);
    let max_y = corners.iter().map(|p| p.y).fold(f32::MIN, f32::max);
    LocalClip {
        min: Point::new(min_x.floor() - 1.0, min_y.floor() - 1.0),
        max: Point::new(max_x.ceil() + 1.0, max_y.ceil() + 1.0),
    }
}

/// Render `text` centred on the canvas. Returns the canvas-space bounds of
/// the stamped mask, or `None` when nothing had ink (all whitespace glyphs).
pub fn draw_text(canvas: &mut Canvas, font: &FontArc, text: &str, style: &TextStyle) -> Option<Rect> {
    let theta = style.rotation_deg.to_radians();
    let placement = Placement {
        anchor: canvas.size().center(),
        sin: theta.sin(),
        cos: theta.cos(),
        shear: if style.italic { ITALIC_SHEAR } else { 0.0 },
    };

    let mask = layout(font, text, style, Some(canvas_clip(&placement, canvas)));
    if mask.width == 0 || mask.height == 0 {
        return None;
    }

    let (ox, oy) = (mask.origin.x, mask.origin.y);
    let (w, h) = (mask.width as f32, mask.height as f32);
    let corners = [
        placement.forward(Point::new(ox, oy)),
        placement.forward(Point::new(ox + w, oy)),
        placement.forward(Point::new(ox, oy + h)),
        placement.forward(Point::new(ox + w, oy + h)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f32::MAX, f32::min).floor();
    let min_y = corners.iter().map(|p| p.y).fold(f32::MAX, f32::min).floor();
    let max_x = corners.iter().map(|p| p.x).fold(f32::MIN, f32::max).ceil();
    let max_y = corners.iter().map(|p| p.y).fold(f32::MIN, f32::max).ceil();

    let ink = color::scale(style.color, style.opacity);
    let x0 = (min_x as i64).max(0);
    let y0 = (min_y as i64).max(0);
    let x1 = (max_x as i64).min(canvas.width as i64);
    let y1 = (max_y as i64).min(canvas.height as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            let local = placement.inverse(Point::new(x as f32 + 0.5, y as f32 + 0.5));
            let coverage = mask.sample(local);
            if coverage > 0.0 {
                canvas.blend_pixel(x as i32, y as i32, color::scale(ink, coverage));
            }
        }
    }

    let bounds = Rect::new(
        min_x as i32,
        min_y as i32,
        (max_x - min_x) as u32,
        (max_y - min_y) as u32,
    );
    debug!(?bounds, rotation = style.rotation_deg, "text placed");
    Some(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dejavu() -> FontArc {
        FontArc::try_from_slice(include_bytes!("../../tests/fixtures/DejaVuSans.ttf")).unwrap()
    }

    fn ink_bounds(canvas: &Canvas) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..canvas.height {
            for x in 0..canvas.width {
                if canvas.get_pixel(x, y) != Some(canvas.background) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
                    });
                }
            }
        }
        bounds
    }

    #[test]
    fn test_line_start_by_alignment() {
        assert_eq!(line_start(TextAlign::Left, 80.0), 0.0);
        assert_eq!(line_start(TextAlign::Center, 80.0), -40.0);
        assert_eq!(line_start(TextAlign::Right, 80.0), -80.0);
    }

    #[test]
    fn test_baselines_center_the_block() {
        assert!(baselines(0, 10.0, -2.0, 14.0).is_empty());

        // Single line: ascent 10, descent -2 -> block of 12 centred on 0.
        assert_eq!(baselines(1, 10.0, -2.0, 14.0), vec![4.0]);

        // Two lines: block of 26, top at -13.
        assert_eq!(baselines(2, 10.0, -2.0, 14.0), vec![-3.0, 11.0]);
    }

    #[test]
    fn test_placement_inverse_undoes_forward() {
        let placement = Placement {
            anchor: Point::new(50.0, 40.0),
            sin: 0.5_f32,
            cos: 0.75_f32.sqrt(),
            shear: ITALIC_SHEAR,
        };
        let p = Point::new(-12.0, 7.5);
        let back = placement.inverse(placement.forward(p));
        assert!((back.x - p.x).abs() < 1e-3 && (back.y - p.y).abs() < 1e-3);
    }

    #[test]
    fn test_font_book_lookup() {
        let mut book = FontBook::new();
        assert!(matches!(book.get("Arial"), Err(CompositeError::UnknownFont(_))));
        assert!(matches!(
            book.load_bytes("Broken", vec![1, 2, 3]),
            Err(CompositeError::InvalidFont { .. })
        ));
        assert!(book.is_empty());

        book.insert("DejaVu Sans", dejavu());
        assert!(book.get("dejavu sans").is_ok());
        assert_eq!(book.families().collect::<Vec<_>>(), vec!["dejavu sans"]);
    }

    #[test]
    fn test_text_is_centered() {
        let font = dejavu();
        let mut canvas = Canvas::new(200, 100, Color32::WHITE);
        let style = TextStyle::new("sans", Color32::BLACK, 32.0);

        let bounds = draw_text(&mut canvas, &font, "HOH", &style).unwrap();
        assert!(bounds.width > 0 && bounds.height > 0);

        let (x0, y0, x1, y1) = ink_bounds(&canvas).unwrap();
        let cx = (x0 + x1) as f32 / 2.0;
        let cy = (y0 + y1) as f32 / 2.0;
        assert!((cx - 100.0).abs() <= 3.0, "horizontal centre {cx}");
        assert!((cy - 50.0).abs() <= 8.0, "vertical centre {cy}");
    }

    #[test]
    fn test_rotation_keeps_anchor() {
        let font = dejavu();
        let mut canvas = Canvas::new(200, 200, Color32::WHITE);
        let mut style = TextStyle::new("sans", Color32::BLACK, 24.0);
        style.rotation_deg = 90.0;

        draw_text(&mut canvas, &font, "IIIIIIII", &style).unwrap();
        let (x0, y0, x1, y1) = ink_bounds(&canvas).unwrap();
        // A long horizontal run turned on its side is taller than wide.
        assert!(y1 - y0 > x1 - x0);
        assert!(((x0 + x1) as f32 / 2.0 - 100.0).abs() <= 8.0);
        assert!(((y0 + y1) as f32 / 2.0 - 100.0).abs() <= 4.0);
    }

    #[test]
    fn test_opacity_and_bold() {
        let font = dejavu();
        let mut faint = Canvas::new(200, 100, Color32::WHITE);
        let mut style = TextStyle::new("sans", Color32::BLACK, 40.0);
        style.opacity = 0.25;
        draw_text(&mut faint, &font, "I", &style);
        let darkest = faint.pixels.iter().map(|p| p.r()).min().unwrap();
        assert!(darkest >= 180, "opacity 0.25 should stay light, got {darkest}");

        let mut regular = Canvas::new(200, 100, Color32::WHITE);
        let mut bold = Canvas::new(200, 100, Color32::WHITE);
        let mut style = TextStyle::new("sans", Color32::BLACK, 40.0);
        draw_text(&mut regular, &font, "I", &style);
        style.weight = FontWeight::Bold;
        draw_text(&mut bold, &font, "I", &style);
        let inked = |c: &Canvas| c.pixels.iter().filter(|p| p.r() < 128).count();
        assert!(inked(&bold) > inked(&regular));
    }

    #[test]
    fn test_whitespace_has_no_ink() {
        let font = dejavu();
        let mut canvas = Canvas::new(50, 50, Color32::WHITE);
        let style = TextStyle::new("sans", Color32::BLACK, 20.0);
        assert!(draw_text(&mut canvas, &font, "   ", &style).is_none());
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_letter_spacing_widens_the_line() {
        let font = dejavu();
        let mut tight = Canvas::new(300, 100, Color32::WHITE);
        let mut loose = Canvas::new(300, 100, Color32::WHITE);
        let mut style = TextStyle::new("sans", Color32::BLACK, 32.0);
        draw_text(&mut tight, &font, "HHH", &style).unwrap();
        style.letter_spacing = 10.0;
        draw_text(&mut loose, &font, "HHH", &style).unwrap();

        let (a0, _, a1, _) = ink_bounds(&tight).unwrap();
        let (b0, _, b1, _) = ink_bounds(&loose).unwrap();
        // Two gaps of 10px each.
        let grown = (b1 - b0) as i32 - (a1 - a0) as i32;
        assert!((grown - 20).abs() <= 2, "grew by {grown}");
    }

    #[test]
    fn test_line_height_spreads_lines() {
        let font = dejavu();
        let mut single = Canvas::new(200, 300, Color32::WHITE);
        let mut normal = Canvas::new(200, 300, Color32::WHITE);
        let mut spread = Canvas::new(200, 300, Color32::WHITE);
        let mut style = TextStyle::new("sans", Color32::BLACK, 40.0);
        draw_text(&mut single, &font, "H", &style).unwrap();
        draw_text(&mut normal, &font, "H\nH", &style).unwrap();
        style.line_height = 2.0;
        draw_text(&mut spread, &font, "H\nH", &style).unwrap();

        let height = |c: &Canvas| {
            let (_, y0, _, y1) = ink_bounds(c).unwrap();
            (y1 - y0) as i32
        };
        // Second line sits one advance (size * line_height) below the first.
        assert!((height(&normal) - height(&single) - 48).abs() <= 2);
        assert!((height(&spread) - height(&normal) - 32).abs() <= 2);

        // The two-line block stays centred on the canvas.
        let (_, y0, _, y1) = ink_bounds(&spread).unwrap();
        assert!(((y0 + y1) as f32 / 2.0 - 150.0).abs() <= 8.0);
    }

    #[test]
    fn test_alignment_relative_to_anchor() {
        let font = dejavu();
        let mut style = TextStyle::new("sans", Color32::BLACK, 32.0);

        style.align = TextAlign::Left;
        let mut left = Canvas::new(200, 200, Color32::WHITE);
        draw_text(&mut left, &font, "HHH\nH", &style).unwrap();
        let (x0, _, x1, _) = ink_bounds(&left).unwrap();
        assert!((100..=106).contains(&x0), "left edge {x0}");
        assert!(x1 > 130);

        style.align = TextAlign::Right;
        let mut right = Canvas::new(200, 200, Color32::WHITE);
        draw_text(&mut right, &font, "HHH\nH", &style).unwrap();
        let (x0, _, x1, _) = ink_bounds(&right).unwrap();
        assert!((94..=100).contains(&x1), "right edge {x1}");
        assert!(x0 < 70);
    }

    #[test]
    fn test_oversized_text_is_clipped_to_canvas() {
        let font = dejavu();
        let style = TextStyle::new("sans", Color32::BLACK, 2000.0);
        let clip = LocalClip {
            min: Point::new(-51.0, -51.0),
            max: Point::new(51.0, 51.0),
        };
        let mask = layout(&font, "WWWWWWWWWW", &style, Some(clip));
        assert!(mask.width <= 103 && mask.height <= 103, "{}x{}", mask.width, mask.height);

        // The middle stem of "IIIII" covers the whole canvas.
        let mut canvas = Canvas::new(100, 100, Color32::WHITE);
        let bounds = draw_text(&mut canvas, &font, "IIIII", &style).unwrap();
        assert!(bounds.width <= 104 && bounds.height <= 104);
        assert!(canvas.get_pixel(50, 50).unwrap().r() < 10);
    }

    #[test]
    fn test_text_outside_clip_has_no_mask() {
        let font = dejavu();
        let style = TextStyle::new("sans", Color32::BLACK, 20.0);
        let clip = LocalClip {
            min: Point::new(500.0, 500.0),
            max: Point::new(600.0, 600.0),
        };
        let mask = layout(&font, "ink", &style, Some(clip));
        assert_eq!((mask.width, mask.height), (0, 0));
    }
}
