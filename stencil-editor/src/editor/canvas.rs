// Bitmap surface for the sketch editor.
// Every stroke, image and text overlay ends up as pixels in here; undo works on whole copies of it.

use egui::Color32;
use image::RgbaImage;
use stencil_core::color;
use stencil_core::Size;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub background: Color32,
    pub pixels: Vec<Color32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color32) -> Self {
        info!(
            width,
            height,
            background = %color::to_hex(background),
            "creating canvas"
        );

        let pixels = vec![background; Size::new(width, height).area()];

        Self {
            width,
            height,
            background,
            pixels,
        }
    }

    fn is_valid_coordinate(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn coord_to_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    // Get the color of a pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if !self.is_valid_coordinate(x as i32, y as i32) {
            warn!(x, y, "requested pixel outside the canvas");
            return None;
        }

        Some(self.pixels[self.coord_to_index(x, y)])
    }

    // Set the color of a pixel at (x, y)
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color32) -> bool {
        if !self.is_valid_coordinate(x as i32, y as i32) {
            trace!(x, y, "set_pixel outside the canvas ignored");
            return false;
        }

        let index = self.coord_to_index(x, y);
        self.pixels[index] = color;
        true
    }

    /// Source-over `color` at (x, y). Signed so callers can splat shapes that
    /// hang off the edges; out-of-bounds pixels are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color32) {
        if !self.is_valid_coordinate(x, y) {
            return;
        }
        let index = self.coord_to_index(x as u32, y as u32);
        self.pixels[index] = color::source_over(self.pixels[index], color);
    }

    // Fill entire canvas with a color
    pub fn fill(&mut self, color: Color32) {
        debug!(color = %color::to_hex(color), "filling canvas");
        self.pixels.fill(color);
    }

    // Clear canvas back to its background
    pub fn clear(&mut self) {
        debug!("clearing canvas");
        self.fill(self.background);
    }

    /// True when every pixel still holds the background colour.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == self.background)
    }

    /// Copy the pixels of another canvas of the same dimensions into this one.
    pub fn restore_from(&mut self, other: &Canvas) {
        if other.size() != self.size() {
            warn!(
                expected = ?self.size(),
                got = ?other.size(),
                "refusing to restore a canvas of a different size"
            );
            return;
        }
        self.pixels.copy_from_slice(&other.pixels);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Unpremultiplied RGBA copy for encoders.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut raw = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            raw.extend_from_slice(&pixel.to_srgba_unmultiplied());
        }
        // The buffer length is width * height * 4 by construction.
        RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Draw an RGBA image with its top-left corner at (x, y), source-over.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        trace!(x, y, w = image.width(), h = image.height(), "drawing image");
        for (ix, iy, px) in image.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            if a == 0 {
                continue;
            }
            let src = if a == 255 {
                Color32::from_rgb(r, g, b)
            } else {
                Color32::from_rgba_unmultiplied(r, g, b, a)
            };
            self.blend_pixel(x + ix as i32, y + iy as i32, src);
        }
    }
}

// Create a default canvas
impl Default for Canvas {
    fn default() -> Self {
        Canvas::new(600, 600, Color32::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_new_canvas_is_blank() {
        let canvas = Canvas::new(4, 3, Color32::WHITE);
        assert_eq!(canvas.pixels.len(), 12);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut canvas = Canvas::new(4, 4, Color32::WHITE);
        assert_eq!(canvas.get_pixel(4, 0), None);
        assert!(!canvas.set_pixel(0, 4, Color32::BLACK));
        canvas.blend_pixel(-1, 2, Color32::BLACK);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_clear_restores_background() {
        let mut canvas = Canvas::new(4, 4, Color32::LIGHT_GRAY);
        canvas.set_pixel(1, 1, Color32::BLACK);
        assert!(!canvas.is_blank());
        canvas.clear();
        assert!(canvas.is_blank());
        assert_eq!(canvas.get_pixel(1, 1), Some(Color32::LIGHT_GRAY));
    }

    #[test]
    fn test_restore_from_requires_same_size() {
        let mut canvas = Canvas::new(4, 4, Color32::WHITE);
        let mut other = Canvas::new(4, 4, Color32::WHITE);
        other.set_pixel(2, 2, Color32::RED);
        canvas.restore_from(&other);
        assert_eq!(canvas, other);

        let small = Canvas::new(2, 2, Color32::BLACK);
        canvas.restore_from(&small);
        assert_eq!(canvas.get_pixel(0, 0), Some(Color32::WHITE));
    }

    #[test]
    fn test_draw_image_skips_transparent_and_clips() {
        let mut canvas = Canvas::new(4, 4, Color32::WHITE);
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 255, 255]));

        canvas.draw_image(&img, 3, 3);
        assert_eq!(canvas.get_pixel(3, 3), Some(Color32::from_rgb(255, 0, 0)));

        canvas.draw_image(&img, 0, 0);
        assert_eq!(canvas.get_pixel(1, 0), Some(Color32::WHITE));
        assert_eq!(canvas.get_pixel(1, 1), Some(Color32::from_rgb(0, 0, 255)));
    }

    #[test]
    fn test_rgba_export_is_unmultiplied() {
        let mut canvas = Canvas::new(2, 1, Color32::WHITE);
        canvas.set_pixel(1, 0, Color32::from_rgb(10, 20, 30));
        let img = canvas.to_rgba_image();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [10, 20, 30, 255]);
    }
}
