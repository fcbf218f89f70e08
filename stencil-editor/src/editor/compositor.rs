// Placing uploaded images and templates on the canvas.
//
// Placement always clears the canvas first: a new image replaces the sketch
// rather than layering onto it. Callers wanting layering snapshot/restore.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use stencil_core::{Rect, Size};
use tracing::debug;

use crate::Canvas;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceMode {
    /// Shrink (never enlarge) to fit within the fit ratio of the surface,
    /// keeping the aspect ratio, then centre.
    #[default]
    CenterFit,
    /// Natural size, centred. May be cropped by the surface edges.
    CenterOriginal,
}

/// Size an image of `image` dimensions is drawn at on `surface` in
/// center-fit mode. Never exceeds `fit_ratio` of either surface dimension.
pub fn fit_size(image: Size, surface: Size, fit_ratio: f32) -> Size {
    if image.is_empty() {
        return image;
    }
    let max_w = surface.width as f32 * fit_ratio;
    let max_h = surface.height as f32 * fit_ratio;
    let scale = (max_w / image.width as f32)
        .min(max_h / image.height as f32)
        .min(1.0);
    if scale >= 1.0 {
        return image;
    }
    Size::new(
        ((image.width as f32 * scale).floor() as u32).max(1),
        ((image.height as f32 * scale).floor() as u32).max(1),
    )
}

/// Clear `canvas` and draw `image` according to `mode`. Returns the rectangle
/// the image occupies in canvas space (possibly partly off-canvas).
pub fn place_image(canvas: &mut Canvas, image: &RgbaImage, mode: PlaceMode, fit_ratio: f32) -> Rect {
    let natural = Size::new(image.width(), image.height());
    let target = match mode {
        PlaceMode::CenterFit => fit_size(natural, canvas.size(), fit_ratio),
        PlaceMode::CenterOriginal => natural,
    };
    let rect = Rect::centered(target, canvas.size());

    canvas.clear();
    if target == natural {
        canvas.draw_image(image, rect.x, rect.y);
    } else {
        let resized = imageops::resize(image, target.width, target.height, FilterType::Triangle);
        canvas.draw_image(&resized, rect.x, rect.y);
    }

    debug!(
        ?mode,
        natural = ?natural,
        placed = ?rect,
        "image placed"
    );
    rect
}
