// PNG export of the canvas.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::ImageFormat;
use tracing::info;

use crate::editor::error::ExportError;
use crate::Canvas;

/// Lossless PNG encoding of the canvas (straight alpha).
pub fn encode_png(canvas: &Canvas) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    canvas.to_rgba_image().write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// `{prefix}-{unix millis}.png`
pub fn export_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.png", prefix, at.timestamp_millis())
}

/// Encode and write the canvas into `dir`, creating it if needed.
pub fn write_png(canvas: &Canvas, dir: &Path, prefix: &str, at: DateTime<Utc>) -> Result<PathBuf, ExportError> {
    let bytes = encode_png(canvas)?;
    fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(export_file_name(prefix, at));
    fs::write(&path, &bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "canvas exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use egui::Color32;

    #[test]
    fn test_file_name_uses_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(export_file_name("tattoo-design", at), "tattoo-design-1700000000123.png");
    }

    #[test]
    fn test_png_is_lossless() {
        let mut canvas = Canvas::new(8, 8, Color32::WHITE);
        canvas.set_pixel(3, 4, Color32::from_rgb(12, 34, 56));
        let bytes = encode_png(&canvas).unwrap();

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded, canvas.to_rgba_image());
    }

    #[test]
    fn test_write_png_creates_dir() {
        let canvas = Canvas::new(2, 2, Color32::BLACK);
        let dir = Path::new("target/test_exports");
        let at = Utc.timestamp_millis_opt(42).unwrap();
        let path = write_png(&canvas, dir, "sketch", at).unwrap();
        assert_eq!(path, dir.join("sketch-42.png"));
        assert!(path.exists());
    }
}
