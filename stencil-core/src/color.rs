//! Colour helpers on top of `egui::Color32`.
//!
//! `Color32` stores premultiplied alpha, so compositing here is the plain
//! premultiplied source-over formula.

use egui::Color32;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("colour must start with '#': {0:?}")]
    MissingHash(String),

    #[error("colour must have 6 or 8 hex digits: {0:?}")]
    BadLength(String),

    #[error("invalid hex digits in colour: {0:?}")]
    BadDigit(String),
}

/// Parse `#rrggbb` or `#rrggbbaa` (unmultiplied alpha).
pub fn parse_hex(input: &str) -> Result<Color32, ColorParseError> {
    let digits = input
        .strip_prefix('#')
        .ok_or_else(|| ColorParseError::MissingHash(input.to_string()))?;

    if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
        return Err(ColorParseError::BadLength(input.to_string()));
    }

    let mut channels = [255u8; 4];
    for (i, channel) in channels.iter_mut().enumerate().take(digits.len() / 2) {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| ColorParseError::BadDigit(input.to_string()))?;
    }

    let [r, g, b, a] = channels;
    if a == 255 {
        Ok(Color32::from_rgb(r, g, b))
    } else {
        Ok(Color32::from_rgba_unmultiplied(r, g, b, a))
    }
}

/// Format as `#rrggbb`, or `#rrggbbaa` when not opaque.
pub fn to_hex(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == 255 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Scale a premultiplied colour by `factor` in `[0, 1]` (coverage × opacity).
pub fn scale(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    if factor >= 1.0 {
        return color;
    }
    let [r, g, b, a] = color.to_array();
    let s = |c: u8| (c as f32 * factor).round() as u8;
    Color32::from_rgba_premultiplied(s(r), s(g), s(b), s(a))
}

/// Premultiplied source-over: `src + dst * (1 - src.a)`.
pub fn source_over(dst: Color32, src: Color32) -> Color32 {
    match src.a() {
        255 => src,
        0 => dst,
        sa => {
            let inv = 255 - sa as u32;
            let [sr, sg, sb, _] = src.to_array();
            let [dr, dg, db, da] = dst.to_array();
            let mix = |s: u8, d: u8| (s as u32 + (d as u32 * inv + 127) / 255).min(255) as u8;
            Color32::from_rgba_premultiplied(mix(sr, dr), mix(sg, dg), mix(sb, db), mix(sa, da))
        }
    }
}

/// Serde adapter storing colours as hex strings.
pub mod hex {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hex(&raw).map_err(serde::de::Error::custom)
    }
}
