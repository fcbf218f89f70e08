//! stencil-core: value types shared by the sketch editor and the studio app shell.
//!
//! Nothing in here owns state. Geometry is in surface pixels, colours are
//! `egui::Color32` (premultiplied sRGBA), and the user/role types are the
//! read-only view of whoever is signed in.

pub mod access;
pub mod color;
pub mod geometry;
pub mod user;

pub use access::{AccessError, Area};
pub use geometry::{Point, Rect, Size};
pub use user::{CurrentUser, Role};

pub use egui::Color32;
