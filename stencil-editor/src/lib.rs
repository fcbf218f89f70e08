//! stencil-editor: the sketch/customization canvas of the tattoo studio.
//!
//! A raster editor with freehand strokes, linear undo/redo over whole-canvas
//! snapshots, image/template/text placement, display zoom and PNG export.
//! Start from [`EditorSession`].

pub mod config;
pub mod editor;
pub mod logging;

pub use config::{ConfigError, EditorConfig};
pub use editor::*;
