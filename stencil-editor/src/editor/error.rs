// Error types for the sketch editor. None of these are fatal: every failure
// leaves the canvas as it was.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("image failed to load: {reason}")]
    ImageLoad { reason: String },

    #[error("image load was cancelled before completing")]
    LoadCancelled,

    #[error("image load #{ticket} superseded by #{latest}")]
    StaleLoad { ticket: u64, latest: u64 },

    #[error("unknown font family: {0:?}")]
    UnknownFont(String),

    #[error("font data for {family:?} is not a valid font")]
    InvalidFont { family: String },

    #[error("unknown template: {0:?}")]
    UnknownTemplate(String),

    #[error("text to place is empty")]
    EmptyText,

    #[error("text size must be a positive number of pixels, got {0}")]
    InvalidTextSize(f32),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode png: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum EditorError {
    /// The drawing surface is gone (view torn down); the editor is inert.
    #[error("drawing surface is not available")]
    MissingSurface,

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
