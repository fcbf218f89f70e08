//! One open sketch: the canvas plus everything that edits it.
//!
//! The session exclusively owns its canvas and history, so nothing here
//! locks. Pointer input arrives in display space and is mapped through the
//! view before drawing. Each completed stroke, placement or clear records
//! exactly one history snapshot.
//!
//! When the surface has been detached (the host view went away) every
//! operation degrades to a logged no-op or `EditorError::MissingSurface`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use egui::Color32;
use image::RgbaImage;
use stencil_core::{CurrentUser, Point, Rect};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EditorConfig};
use crate::editor::compositor::{self, PlaceMode};
use crate::editor::error::{CompositeError, EditorError};
use crate::editor::export;
use crate::editor::history::History;
use crate::editor::loader::{ImageLoader, ImageSource, LoadResult, LoadTicket, PendingImage};
use crate::editor::stroke::{DrawingSurface, EventResponse, PointerKind};
use crate::editor::template::TemplateCatalog;
use crate::editor::text::{self, FontBook, TextStyle};
use crate::editor::tools::{Brush, Eraser, Tool, ToolKind};
use crate::editor::view::ViewTransform;
use crate::Canvas;

/// A one-shot placement onto the canvas.
#[derive(Debug, Clone)]
pub enum OverlayRequest {
    Image { source: ImageSource, mode: PlaceMode },
    /// `mode` overrides the template's own placement mode.
    Template { id: String, mode: Option<PlaceMode> },
    Text { text: String, style: TextStyle },
}

#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    owner: CurrentUser,
    canvas: Option<Canvas>,
    history: History,
    stroke: DrawingSurface,
    view: ViewTransform,
    brush: Brush,
    eraser: Eraser,
    tool: ToolKind,
    loader: ImageLoader,
    fonts: FontBook,
    templates: TemplateCatalog,
}

impl EditorSession {
    /// Open a session for `owner`. The blank canvas is recorded as the first
    /// history entry so the first stroke can be undone back to it.
    pub fn open(config: EditorConfig, owner: CurrentUser) -> Result<Self, ConfigError> {
        config.validate()?;

        let surface = &config.surface;
        let canvas = Canvas::new(surface.width, surface.height, surface.background);
        let mut history = History::new(config.history_limit);
        history.snapshot(&canvas);

        info!(
            user = %owner.id,
            width = surface.width,
            height = surface.height,
            "editor session opened"
        );

        Ok(Self {
            view: ViewTransform::new(config.zoom.clone()),
            brush: Brush::new(config.brush.size, config.brush.color),
            eraser: Eraser::new(config.brush.eraser_size, surface.background),
            tool: ToolKind::Brush,
            stroke: DrawingSurface::new(),
            loader: ImageLoader::new(),
            fonts: FontBook::new(),
            templates: TemplateCatalog::default(),
            canvas: Some(canvas),
            history,
            owner,
            config,
        })
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_templates(mut self, templates: TemplateCatalog) -> Self {
        self.templates = templates;
        self
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn owner(&self) -> &CurrentUser {
        &self.owner
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn active_tool(&self) -> &dyn Tool {
        match self.tool {
            ToolKind::Brush => &self.brush,
            ToolKind::Eraser => &self.eraser,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_active()
    }

    /// Drop the drawing surface, e.g. when the host view is torn down.
    pub fn detach_surface(&mut self) -> Option<Canvas> {
        warn!(user = %self.owner.id, "drawing surface detached");
        self.stroke.end_stroke();
        self.canvas.take()
    }

    // ---- pointer input ----

    pub fn pointer_down(&mut self, display: Point, kind: PointerKind) -> EventResponse {
        if self.canvas.is_none() {
            warn!("pointer down without a drawing surface");
            return EventResponse::default();
        }
        // Second pointer or lost pointer-up: keep the unfinished stroke's ink.
        if self.stroke.is_active() {
            debug!("pointer down during an active stroke");
            self.commit_stroke();
        }
        self.stroke.begin_stroke(self.view.to_canvas(display));
        self.stroke.response_for(kind)
    }

    pub fn pointer_move(&mut self, display: Point, kind: PointerKind) -> EventResponse {
        let response = self.stroke.response_for(kind);
        let position = self.view.to_canvas(display);
        let Some(canvas) = self.canvas.as_mut() else {
            return response;
        };
        let tool: &dyn Tool = match self.tool {
            ToolKind::Brush => &self.brush,
            ToolKind::Eraser => &self.eraser,
        };
        self.stroke.extend_stroke(canvas, tool, position);
        response
    }

    /// End the stroke; a stroke that drew anything is snapshotted once.
    pub fn pointer_up(&mut self, kind: PointerKind) -> EventResponse {
        let response = self.stroke.response_for(kind);
        self.commit_stroke();
        response
    }

    fn commit_stroke(&mut self) {
        if self.stroke.end_stroke() == 0 {
            return;
        }
        if let Some(canvas) = self.canvas.as_ref() {
            self.history.snapshot(canvas);
        }
    }

    // ---- history ----

    /// Step back one entry. False when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            warn!("undo without a drawing surface");
            return false;
        };
        match self.history.undo() {
            Some(entry) => {
                canvas.restore_from(&entry);
                true
            }
            None => false,
        }
    }

    /// Step forward one entry. False when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            warn!("redo without a drawing surface");
            return false;
        };
        match self.history.redo() {
            Some(entry) => {
                canvas.restore_from(&entry);
                true
            }
            None => false,
        }
    }

    /// Fill with the background and record it as an undoable step.
    pub fn clear(&mut self) -> Result<(), EditorError> {
        let canvas = surface(&mut self.canvas)?;
        canvas.clear();
        self.history.snapshot(canvas);
        Ok(())
    }

    /// Start over: blank canvas, fresh history, default zoom.
    pub fn reset(&mut self) -> Result<(), EditorError> {
        let canvas = surface(&mut self.canvas)?;
        self.stroke.end_stroke();
        self.view.reset();
        canvas.clear();
        self.history.clear();
        self.history.snapshot(canvas);
        info!("editor reset");
        Ok(())
    }

    // ---- tools ----

    pub fn select_tool(&mut self, tool: ToolKind) {
        debug!(?tool, "tool selected");
        self.tool = tool;
    }

    pub fn set_brush_color(&mut self, color: Color32) {
        self.brush.color = color;
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush.size = size.max(1);
    }

    pub fn set_eraser_size(&mut self, size: u32) {
        self.eraser.size = size.max(1);
    }

    // ---- view ----

    pub fn zoom_in(&mut self) -> bool {
        self.view.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.view.zoom_out()
    }

    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        self.view.set_zoom(zoom)
    }

    // ---- overlays ----

    /// Replace the canvas content with `image` and snapshot.
    pub fn place_image(&mut self, image: &RgbaImage, mode: PlaceMode) -> Result<Rect, EditorError> {
        let fit_ratio = self.config.fit_ratio;
        let canvas = surface(&mut self.canvas)?;
        let rect = compositor::place_image(canvas, image, mode, fit_ratio);
        self.history.snapshot(canvas);
        Ok(rect)
    }

    /// Letter `text` centred on the canvas and snapshot. `Ok(None)` when the
    /// text produced no ink; nothing is recorded then.
    pub fn place_text(&mut self, text: &str, style: &TextStyle) -> Result<Option<Rect>, EditorError> {
        if text.trim().is_empty() {
            return Err(CompositeError::EmptyText.into());
        }
        if !(style.size.is_finite() && style.size > 0.0) {
            return Err(CompositeError::InvalidTextSize(style.size).into());
        }
        let font = self.fonts.get(&style.family)?.clone();
        let canvas = surface(&mut self.canvas)?;
        let bounds = text::draw_text(canvas, &font, text, style);
        if bounds.is_some() {
            self.history.snapshot(canvas);
        }
        Ok(bounds)
    }

    /// Start decoding an image off-thread. Only the most recent request will
    /// be applied by `finish_image_load`.
    pub fn begin_image_load(&mut self, source: ImageSource) -> PendingImage {
        self.loader.load(source)
    }

    /// Apply a completed load. Stale tickets and failed decodes leave the
    /// canvas untouched.
    pub fn finish_image_load(
        &mut self,
        ticket: LoadTicket,
        result: LoadResult,
        mode: PlaceMode,
    ) -> Result<Rect, EditorError> {
        if !self.loader.is_latest(ticket) {
            let latest = self.loader.latest().map(|t| t.0).unwrap_or_default();
            warn!(ticket = ticket.0, latest, "discarding stale image load");
            return Err(CompositeError::StaleLoad {
                ticket: ticket.0,
                latest,
            }
            .into());
        }

        let image = result.map_err(|e| {
            warn!(ticket = ticket.0, error = %e, "image load failed");
            e
        })?;
        self.place_image(&image, mode)
    }

    /// Load and place in one step.
    pub async fn load_and_place(&mut self, source: ImageSource, mode: PlaceMode) -> Result<Rect, EditorError> {
        let pending = self.begin_image_load(source);
        let (ticket, result) = pending.wait().await;
        self.finish_image_load(ticket, result, mode)
    }

    pub async fn apply_overlay(&mut self, request: OverlayRequest) -> Result<Option<Rect>, EditorError> {
        match request {
            OverlayRequest::Image { source, mode } => self.load_and_place(source, mode).await.map(Some),
            OverlayRequest::Template { id, mode } => {
                let template = self.templates.get(&id)?;
                let (source, mode) = (template.image_source(), mode.unwrap_or(template.mode));
                self.load_and_place(source, mode).await.map(Some)
            }
            OverlayRequest::Text { text, style } => self.place_text(&text, &style),
        }
    }

    // ---- export ----

    pub fn encode_png(&self) -> Result<Vec<u8>, EditorError> {
        let canvas = self.canvas.as_ref().ok_or(EditorError::MissingSurface)?;
        Ok(export::encode_png(canvas)?)
    }

    /// Write the canvas as `{prefix}-{millis}.png` into `dir`.
    pub fn export_png(&self, dir: &Path) -> Result<PathBuf, EditorError> {
        self.export_png_at(dir, Utc::now())
    }

    pub fn export_png_at(&self, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf, EditorError> {
        let canvas = self.canvas.as_ref().ok_or(EditorError::MissingSurface)?;
        Ok(export::write_png(canvas, dir, &self.config.export.file_prefix, at)?)
    }
}

fn surface(canvas: &mut Option<Canvas>) -> Result<&mut Canvas, EditorError> {
    canvas.as_mut().ok_or_else(|| {
        warn!("drawing surface unavailable");
        EditorError::MissingSurface
    })
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        debug!(user = %self.owner.id, "editor session closed");
    }
}
