//! The raster drawing surface: one owned buffer, a bounded snapshot history and the
//! pointer drag state machine.
//!
//! Every operation tolerates an unconfigured surface by doing nothing, and none of them
//! report errors to the caller. Internal failures (allocation, encoding, a background
//! image that will not decode) are logged and the operation degrades gracefully.
//!
//! ```text
//!            pointer_down                      pointer_up / pointer_leave
//!   Idle ───────────────────► Dragging ──────────────────────────────────► Idle
//!    ▲  (push snapshot,          │ pointer_move: restore scratch, then
//!    │   copy scratch)           │ redraw the brush path or the shape
//!    └───────────────────────────┘ configure / teardown abandon the drag
//! ```

mod history;
pub mod raster;

pub use history::{MAX_HISTORY, SnapshotHistory};
pub use raster::Shape;

use crate::codec;
use crate::geometry::{AspectRatio, DisplayTransform};
use crate::tool::{DrawTool, ToolStyle};
use egui::{Color32, Pos2, Vec2};
use image::RgbaImage;
use tiny_skia::Pixmap;

/// Everything needed to (re)build the canvas buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub aspect_ratio: AspectRatio,
    pub background: Color32,
    /// Encoded still image (PNG, JPEG, WebP...) stretched over the background fill.
    pub background_image: Option<Vec<u8>>,
    /// Host display region the buffer must fit inside.
    pub display_area: Vec2,
}

impl SurfaceConfig {
    pub fn new(aspect_ratio: AspectRatio, background: Color32, display_area: Vec2) -> Self {
        Self {
            aspect_ratio,
            background,
            background_image: None,
            display_area,
        }
    }

    pub fn with_background_image(mut self, encoded: Vec<u8>) -> Self {
        self.background_image = Some(encoded);
        self
    }

    /// Like [`Self::with_background_image`], from a base64 `data:` URI. An invalid URI is
    /// logged and leaves the plain fill.
    pub fn with_background_data_uri(self, uri: &str) -> Self {
        match codec::from_data_uri(uri) {
            Ok((_, bytes)) => self.with_background_image(bytes),
            Err(err) => {
                log::warn!("Ignoring background image: {}", err);
                self
            }
        }
    }

    /// Buffer size in pixels for this configuration.
    pub fn buffer_size(&self) -> [u32; 2] {
        self.aspect_ratio.fit_inside(self.display_area)
    }
}

/// Transient state between pointer-down and pointer-up.
#[derive(Debug)]
struct DragState {
    tool: DrawTool,
    style: ToolStyle,
    origin: Pos2,
    /// Brush path so far, starting at the origin.
    points: Vec<Pos2>,
    /// Pre-drag copy; every move redraws on top of it.
    scratch: Pixmap,
}

/// The live canvas. Exists only between `configure` and `teardown`.
#[derive(Debug)]
struct Canvas {
    config: SurfaceConfig,
    buffer: Pixmap,
    /// Background fill plus image, kept for clear and the undo floor.
    base: Pixmap,
    history: SnapshotHistory<Pixmap>,
    drag: Option<DragState>,
    transform: DisplayTransform,
}

impl Canvas {
    fn build(config: SurfaceConfig) -> Option<Self> {
        let [width, height] = config.buffer_size();
        let Some(mut base) = raster::filled_pixmap(width, height, config.background) else {
            log::error!("Cannot allocate a {}x{} canvas", width, height);
            return None;
        };

        if let Some(encoded) = &config.background_image {
            match codec::decode_stretched(encoded, width, height) {
                Ok(image) => raster::composite(&mut base, &image),
                Err(err) => log::warn!("Ignoring background image: {}", err),
            }
        }

        let mut history = SnapshotHistory::new(MAX_HISTORY);
        history.seed(base.clone());

        Some(Self {
            buffer: base.clone(),
            base,
            history,
            drag: None,
            // shown 1:1 until the host reports its display size
            transform: DisplayTransform::IDENTITY,
            config,
        })
    }

    fn reset_to_base(&mut self) {
        self.buffer = self.base.clone();
        self.history.seed(self.base.clone());
        self.drag = None;
    }
}

/// A raster canvas the user paints on with the brush and shape tools.
#[derive(Debug, Default)]
pub struct DrawingSurface {
    tool: DrawTool,
    style: ToolStyle,
    canvas: Option<Canvas>,
    /// Bumped whenever visible pixels may have changed.
    revision: u64,
}

impl DrawingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(tool: DrawTool, style: ToolStyle) -> Self {
        Self {
            tool,
            style: style.clamped(),
            ..Self::default()
        }
    }

    /// (Re)build the canvas: fit-inside sizing, background fill and image, one history
    /// entry. Any previous buffer, history and in-progress drag are discarded.
    pub fn configure(&mut self, config: SurfaceConfig) {
        if self.is_drawing() {
            log::debug!("Abandoning in-progress drag on reconfigure");
        }
        let [width, height] = config.buffer_size();
        log::info!(
            "Configuring canvas {}x{} ({}, background {})",
            width,
            height,
            config.aspect_ratio,
            crate::color::to_hex(config.background)
        );
        self.canvas = Canvas::build(config);
        self.touch();
    }

    /// Invalidate the canvas. Every operation is a no-op until the next `configure`.
    pub fn teardown(&mut self) {
        if self.canvas.take().is_some() {
            log::info!("Canvas torn down");
            self.touch();
        }
    }

    /// Tell the surface how large the buffer is shown on screen, so pointer positions can
    /// be mapped onto buffer pixels.
    pub fn set_display_size(&mut self, display: Vec2) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.transform =
                DisplayTransform::new([canvas.buffer.width(), canvas.buffer.height()], display);
        }
    }

    pub fn set_tool(&mut self, tool: DrawTool) {
        self.tool = tool;
    }

    pub fn set_style(&mut self, style: ToolStyle) {
        self.style = style.clamped();
    }

    pub fn pointer_down(&mut self, display_pos: Pos2) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let origin = canvas.transform.to_buffer(display_pos);

        canvas.history.push(canvas.buffer.clone());
        canvas.drag = Some(DragState {
            tool: self.tool,
            style: self.style,
            origin,
            points: vec![origin],
            scratch: canvas.buffer.clone(),
        });
        log::trace!("{} down at {:?}", self.tool.name(), origin);
    }

    pub fn pointer_move(&mut self, display_pos: Pos2) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let Some(drag) = canvas.drag.as_mut() else {
            return;
        };
        let point = canvas.transform.to_buffer(display_pos);

        raster::restore(&mut canvas.buffer, &drag.scratch);
        match drag.tool {
            DrawTool::Brush => {
                drag.points.push(point);
                raster::stroke_polyline(&mut canvas.buffer, &drag.points, &drag.style);
            }
            tool => {
                if let Some(shape) = Shape::from_drag(tool, drag.origin, point) {
                    raster::draw_shape(&mut canvas.buffer, &shape, &drag.style);
                }
            }
        }
        self.touch();
    }

    /// End the current stroke or shape. What the last move drew is already in the buffer.
    pub fn pointer_up(&mut self, _display_pos: Pos2) {
        self.end_drag();
    }

    pub fn pointer_leave(&mut self) {
        self.end_drag();
    }

    fn end_drag(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.drag = None;
        }
    }

    /// Pop the newest snapshot and restore the one below it. With a single snapshot left
    /// the canvas is cleared back to its background instead.
    pub fn undo(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        canvas.drag = None;
        match canvas.history.undo() {
            Some(snapshot) => {
                if !raster::restore(&mut canvas.buffer, snapshot) {
                    log::warn!("Snapshot size mismatch, resetting canvas");
                    canvas.reset_to_base();
                }
            }
            None => canvas.reset_to_base(),
        }
        self.touch();
    }

    /// Redraw the background composition and reset history to that single state.
    pub fn clear(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.reset_to_base();
            log::debug!("Canvas cleared");
            self.touch();
        }
    }

    /// The current buffer as straight-alpha RGBA, or `None` when unconfigured.
    pub fn export_image(&self) -> Option<RgbaImage> {
        let canvas = self.canvas.as_ref()?;
        codec::pixmap_to_rgba(&canvas.buffer)
            .map_err(|err| log::error!("Export failed: {}", err))
            .ok()
    }

    /// The current buffer encoded as PNG.
    pub fn export_png(&self) -> Option<Vec<u8>> {
        let image = self.export_image()?;
        codec::encode_png(&image)
            .map_err(|err| log::error!("PNG encoding failed: {}", err))
            .ok()
    }

    /// The current buffer as a `data:image/png;base64,...` URI; empty when unconfigured.
    pub fn export(&self) -> String {
        self.export_png()
            .map(|png| codec::to_data_uri(codec::PNG_MIME, &png))
            .unwrap_or_default()
    }

    pub fn is_initialized(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn is_drawing(&self) -> bool {
        self.canvas.as_ref().is_some_and(|c| c.drag.is_some())
    }

    /// Buffer size in pixels.
    pub fn size(&self) -> Option<[u32; 2]> {
        self.canvas
            .as_ref()
            .map(|c| [c.buffer.width(), c.buffer.height()])
    }

    pub fn history_len(&self) -> usize {
        self.canvas.as_ref().map_or(0, |c| c.history.len())
    }

    pub fn config(&self) -> Option<&SurfaceConfig> {
        self.canvas.as_ref().map(|c| &c.config)
    }

    pub fn tool(&self) -> DrawTool {
        self.tool
    }

    pub fn style(&self) -> ToolStyle {
        self.style
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
