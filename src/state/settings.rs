use crate::color::Fill;
use crate::geometry::AspectRatio;
use crate::tool::{DrawTool, ToolStyle};
use egui::Color32;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKGROUND: Color32 = Color32::from_rgb(0x80, 0x80, 0x80);

/// Host-owned drawing settings, persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct AppSettings {
    pub tool: DrawTool,
    pub style: ToolStyle,
    pub aspect_ratio: AspectRatio,
    pub background: Color32,
    /// Where the history blob store writes its files.
    pub data_dir: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            tool: DrawTool::Brush,
            style: ToolStyle::new(Color32::WHITE, Fill::Transparent, 5.0),
            aspect_ratio: AspectRatio::SQUARE,
            background: DEFAULT_BACKGROUND,
            data_dir: None,
        }
    }
}

impl AppSettings {
    /// Settings restored from disk may carry out-of-range values.
    pub fn sanitized(mut self) -> Self {
        self.style = self.style.clamped();
        self
    }
}
