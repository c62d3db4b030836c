use crate::color::Fill;
use egui::Color32;
use serde::{Deserialize, Serialize};

pub const MIN_STROKE_WIDTH: f32 = 1.0;
pub const MAX_STROKE_WIDTH: f32 = 100.0;

/// Style shared by every tool: the brush uses only the stroke color and width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolStyle {
    pub stroke_color: Color32,
    pub fill: Fill,
    pub width: f32,
}

impl ToolStyle {
    pub fn new(stroke_color: Color32, fill: Fill, width: f32) -> Self {
        Self {
            stroke_color,
            fill,
            width,
        }
        .clamped()
    }

    /// Width pulled into the supported range; NaN falls back to the minimum.
    pub fn clamped(mut self) -> Self {
        self.width = if self.width.is_nan() {
            MIN_STROKE_WIDTH
        } else {
            self.width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
        };
        self
    }
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color32::WHITE,
            fill: Fill::Transparent,
            width: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_is_clamped() {
        let thin = ToolStyle::new(Color32::BLACK, Fill::Transparent, 0.0);
        assert_eq!(thin.width, MIN_STROKE_WIDTH);

        let thick = ToolStyle::new(Color32::BLACK, Fill::Transparent, 250.0);
        assert_eq!(thick.width, MAX_STROKE_WIDTH);

        let nan = ToolStyle::new(Color32::BLACK, Fill::Transparent, f32::NAN);
        assert_eq!(nan.width, MIN_STROKE_WIDTH);
    }
}
