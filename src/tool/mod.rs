mod style;

pub use style::{MAX_STROKE_WIDTH, MIN_STROKE_WIDTH, ToolStyle};

use serde::{Deserialize, Serialize};

/// The active drawing tool. Exactly one is selected at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrawTool {
    #[default]
    Brush,
    Rectangle,
    Circle,
    Arrow,
}

impl DrawTool {
    pub const ALL: [DrawTool; 4] = [
        DrawTool::Brush,
        DrawTool::Rectangle,
        DrawTool::Circle,
        DrawTool::Arrow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DrawTool::Brush => "brush",
            DrawTool::Rectangle => "rectangle",
            DrawTool::Circle => "circle",
            DrawTool::Arrow => "arrow",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            DrawTool::Brush => "🖌",
            DrawTool::Rectangle => "⬜",
            DrawTool::Circle => "⭕",
            DrawTool::Arrow => "➡",
        }
    }

    /// Shape tools use the fill color; the brush only strokes.
    pub fn is_shape(&self) -> bool {
        !matches!(self, DrawTool::Brush)
    }
}

impl std::str::FromStr for DrawTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrawTool::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_round_trip() {
        for tool in DrawTool::ALL {
            assert_eq!(tool.name().parse::<DrawTool>(), Ok(tool));
        }
        assert!("eraser".parse::<DrawTool>().is_err());
    }

    #[test]
    fn test_only_brush_is_freehand() {
        assert!(!DrawTool::Brush.is_shape());
        assert!(DrawTool::Rectangle.is_shape());
        assert!(DrawTool::Circle.is_shape());
        assert!(DrawTool::Arrow.is_shape());
    }
}
