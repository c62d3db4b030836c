use crate::tool::DrawTool;
use eframe::egui;

const BUTTON_SIZE: f32 = 32.0;
const CORNER_RADIUS: f32 = 4.0;

/// Square icon button for one drawing tool, highlighted while selected.
pub struct ToolButton {
    pub tool: DrawTool,
    pub selected: bool,
}

impl ToolButton {
    pub fn new(tool: DrawTool, selected: bool) -> Self {
        Self { tool, selected }
    }

    pub fn show(&self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) =
            ui.allocate_exact_size(egui::Vec2::splat(BUTTON_SIZE), egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let visuals = ui.visuals();
            let (fill, icon_color) = if self.selected {
                (visuals.selection.bg_fill, visuals.selection.stroke.color)
            } else {
                let widget = ui.style().interact(&response);
                (widget.bg_fill, widget.fg_stroke.color)
            };

            let painter = ui.painter();
            painter.rect_filled(rect, CORNER_RADIUS, fill);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                self.tool.icon(),
                egui::FontId::proportional(BUTTON_SIZE * 0.6),
                icon_color,
            );
            if self.selected {
                painter.rect_stroke(rect, CORNER_RADIUS, visuals.selection.stroke);
            }
        }

        response.on_hover_text(self.tool.name())
    }
}
