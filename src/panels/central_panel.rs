use crate::StudioApp;
use egui::{Color32, Pos2, Rect, Vec2};

/// Largest rect with the buffer's proportions that fits in `available`, centered, never
/// scaled above 1:1.
pub fn display_rect(available: Rect, buffer_size: [u32; 2]) -> Rect {
    let buffer = Vec2::new(buffer_size[0] as f32, buffer_size[1] as f32);
    if buffer.x <= 0.0 || buffer.y <= 0.0 {
        return Rect::from_center_size(available.center(), Vec2::ZERO);
    }
    let scale = (available.width() / buffer.x)
        .min(available.height() / buffer.y)
        .clamp(0.0, 1.0);
    Rect::from_center_size(available.center(), buffer * scale)
}

pub fn central_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let available = ui.available_rect_before_wrap();
        app.ensure_canvas(available.size());

        let Some(buffer_size) = app.studio.surface().size() else {
            ui.centered_and_justified(|ui| ui.label("Canvas unavailable"));
            return;
        };

        let canvas_rect = display_rect(available, buffer_size);
        app.studio.surface_mut().set_display_size(canvas_rect.size());
        app.input.set_canvas_rect(canvas_rect);
        app.handle_canvas_input(ctx);

        let response = ui.allocate_rect(canvas_rect, egui::Sense::drag());
        if let Some(texture) = app.canvas_texture.sync(ctx, app.studio.surface()) {
            ui.painter().image(
                texture,
                canvas_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        if response.hovered() || app.studio.surface().is_drawing() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rect_shrinks_to_fit() {
        let available = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 300.0));
        let rect = display_rect(available, [200, 100]);
        assert_eq!(rect.size(), Vec2::new(100.0, 50.0));
        assert_eq!(rect.center(), available.center());
    }

    #[test]
    fn test_display_rect_never_upscales() {
        let available = Rect::from_min_size(Pos2::ZERO, Vec2::new(1000.0, 1000.0));
        let rect = display_rect(available, [200, 100]);
        assert_eq!(rect.size(), Vec2::new(200.0, 100.0));
    }
}
