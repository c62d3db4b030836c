use crate::StudioApp;
use crate::state::HistoryItem;
use crate::util::format_file_size;
use egui::{Pos2, Rect, Vec2};
use uuid::Uuid;

const THUMBNAIL_DISPLAY: f32 = 96.0;

enum HistoryAction {
    UseAsBackground(Uuid),
    Analyze(Uuid),
    Remove(Uuid),
    ClearAll,
}

/// One-line summary such as `1024×768 · 4:3 · 1.2 MB`.
pub fn describe(item: &HistoryItem) -> String {
    let mut parts = Vec::new();
    if let (Some(width), Some(height)) = (item.width, item.height) {
        parts.push(format!("{width}×{height}"));
    }
    if let Some(ratio) = &item.aspect_ratio {
        parts.push(ratio.clone());
    }
    if let Some(size) = item.size {
        parts.push(format_file_size(size));
    }
    parts.join(" · ")
}

pub fn history_panel(app: &mut StudioApp, ctx: &egui::Context) {
    let mut action = None;
    let can_analyze = app.studio.has_service() && !app.is_busy();

    egui::SidePanel::right("history_panel")
        .resizable(true)
        .default_width(240.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("History");
                let has_items = !app.studio.history().is_empty();
                if ui.add_enabled(has_items, egui::Button::new("Clear all")).clicked() {
                    action = Some(HistoryAction::ClearAll);
                }
            });
            ui.separator();

            if app.studio.history().is_empty() {
                ui.weak("Exported drawings and generated images show up here.");
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                let StudioApp {
                    studio, thumbnails, ..
                } = &mut *app;

                for item in studio.history().items() {
                    ui.group(|ui| {
                        if let Some(texture) = thumbnails.get_or_create(ctx, item.id, &item.src) {
                            let size = Vec2::splat(THUMBNAIL_DISPLAY);
                            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                            let fitted = match (item.width, item.height) {
                                (Some(w), Some(h)) if w > 0 && h > 0 => {
                                    let scale = (size.x / w as f32).min(size.y / h as f32);
                                    Rect::from_center_size(
                                        rect.center(),
                                        Vec2::new(w as f32, h as f32) * scale,
                                    )
                                }
                                _ => rect,
                            };
                            ui.painter().image(
                                texture,
                                fitted,
                                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                                egui::Color32::WHITE,
                            );
                        }

                        let title = item.prompt.as_deref().unwrap_or(&item.alt);
                        ui.label(title);
                        ui.weak(describe(item));
                        if let Some(analysis) = &item.analysis {
                            ui.label(format!("Score: {}", analysis.score))
                                .on_hover_text(analysis.analysis.as_str());
                        }

                        ui.horizontal(|ui| {
                            if ui.small_button("Use as background").clicked() {
                                action = Some(HistoryAction::UseAsBackground(item.id));
                            }
                            if ui
                                .add_enabled(can_analyze, egui::Button::new("Analyze").small())
                                .clicked()
                            {
                                action = Some(HistoryAction::Analyze(item.id));
                            }
                            if ui.small_button("Delete").clicked() {
                                action = Some(HistoryAction::Remove(item.id));
                            }
                        });
                    });
                }
            });
        });

    match action {
        Some(HistoryAction::UseAsBackground(id)) => app.use_as_background(id),
        Some(HistoryAction::Analyze(id)) => app.analyze(ctx, id),
        Some(HistoryAction::Remove(id)) => app.remove_history_item(id),
        Some(HistoryAction::ClearAll) => app.clear_history(),
        None => {}
    }
}
