use crate::StudioApp;
use crate::color::{Fill, to_hex};
use crate::components::tool_button::ToolButton;
use crate::geometry::AspectRatio;
use crate::tool::{DrawTool, MAX_STROKE_WIDTH, MIN_STROKE_WIDTH};
use egui::color_picker::{Alpha, color_edit_button_srgba};

pub fn tools_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            ui.horizontal(|ui| {
                let active = app.settings.tool;
                for tool in DrawTool::ALL {
                    if ToolButton::new(tool, tool == active).show(ui).clicked() {
                        app.set_tool(tool);
                    }
                }
            });
            ui.separator();

            style_section(app, ui);
            ui.separator();
            canvas_section(app, ui);
            ui.separator();

            ui.horizontal(|ui| {
                let ready = app.studio.surface().is_initialized();
                if ui.add_enabled(ready, egui::Button::new("Undo")).clicked() {
                    app.undo();
                }
                if ui.add_enabled(ready, egui::Button::new("Clear")).clicked() {
                    app.clear();
                }
                if ui.add_enabled(ready, egui::Button::new("Export")).clicked() {
                    app.export();
                }
            });
            ui.label(format!("Undo depth: {}", app.studio.surface().history_len()));
            ui.separator();

            generate_section(app, ui, ctx);

            if let Some(status) = app.status().cloned() {
                ui.separator();
                ui.horizontal_wrapped(|ui| {
                    let color = if status.is_error {
                        ui.visuals().error_fg_color
                    } else {
                        ui.visuals().text_color()
                    };
                    ui.colored_label(color, &status.message);
                    if ui.small_button("✕").clicked() {
                        app.dismiss_status();
                    }
                });
            }
        });
}

fn style_section(app: &mut StudioApp, ui: &mut egui::Ui) {
    let mut style = app.settings.style;

    ui.horizontal(|ui| {
        ui.label("Stroke");
        color_edit_button_srgba(ui, &mut style.stroke_color, Alpha::OnlyBlend);
        ui.label(to_hex(style.stroke_color));
    });

    // the brush never fills
    ui.add_enabled_ui(app.settings.tool.is_shape(), |ui| {
        ui.horizontal(|ui| {
            let mut transparent = style.fill.is_transparent();
            if ui.checkbox(&mut transparent, "Transparent fill").changed() {
                style.fill = if transparent {
                    Fill::Transparent
                } else {
                    Fill::Solid(app.fill_color)
                };
            }
            if let Fill::Solid(color) = &mut style.fill {
                color_edit_button_srgba(ui, color, Alpha::OnlyBlend);
            }
        });
    });

    ui.add(egui::Slider::new(&mut style.width, MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH).text("Width"));

    if style != app.settings.style {
        app.set_style(style);
    }
}

fn canvas_section(app: &mut StudioApp, ui: &mut egui::Ui) {
    ui.heading("Canvas");

    let mut ratio = app.settings.aspect_ratio;
    egui::ComboBox::from_label("Aspect ratio")
        .selected_text(ratio.to_string())
        .show_ui(ui, |ui| {
            for preset in AspectRatio::PRESETS {
                ui.selectable_value(&mut ratio, preset, preset.to_string());
            }
        });

    let mut background = app.settings.background;
    ui.horizontal(|ui| {
        ui.label("Background");
        color_edit_button_srgba(ui, &mut background, Alpha::Opaque);
    });

    if ratio != app.settings.aspect_ratio || background != app.settings.background {
        log::debug!("Canvas settings changed: {} {}", ratio, to_hex(background));
        app.settings.aspect_ratio = ratio;
        app.settings.background = background;
        app.request_reconfigure();
    }

    if app.background_image.is_some() && ui.button("Remove background image").clicked() {
        app.clear_background_image();
    }

    if let Some([width, height]) = app.studio.surface().size() {
        ui.weak(format!("{width} × {height} px"));
    }
}

fn generate_section(app: &mut StudioApp, ui: &mut egui::Ui, ctx: &egui::Context) {
    ui.heading("Generate");

    if !app.studio.has_service() {
        ui.weak("No generative service configured");
        return;
    }

    ui.add(
        egui::TextEdit::multiline(&mut app.prompt)
            .hint_text("Describe what to make of the drawing")
            .desired_rows(3),
    );

    if let Some(label) = app.busy_label() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("{label}…"));
        });
        return;
    }

    let has_prompt = !app.prompt.trim().is_empty();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(has_prompt, egui::Button::new("Generate from drawing"))
            .clicked()
        {
            app.generate_from_drawing(ctx);
        }
        if ui
            .add_enabled(has_prompt, egui::Button::new("Optimize prompt"))
            .clicked()
        {
            app.optimize_prompt(ctx);
        }
    });
    ui.horizontal(|ui| {
        if ui.button("Remove background").clicked() {
            app.remove_background(ctx, false);
        }
        if ui
            .button("Animate")
            .on_hover_text("Generate a short video starting from the drawing")
            .clicked()
        {
            app.generate_video(ctx);
        }
    });

    if let Some(video) = &app.last_video {
        ui.hyperlink_to("Open last video", &video.video_url);
    }
}
