use canvas_studio::codec;
use canvas_studio::{AspectRatio, DrawTool, DrawingSurface, Fill, SurfaceConfig, ToolStyle};
use egui::{Color32, Pos2, Vec2};
use image::{Rgba, RgbaImage};

const GRAY: [u8; 4] = [128, 128, 128, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const RED: [u8; 4] = [255, 0, 0, 255];

fn surface(ratio: AspectRatio, background: Color32, area: Vec2) -> DrawingSurface {
    let mut surface = DrawingSurface::new();
    surface.configure(SurfaceConfig::new(ratio, background, area));
    surface
}

fn gray_square() -> DrawingSurface {
    surface(AspectRatio::SQUARE, Color32::from_gray(128), Vec2::new(64.0, 64.0))
}

fn drag(surface: &mut DrawingSurface, from: Pos2, to: Pos2) {
    surface.pointer_down(from);
    surface.pointer_move(to);
    surface.pointer_up(to);
}

fn pixel(surface: &DrawingSurface, x: u32, y: u32) -> [u8; 4] {
    surface.export_image().unwrap().get_pixel(x, y).0
}

fn png(image: &RgbaImage) -> Vec<u8> {
    codec::encode_png(image).unwrap()
}

#[test]
fn test_rectangle_scenario_and_single_undo() {
    let mut surface = gray_square();
    surface.set_tool(DrawTool::Rectangle);
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Solid(Color32::RED), 4.0));

    drag(&mut surface, Pos2::new(10.0, 10.0), Pos2::new(50.0, 50.0));

    assert_eq!(pixel(&surface, 30, 30), RED);
    assert_eq!(pixel(&surface, 10, 30), WHITE);
    assert_eq!(pixel(&surface, 30, 50), WHITE);
    assert_eq!(pixel(&surface, 3, 3), GRAY);
    assert_eq!(pixel(&surface, 60, 60), GRAY);

    surface.undo();
    let image = surface.export_image().unwrap();
    assert!(image.pixels().all(|p| p.0 == GRAY));
}

#[test]
fn test_shape_preview_does_not_accumulate() {
    let mut surface = gray_square();
    surface.set_tool(DrawTool::Rectangle);
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Solid(Color32::RED), 2.0));

    surface.pointer_down(Pos2::new(5.0, 5.0));
    surface.pointer_move(Pos2::new(60.0, 60.0));
    surface.pointer_move(Pos2::new(20.0, 20.0));
    surface.pointer_up(Pos2::new(20.0, 20.0));

    // only the final rectangle remains
    assert_eq!(pixel(&surface, 12, 12), RED);
    assert_eq!(pixel(&surface, 40, 40), GRAY);
}

#[test]
fn test_zero_length_shape_leaves_buffer_unchanged() {
    for tool in [DrawTool::Rectangle, DrawTool::Circle, DrawTool::Arrow] {
        let mut surface = gray_square();
        surface.set_tool(tool);
        surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Solid(Color32::RED), 8.0));
        let before = surface.export_image().unwrap();

        surface.pointer_down(Pos2::new(20.0, 20.0));
        surface.pointer_up(Pos2::new(20.0, 20.0));
        assert_eq!(surface.export_image().unwrap(), before, "{tool:?} down/up");

        surface.pointer_down(Pos2::new(20.0, 20.0));
        surface.pointer_move(Pos2::new(20.0, 20.0));
        surface.pointer_up(Pos2::new(20.0, 20.0));
        assert_eq!(surface.export_image().unwrap(), before, "{tool:?} down/move/up");
    }
}

#[test]
fn test_rectangle_direction_does_not_matter() {
    let style = ToolStyle::new(Color32::WHITE, Fill::Solid(Color32::BLUE), 3.0);
    let a = Pos2::new(12.0, 40.0);
    let b = Pos2::new(48.0, 8.0);

    let mut forward = gray_square();
    forward.set_tool(DrawTool::Rectangle);
    forward.set_style(style);
    drag(&mut forward, a, b);

    let mut backward = gray_square();
    backward.set_tool(DrawTool::Rectangle);
    backward.set_style(style);
    drag(&mut backward, b, a);

    assert_eq!(forward.export_image(), backward.export_image());
}

#[test]
fn test_brush_strokes_follow_the_pointer() {
    let mut surface = surface(AspectRatio::SQUARE, Color32::BLACK, Vec2::new(64.0, 64.0));
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Transparent, 4.0));

    surface.pointer_down(Pos2::new(10.0, 10.0));
    surface.pointer_move(Pos2::new(30.0, 10.0));
    surface.pointer_move(Pos2::new(30.0, 40.0));
    surface.pointer_leave();
    // moves after leaving do not paint
    surface.pointer_move(Pos2::new(60.0, 60.0));

    assert_eq!(pixel(&surface, 20, 10), WHITE);
    assert_eq!(pixel(&surface, 30, 25), WHITE);
    assert_eq!(pixel(&surface, 50, 50), [0, 0, 0, 255]);
    assert!(!surface.is_drawing());
}

#[test]
fn test_translucent_brush_blends_once_per_stroke() {
    let mut surface = surface(AspectRatio::SQUARE, Color32::WHITE, Vec2::new(64.0, 64.0));
    let half_black = Color32::from_rgba_unmultiplied(0, 0, 0, 128);
    surface.set_style(ToolStyle::new(half_black, Fill::Transparent, 8.0));

    surface.pointer_down(Pos2::new(5.0, 32.0));
    for x in [10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0] {
        surface.pointer_move(Pos2::new(x, 32.0));
    }
    surface.pointer_up(Pos2::new(40.0, 32.0));

    // joints at x = 10, 15, ... look the same as the middle of a segment
    let joint = pixel(&surface, 20, 32);
    let between = pixel(&surface, 22, 32);
    assert_eq!(joint, between);
    assert!(joint[0] > 100 && joint[0] < 160);

    // one stroke, one snapshot
    assert_eq!(surface.history_len(), 2);
    surface.undo();
    assert_eq!(pixel(&surface, 20, 32), WHITE);
}

#[test]
fn test_history_is_capped_at_twenty() {
    let mut surface = gray_square();
    for i in 0..25 {
        let x = i as f32 * 2.0;
        drag(&mut surface, Pos2::new(x, 0.0), Pos2::new(x, 30.0));
    }
    assert_eq!(surface.history_len(), 20);
}

#[test]
fn test_undo_walks_back_to_background_and_keeps_recent_snapshots() {
    let mut surface = surface(AspectRatio::SQUARE, Color32::BLACK, Vec2::new(200.0, 200.0));
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Transparent, 4.0));
    let column = |i: u32| i * 8;

    for i in 1..=22 {
        let x = column(i) as f32;
        drag(&mut surface, Pos2::new(x, 10.0), Pos2::new(x, 30.0));
    }
    for i in 1..=22 {
        assert_eq!(pixel(&surface, column(i), 20), WHITE);
    }

    // the first undo restores the snapshot below the newest one
    surface.undo();
    assert_eq!(pixel(&surface, column(20), 20), WHITE);
    assert_eq!(pixel(&surface, column(21), 20), [0, 0, 0, 255]);

    for _ in 0..18 {
        surface.undo();
    }
    // the two oldest snapshots were evicted, so the floor still has strokes 1 and 2
    assert_eq!(surface.history_len(), 1);
    assert_eq!(pixel(&surface, column(2), 20), WHITE);
    assert_eq!(pixel(&surface, column(3), 20), [0, 0, 0, 255]);

    // past the floor undo clears to the background, and keeps doing so
    for _ in 0..5 {
        surface.undo();
    }
    let image = surface.export_image().unwrap();
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    assert_eq!(surface.history_len(), 1);
}

#[test]
fn test_clear_resets_history_and_undo_after_clear_is_noop() {
    let mut surface = gray_square();
    surface.set_tool(DrawTool::Circle);
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Solid(Color32::RED), 2.0));
    drag(&mut surface, Pos2::new(32.0, 32.0), Pos2::new(50.0, 32.0));
    drag(&mut surface, Pos2::new(10.0, 10.0), Pos2::new(20.0, 10.0));
    assert_eq!(surface.history_len(), 3);

    surface.clear();
    assert_eq!(surface.history_len(), 1);
    let cleared = surface.export_image().unwrap();
    assert!(cleared.pixels().all(|p| p.0 == GRAY));

    surface.undo();
    assert_eq!(surface.export_image().unwrap(), cleared);
    assert_eq!(surface.history_len(), 1);
}

#[test]
fn test_export_after_configure_is_the_background() {
    let surface = gray_square();
    let uri = surface.export();
    assert!(uri.starts_with("data:image/png;base64,"));

    let (mime, bytes) = codec::from_data_uri(&uri).unwrap();
    assert_eq!(mime, "image/png");
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (64, 64));
    assert!(decoded.pixels().all(|p| p.0 == GRAY));
    assert_eq!(Some(decoded), surface.export_image());
}

#[test]
fn test_fit_inside_sizing() {
    let wide = surface(
        AspectRatio::new(16, 9).unwrap(),
        Color32::BLACK,
        Vec2::new(320.0, 600.0),
    );
    assert_eq!(wide.size(), Some([320, 180]));

    let tall = surface(
        AspectRatio::new(9, 16).unwrap(),
        Color32::BLACK,
        Vec2::new(320.0, 600.0),
    );
    // 600 * 9 / 16 = 337.5 is too wide, so the width is pinned
    assert_eq!(tall.size(), Some([320, 568]));

    let tiny = surface(AspectRatio::new(100, 1).unwrap(), Color32::BLACK, Vec2::new(10.0, 10.0));
    assert_eq!(tiny.size(), Some([10, 1]));
}

#[test]
fn test_background_image_is_stretched_over_fill() {
    let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
    let mut surface = DrawingSurface::new();
    surface.configure(
        SurfaceConfig::new(
            AspectRatio::new(3, 2).unwrap(),
            Color32::from_gray(128),
            Vec2::new(30.0, 30.0),
        )
        .with_background_image(png(&image)),
    );
    assert_eq!(surface.size(), Some([30, 20]));
    for (x, y) in [(0, 0), (15, 10), (29, 19)] {
        let [r, g, b, a] = pixel(&surface, x, y);
        assert!(r < 5 && g < 5 && b > 250 && a == 255, "({x}, {y})");
    }
}

#[test]
fn test_transparent_background_pixels_show_fill() {
    let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
    image.put_pixel(0, 0, Rgba([0, 0, 255, 255]));

    let mut surface = DrawingSurface::new();
    surface.configure(
        SurfaceConfig::new(
            AspectRatio::new(2, 1).unwrap(),
            Color32::from_gray(128),
            Vec2::new(2.0, 1.0),
        )
        .with_background_image(png(&image)),
    );
    assert_eq!(pixel(&surface, 0, 0), [0, 0, 255, 255]);
    assert_eq!(pixel(&surface, 1, 0), GRAY);
}

#[test]
fn test_undecodable_background_image_is_ignored() {
    let mut surface = DrawingSurface::new();
    surface.configure(
        SurfaceConfig::new(AspectRatio::SQUARE, Color32::from_gray(128), Vec2::new(8.0, 8.0))
            .with_background_image(b"not an image".to_vec()),
    );
    assert!(surface.is_initialized());
    assert_eq!(pixel(&surface, 4, 4), GRAY);
}

#[test]
fn test_background_image_survives_clear_and_undo() {
    let image = RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255]));
    let mut surface = DrawingSurface::new();
    surface.configure(
        SurfaceConfig::new(AspectRatio::SQUARE, Color32::from_gray(128), Vec2::new(8.0, 8.0))
            .with_background_image(png(&image)),
    );
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Transparent, 3.0));
    drag(&mut surface, Pos2::new(0.0, 4.0), Pos2::new(8.0, 4.0));
    assert_eq!(pixel(&surface, 4, 4), WHITE);

    surface.clear();
    assert_eq!(pixel(&surface, 4, 4), [0, 255, 0, 255]);

    drag(&mut surface, Pos2::new(0.0, 4.0), Pos2::new(8.0, 4.0));
    surface.undo();
    surface.undo();
    assert_eq!(pixel(&surface, 4, 4), [0, 255, 0, 255]);
}

#[test]
fn test_undo_during_drag_ends_it() {
    let mut surface = gray_square();
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Transparent, 4.0));
    surface.pointer_down(Pos2::new(5.0, 5.0));
    surface.pointer_move(Pos2::new(30.0, 30.0));
    surface.undo();
    assert!(!surface.is_drawing());

    surface.pointer_move(Pos2::new(60.0, 5.0));
    let image = surface.export_image().unwrap();
    assert!(image.pixels().all(|p| p.0 == GRAY));
}

#[test]
fn test_background_from_data_uri() {
    let image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 0, 255]));
    let uri = codec::to_data_uri(codec::PNG_MIME, &png(&image));

    let mut surface = DrawingSurface::new();
    surface.configure(
        SurfaceConfig::new(AspectRatio::SQUARE, Color32::from_gray(128), Vec2::new(8.0, 8.0))
            .with_background_data_uri(&uri),
    );
    assert_eq!(pixel(&surface, 3, 3), [255, 255, 0, 255]);

    let config = SurfaceConfig::new(AspectRatio::SQUARE, Color32::from_gray(128), Vec2::new(8.0, 8.0))
        .with_background_data_uri("data:image/png,not-base64");
    assert!(config.background_image.is_none());
}

#[test]
fn test_pointer_maps_one_to_one_until_display_size_is_set() {
    let mut surface = surface(
        AspectRatio::new(16, 9).unwrap(),
        Color32::BLACK,
        Vec2::new(320.0, 600.0),
    );
    surface.set_style(ToolStyle::new(Color32::WHITE, Fill::Transparent, 4.0));
    drag(&mut surface, Pos2::new(100.0, 100.0), Pos2::new(140.0, 100.0));
    assert_eq!(pixel(&surface, 120, 100), WHITE);

    // shown at half size: display (20, 20) is buffer (40, 40)
    surface.set_display_size(Vec2::new(160.0, 90.0));
    drag(&mut surface, Pos2::new(20.0, 20.0), Pos2::new(20.0, 40.0));
    assert_eq!(pixel(&surface, 40, 60), WHITE);
    assert_eq!(pixel(&surface, 20, 30), [0, 0, 0, 255]);
}
