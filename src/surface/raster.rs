//! Painting primitives on top of tiny-skia.

use crate::geometry;
use crate::tool::{DrawTool, ToolStyle};
use egui::{Color32, Pos2};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// A parametric shape spanned by a drag from `origin` to `current`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rectangle { a: Pos2, b: Pos2 },
    Circle { center: Pos2, radius: f32 },
    Arrow { tail: Pos2, tip: Pos2 },
}

impl Shape {
    /// Shape for a shape tool dragged from `origin` to `current`.
    ///
    /// A drag that has not left its origin yields `None`: degenerate shapes draw nothing.
    pub fn from_drag(tool: DrawTool, origin: Pos2, current: Pos2) -> Option<Self> {
        if origin == current {
            return None;
        }
        match tool {
            DrawTool::Brush => None,
            DrawTool::Rectangle => Some(Shape::Rectangle { a: origin, b: current }),
            DrawTool::Circle => Some(Shape::Circle {
                center: origin,
                radius: geometry::circle_radius(origin, current),
            }),
            DrawTool::Arrow => Some(Shape::Arrow { tail: origin, tip: current }),
        }
    }

    fn path(&self, stroke_width: f32) -> Option<Path> {
        match *self {
            Shape::Rectangle { a, b } => {
                let rect = geometry::corner_rect(a, b);
                let mut pb = PathBuilder::new();
                pb.move_to(rect.min.x, rect.min.y);
                pb.line_to(rect.max.x, rect.min.y);
                pb.line_to(rect.max.x, rect.max.y);
                pb.line_to(rect.min.x, rect.max.y);
                pb.close();
                pb.finish()
            }
            Shape::Circle { center, radius } => PathBuilder::from_circle(center.x, center.y, radius),
            Shape::Arrow { tail, tip } => {
                let [upper, lower] = geometry::arrow_head(tail, tip, stroke_width);
                let mut pb = PathBuilder::new();
                pb.move_to(tail.x, tail.y);
                pb.line_to(tip.x, tip.y);
                pb.line_to(upper.x, upper.y);
                pb.move_to(tip.x, tip.y);
                pb.line_to(lower.x, lower.y);
                pb.finish()
            }
        }
    }
}

pub fn skia_color(color: Color32) -> Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color::from_rgba8(r, g, b, a)
}

fn paint_for(color: Color32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn stroke_for(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// Allocate a buffer filled with `background`.
pub fn filled_pixmap(width: u32, height: u32, background: Color32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    pixmap.fill(skia_color(background));
    Some(pixmap)
}

/// Composite `overlay` on top of `target`, both at the same size.
pub fn composite(target: &mut Pixmap, overlay: &Pixmap) {
    target.draw_pixmap(
        0,
        0,
        overlay.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

/// Overwrite `target` with the pixels of `source`. Sizes must match.
pub fn restore(target: &mut Pixmap, source: &Pixmap) -> bool {
    if target.width() != source.width() || target.height() != source.height() {
        return false;
    }
    target.data_mut().copy_from_slice(source.data());
    true
}

/// Stroke a brush polyline in one pass, so overlapping joints blend once.
///
/// Fewer than two distinct points draw nothing.
pub fn stroke_polyline(pixmap: &mut Pixmap, points: &[Pos2], style: &ToolStyle) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    if style.width <= 0.0 || rest.iter().all(|p| p == first) {
        return;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    pixmap.stroke_path(
        &path,
        &paint_for(style.stroke_color),
        &stroke_for(style.width),
        Transform::identity(),
        None,
    );
}

/// Fill (unless transparent) and then stroke a shape.
pub fn draw_shape(pixmap: &mut Pixmap, shape: &Shape, style: &ToolStyle) {
    let Some(path) = shape.path(style.width) else {
        log::trace!("Skipping shape with an empty path: {:?}", shape);
        return;
    };

    if let Some(fill) = style.fill.color() {
        pixmap.fill_path(
            &path,
            &paint_for(fill),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    if style.width > 0.0 {
        pixmap.stroke_path(
            &path,
            &paint_for(style.stroke_color),
            &stroke_for(style.width),
            Transform::identity(),
            None,
        );
    }
}
