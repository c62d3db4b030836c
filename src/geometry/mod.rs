mod aspect;
mod transform;

pub use aspect::{AspectRatio, AspectRatioError};
pub use transform::DisplayTransform;

use egui::{Pos2, Rect};
use std::f32::consts::PI;

/// Shortest arrowhead segment, in buffer pixels.
pub const ARROW_HEAD_MIN_LEN: f32 = 10.0;

/// Angle between the shaft and each arrowhead segment.
pub const ARROW_HEAD_HALF_ANGLE: f32 = PI / 6.0;

/// Axis-aligned rectangle spanned by two corners dragged in any direction.
pub fn corner_rect(a: Pos2, b: Pos2) -> Rect {
    Rect::from_two_pos(a, b)
}

pub fn circle_radius(center: Pos2, edge: Pos2) -> f32 {
    center.distance(edge)
}

/// The two far ends of an arrowhead drawn at `tip` for a shaft coming from `tail`.
pub fn arrow_head(tail: Pos2, tip: Pos2, stroke_width: f32) -> [Pos2; 2] {
    let head_len = ARROW_HEAD_MIN_LEN.max(stroke_width * 2.0);
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    let barb = |theta: f32| {
        Pos2::new(
            tip.x - head_len * theta.cos(),
            tip.y - head_len * theta.sin(),
        )
    };
    [
        barb(angle - ARROW_HEAD_HALF_ANGLE),
        barb(angle + ARROW_HEAD_HALF_ANGLE),
    ]
}
