use egui::{Pos2, Vec2};

/// Maps display-space pointer positions onto buffer pixels.
///
/// The buffer has a fixed resolution chosen at configure time while the host may show it
/// at any on-screen size, so pointer coordinates are scaled per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    scale: Vec2,
}

impl DisplayTransform {
    pub const IDENTITY: DisplayTransform = DisplayTransform { scale: Vec2::new(1.0, 1.0) };

    /// Scale factors for a buffer of `buffer_size` pixels shown at `display_size` points.
    pub fn new(buffer_size: [u32; 2], display_size: Vec2) -> Self {
        if display_size.x <= 0.0 || display_size.y <= 0.0 {
            return Self::IDENTITY;
        }
        Self {
            scale: Vec2::new(
                buffer_size[0] as f32 / display_size.x,
                buffer_size[1] as f32 / display_size.y,
            ),
        }
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn to_buffer(&self, display: Pos2) -> Pos2 {
        Pos2::new(display.x * self.scale.x, display.y * self.scale.y)
    }
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
