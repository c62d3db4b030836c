use egui::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AspectRatioError {
    #[error("aspect ratio must look like 'w:h': {0}")]
    Malformed(String),

    #[error("aspect ratio terms must be positive: {0}")]
    NonPositive(String),
}

/// Ratio of two positive integers, e.g. 16:9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio { width: 1, height: 1 };

    /// Ratios offered by the canvas picker, widest first.
    pub const PRESETS: [AspectRatio; 9] = [
        AspectRatio { width: 11, height: 6 },
        AspectRatio { width: 16, height: 9 },
        AspectRatio { width: 3, height: 2 },
        AspectRatio { width: 4, height: 3 },
        AspectRatio { width: 1, height: 1 },
        AspectRatio { width: 3, height: 4 },
        AspectRatio { width: 2, height: 3 },
        AspectRatio { width: 9, height: 16 },
        AspectRatio { width: 6, height: 11 },
    ];

    pub fn new(width: u32, height: u32) -> Result<Self, AspectRatioError> {
        if width == 0 || height == 0 {
            return Err(AspectRatioError::NonPositive(format!("{width}:{height}")));
        }
        Ok(Self { width, height })
    }

    /// Reduce pixel dimensions to their simplest ratio, so 1920x1080 becomes 16:9.
    pub fn from_dimensions(width: u32, height: u32) -> Result<Self, AspectRatioError> {
        if width == 0 || height == 0 {
            return Err(AspectRatioError::NonPositive(format!("{width}:{height}")));
        }
        let divisor = gcd(width, height);
        Ok(Self {
            width: width / divisor,
            height: height / divisor,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_f32(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Largest buffer size with this ratio that fits inside `container`.
    ///
    /// When the container is relatively wider than the ratio the height is pinned to the
    /// container, otherwise the width is. The derived side is truncated; neither side is
    /// ever smaller than one pixel.
    pub fn fit_inside(&self, container: Vec2) -> [u32; 2] {
        let container_w = f64::from(container.x.max(1.0));
        let container_h = f64::from(container.y.max(1.0));
        let ratio_w = f64::from(self.width);
        let ratio_h = f64::from(self.height);

        let (w, h) = if container_w * ratio_h > container_h * ratio_w {
            (container_h * ratio_w / ratio_h, container_h)
        } else {
            (container_w, container_w * ratio_h / ratio_w)
        };

        [(w as u32).max(1), (h as u32).max(1)]
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = AspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| AspectRatioError::Malformed(s.to_owned()))?;
        let w: u32 = w
            .trim()
            .parse()
            .map_err(|_| AspectRatioError::Malformed(s.to_owned()))?;
        let h: u32 = h
            .trim()
            .parse()
            .map_err(|_| AspectRatioError::Malformed(s.to_owned()))?;
        Self::new(w, h)
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let ratio: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(ratio.width(), 16);
        assert_eq!(ratio.height(), 9);
        assert_eq!(ratio.to_string(), "16:9");

        assert!(matches!("16x9".parse::<AspectRatio>(), Err(AspectRatioError::Malformed(_))));
        assert!(matches!("0:9".parse::<AspectRatio>(), Err(AspectRatioError::NonPositive(_))));
    }

    #[test]
    fn test_from_dimensions_simplifies() {
        assert_eq!(
            AspectRatio::from_dimensions(1920, 1080).unwrap(),
            AspectRatio::new(16, 9).unwrap()
        );
        assert_eq!(AspectRatio::from_dimensions(512, 512).unwrap(), AspectRatio::SQUARE);
    }

    #[test]
    fn test_fit_inside_wide_container_pins_height() {
        let ratio = AspectRatio::SQUARE;
        assert_eq!(ratio.fit_inside(Vec2::new(800.0, 400.0)), [400, 400]);
    }

    #[test]
    fn test_fit_inside_tall_container_pins_width() {
        let ratio = AspectRatio::new(16, 9).unwrap();
        assert_eq!(ratio.fit_inside(Vec2::new(320.0, 600.0)), [320, 180]);
    }

    #[test]
    fn test_fit_inside_never_exceeds_container() {
        let container = Vec2::new(613.0, 417.0);
        for ratio in AspectRatio::PRESETS {
            let [w, h] = ratio.fit_inside(container);
            assert!(w as f32 <= container.x && h as f32 <= container.y, "{ratio}");
            assert!(w >= 1 && h >= 1);
        }
    }
}
