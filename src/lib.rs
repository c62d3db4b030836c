#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod codec;
pub mod color;
pub mod components;
pub mod error;
pub mod geometry;
pub mod input;
pub mod panels;
pub mod service;
pub mod state;
pub mod studio;
pub mod surface;
pub mod textures;
pub mod tool;
pub mod util;

pub use app::StudioApp;
pub use color::Fill;
pub use error::{SurfaceError, SurfaceResult};
pub use geometry::{AspectRatio, DisplayTransform};
pub use input::{InputEvent, InputHandler};
pub use service::{GenerativeService, ServiceError};
pub use state::{AppSettings, HistoryItem, HistoryStore};
pub use studio::{Studio, StudioError};
pub use surface::{DrawingSurface, SurfaceConfig};
pub use tool::{DrawTool, ToolStyle};
