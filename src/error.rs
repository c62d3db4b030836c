use thiserror::Error;

/// Failures inside the raster pipeline.
///
/// These never cross the `DrawingSurface` API: the surface logs them and degrades to a
/// no-op. They are public so hosts can use the codec helpers directly.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Cannot allocate a {width}x{height} raster")]
    Allocation { width: u32, height: u32 },
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;
