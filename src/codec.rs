//! Conversions between the premultiplied raster buffer, `image` crate types and
//! `data:` URIs.

use crate::error::{SurfaceError, SurfaceResult};
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage, imageops::FilterType};
use std::io::Cursor;
use tiny_skia::{ColorU8, IntSize, Pixmap};

pub const PNG_MIME: &str = "image/png";

/// Copy a premultiplied pixmap into a straight-alpha RGBA image.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> SurfaceResult<RgbaImage> {
    let mut raw = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw).ok_or(SurfaceError::Allocation {
        width: pixmap.width(),
        height: pixmap.height(),
    })
}

/// Premultiply a straight-alpha image into a pixmap.
pub fn rgba_to_pixmap(image: &RgbaImage) -> SurfaceResult<Pixmap> {
    let (width, height) = image.dimensions();
    let allocation = SurfaceError::Allocation { width, height };

    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let color = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let size = IntSize::from_wh(width, height).ok_or(allocation)?;
    Pixmap::from_vec(data, size).ok_or(SurfaceError::Allocation { width, height })
}

/// Decode any supported still image and stretch it to exactly `width` x `height`.
pub fn decode_stretched(bytes: &[u8], width: u32, height: u32) -> SurfaceResult<Pixmap> {
    let decoded = image::load_from_memory(bytes)?;
    let stretched = if decoded.dimensions() == (width, height) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };
    rgba_to_pixmap(&stretched.to_rgba8())
}

/// Pixel dimensions of an encoded image.
pub fn image_dimensions(bytes: &[u8]) -> SurfaceResult<(u32, u32)> {
    Ok(image::load_from_memory(bytes)?.dimensions())
}

pub fn encode_png(image: &RgbaImage) -> SurfaceResult<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(image.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

/// Split a base64 `data:` URI into its MIME type and decoded payload.
pub fn from_data_uri(uri: &str) -> SurfaceResult<(String, Vec<u8>)> {
    let invalid = || SurfaceError::InvalidDataUri(truncate_for_log(uri));

    let (header, payload) = uri.split_once(',').ok_or_else(invalid)?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.strip_suffix(";base64"))
        .ok_or_else(invalid)?;
    if mime.is_empty() {
        return Err(invalid());
    }

    let bytes = general_purpose::STANDARD.decode(payload.trim())?;
    Ok((mime.to_owned(), bytes))
}

/// Decoded byte count of a base64 `data:` URI, computed from the payload length alone.
pub fn data_uri_payload_size(uri: &str) -> usize {
    let Some((_, payload)) = uri.split_once(',') else {
        return 0;
    };
    let payload = payload.trim();
    let padding = payload.len() - payload.trim_end_matches('=').len();
    (payload.len() * 3 / 4).saturating_sub(padding.min(2))
}

fn truncate_for_log(uri: &str) -> String {
    const MAX: usize = 48;
    match uri.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &uri[..idx]),
        None => uri.to_owned(),
    }
}
