use crate::codec;
use crate::error::SurfaceError;
use crate::surface::DrawingSurface;
use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Longest side of a history thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 128;

/// Errors that can occur while turning pixels into a texture image
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("The canvas is not configured")]
    NotConfigured,
    #[error("Failed to read the canvas pixels")]
    ExportFailed,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] SurfaceError),
}

impl From<image::ImageError> for TextureError {
    fn from(err: image::ImageError) -> Self {
        TextureError::Decode(err.into())
    }
}

/// Convert the surface buffer into an egui image.
pub fn canvas_image(surface: &DrawingSurface) -> Result<ColorImage, TextureError> {
    if !surface.is_initialized() {
        return Err(TextureError::NotConfigured);
    }
    let image = surface.export_image().ok_or(TextureError::ExportFailed)?;
    let size = [image.width() as usize, image.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

/// Decode a `data:` URI into a thumbnail no larger than `max_side` on either axis.
pub fn decode_thumbnail(src: &str, max_side: u32) -> Result<ColorImage, TextureError> {
    let (_, bytes) = codec::from_data_uri(src)?;
    let image = image::load_from_memory(&bytes)?
        .thumbnail(max_side, max_side)
        .to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

/// The GPU copy of the drawing surface, re-uploaded only when its revision changes.
#[derive(Default)]
pub struct CanvasTexture {
    handle: Option<TextureHandle>,
    revision: Option<u64>,
}

impl CanvasTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, surface: &DrawingSurface) -> bool {
        self.handle.is_none() || self.revision != Some(surface.revision())
    }

    /// Upload the surface if it changed and return the texture to paint.
    pub fn sync(&mut self, ctx: &Context, surface: &DrawingSurface) -> Option<TextureId> {
        if !self.is_stale(surface) {
            return self.handle.as_ref().map(TextureHandle::id);
        }

        let image = match canvas_image(surface) {
            Ok(image) => image,
            Err(TextureError::NotConfigured) => {
                self.clear();
                return None;
            }
            Err(err) => {
                log::error!("Canvas upload failed: {}", err);
                return self.handle.as_ref().map(TextureHandle::id);
            }
        };

        match self.handle.as_mut() {
            Some(handle) if handle.size() == image.size => {
                handle.set(image, TextureOptions::LINEAR);
            }
            _ => {
                log::debug!("Allocating canvas texture {:?}", image.size);
                self.handle = Some(ctx.load_texture("canvas", image, TextureOptions::LINEAR));
            }
        }
        self.revision = Some(surface.revision());
        self.handle.as_ref().map(TextureHandle::id)
    }

    pub fn clear(&mut self) {
        self.handle = None;
        self.revision = None;
    }
}

/// Caches history thumbnails by item id, evicting the least recently used
pub struct ThumbnailCache {
    textures: HashMap<Uuid, TextureHandle>,
    last_used: HashMap<Uuid, u64>,
    /// Items whose image would not decode; not retried every frame.
    failed: HashSet<Uuid>,
    current_frame: u64,
    max_cache_size: usize,
}

impl ThumbnailCache {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            textures: HashMap::new(),
            last_used: HashMap::new(),
            failed: HashSet::new(),
            current_frame: 0,
            max_cache_size,
        }
    }

    /// Should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    pub fn get_or_create(&mut self, ctx: &Context, id: Uuid, src: &str) -> Option<TextureId> {
        if let Some(handle) = self.textures.get(&id) {
            self.last_used.insert(id, self.current_frame);
            return Some(handle.id());
        }
        if self.failed.contains(&id) {
            return None;
        }

        let image = match decode_thumbnail(src, THUMBNAIL_SIZE) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("No thumbnail for {}: {}", id, err);
                self.failed.insert(id);
                return None;
            }
        };

        self.prune_to(self.max_cache_size.saturating_sub(1));
        let handle = ctx.load_texture(format!("thumbnail_{id}"), image, TextureOptions::LINEAR);
        let texture_id = handle.id();
        self.textures.insert(id, handle);
        self.last_used.insert(id, self.current_frame);
        Some(texture_id)
    }

    pub fn invalidate(&mut self, id: Uuid) {
        self.textures.remove(&id);
        self.last_used.remove(&id);
        self.failed.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.textures.contains_key(&id)
    }

    fn prune_to(&mut self, limit: usize) {
        if self.textures.len() <= limit {
            return;
        }

        // oldest first
        let mut entries: Vec<(Uuid, u64)> = self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len().saturating_sub(limit);
        for (id, _) in entries.into_iter().take(to_remove) {
            self.textures.remove(&id);
            self.last_used.remove(&id);
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.last_used.clear();
        self.failed.clear();
    }
}
