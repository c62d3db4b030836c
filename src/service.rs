//! Boundary to the remote generative-image service.
//!
//! The service itself is opaque: requests go in, a result or a [`ServiceError`] comes out.
//! Failures are surfaced to the user and never retried here.

use crate::codec;
use crate::error::SurfaceResult;
use crate::geometry::AspectRatio;
use crate::state::{HistoryItem, ImageAnalysis};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The model returned nothing, usually because a safety policy blocked the request.
    #[error("The model returned no image; the request may have been blocked by safety policy")]
    Blocked,

    #[error("Invalid response from the service: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request failed: {0}")]
    Request(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// An image sent to the service, already decoded from its `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            mime_type: codec::PNG_MIME.to_owned(),
            data,
        }
    }

    pub fn from_data_uri(uri: &str) -> SurfaceResult<Self> {
        let (mime_type, data) = codec::from_data_uri(uri)?;
        Ok(Self { mime_type, data })
    }

    pub fn to_data_uri(&self) -> String {
        codec::to_data_uri(&self.mime_type, &self.data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub reference_images: Vec<InlineImage>,
    pub count: u32,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio,
            reference_images: Vec::new(),
            count: 4,
        }
    }

    pub fn with_reference(mut self, image: InlineImage) -> Self {
        self.reference_images.push(image);
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("prompt is empty".to_owned()));
        }
        if self.count == 0 {
            return Err(ServiceError::InvalidRequest("count must be positive".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: Uuid,
    /// `data:` URI of the result.
    pub src: String,
    pub alt: String,
    pub prompt: Option<String>,
}

impl GeneratedImage {
    pub fn new(src: impl Into<String>, prompt: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: src.into(),
            alt: prompt.clone().unwrap_or_default(),
            prompt,
        }
    }

    pub fn into_history_item(self, aspect_ratio: Option<AspectRatio>) -> HistoryItem {
        let mut item = HistoryItem::new(self.src, self.alt);
        item.id = self.id;
        item.prompt = self.prompt;
        item.aspect_ratio = aspect_ratio.map(|ratio| ratio.to_string());
        item
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub prompt: String,
    pub start_frame: Option<InlineImage>,
    pub end_frame: Option<InlineImage>,
    pub aspect_ratio: AspectRatio,
    pub duration_secs: u32,
}

impl VideoRequest {
    /// Ratios the video model accepts.
    pub const ASPECT_RATIOS: [&'static str; 3] = ["16:9", "1:1", "9:16"];

    pub fn validate(&self) -> ServiceResult<()> {
        let ratio = self.aspect_ratio.to_string();
        if !Self::ASPECT_RATIOS.contains(&ratio.as_str()) {
            return Err(ServiceError::InvalidRequest(format!(
                "unsupported video aspect ratio {ratio}"
            )));
        }
        if self.prompt.trim().is_empty() && self.start_frame.is_none() {
            return Err(ServiceError::InvalidRequest(
                "a prompt or a start frame is required".to_owned(),
            ));
        }
        if self.duration_secs == 0 {
            return Err(ServiceError::InvalidRequest("duration must be positive".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    pub id: Uuid,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub timestamp: u64,
}

/// Asynchronous generative operations consumed by the studio.
pub trait GenerativeService: Send + Sync {
    fn generate_images(&self, request: ImageRequest) -> BoxFuture<'_, ServiceResult<Vec<GeneratedImage>>>;

    fn remove_background(
        &self,
        image: InlineImage,
        add_green_screen: bool,
    ) -> BoxFuture<'_, ServiceResult<GeneratedImage>>;

    fn optimize_prompt(&self, prompt: String) -> BoxFuture<'_, ServiceResult<String>>;

    fn analyze_image(&self, image: InlineImage) -> BoxFuture<'_, ServiceResult<ImageAnalysis>>;

    fn generate_video(&self, request: VideoRequest) -> BoxFuture<'_, ServiceResult<GeneratedVideo>>;
}

/// Normalize an image-generation result: nothing back means the request was blocked, and
/// requests with reference images only ever yield a single edit.
pub fn require_images(
    mut images: Vec<GeneratedImage>,
    request: &ImageRequest,
) -> ServiceResult<Vec<GeneratedImage>> {
    if images.is_empty() {
        return Err(ServiceError::Blocked);
    }
    if !request.reference_images.is_empty() {
        images.truncate(1);
    }
    Ok(images)
}
