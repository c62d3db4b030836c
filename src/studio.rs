use crate::geometry::AspectRatio;
use crate::service::{
    GeneratedVideo,
    GenerativeService,
    ImageRequest,
    InlineImage,
    ServiceError,
    ServiceResult,
    VideoRequest,
    require_images,
};
use crate::state::{HistoryItem, HistoryStore, ImageAnalysis, PersistenceError};
use crate::surface::DrawingSurface;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("No generative service is configured")]
    NoService,

    #[error("The canvas is not ready")]
    CanvasUnavailable,

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Results were kept in memory but could not be saved.
    #[error("Saved in memory only: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Owns the drawing surface and the artifact history, and routes drawings through the
/// generative service.
pub struct Studio {
    surface: DrawingSurface,
    history: HistoryStore,
    service: Option<Arc<dyn GenerativeService>>,
}

impl Studio {
    pub fn new(surface: DrawingSurface, history: HistoryStore) -> Self {
        Self {
            surface,
            history,
            service: None,
        }
    }

    pub fn with_service(mut self, service: Arc<dyn GenerativeService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn service(&self) -> Option<Arc<dyn GenerativeService>> {
        self.service.clone()
    }

    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    /// The current drawing as a PNG reference image.
    pub fn drawing(&self) -> Result<InlineImage, StudioError> {
        self.surface
            .export_png()
            .map(InlineImage::png)
            .ok_or(StudioError::CanvasUnavailable)
    }

    /// Build a generation request that uses the drawing as its only reference image.
    pub fn reference_request(&self, prompt: &str, count: u32) -> Result<ImageRequest, StudioError> {
        let config = self.surface.config().ok_or(StudioError::CanvasUnavailable)?;
        let request = ImageRequest::new(prompt, config.aspect_ratio)
            .with_reference(self.drawing()?)
            .with_count(count);
        request.validate()?;
        Ok(request)
    }

    /// Store the drawing itself as a history item.
    pub fn save_drawing(&mut self) -> Result<HistoryItem, StudioError> {
        let src = self.surface.export();
        if src.is_empty() {
            return Err(StudioError::CanvasUnavailable);
        }
        let mut item = HistoryItem::new(src, "drawing");
        if let Some(config) = self.surface.config() {
            item = item.with_aspect_ratio(config.aspect_ratio);
        }
        self.record(vec![item.clone()])?;
        Ok(item)
    }

    /// Put finished items at the front of the history.
    ///
    /// A persistence failure is returned, but the items stay in the in-memory list.
    pub fn record(&mut self, items: Vec<HistoryItem>) -> Result<(), StudioError> {
        log::info!("Recording {} new history item(s)", items.len());
        self.history.append(items)?;
        Ok(())
    }

    /// Build a video request that starts from the drawing.
    pub fn video_request(&self, prompt: &str, duration_secs: u32) -> Result<VideoRequest, StudioError> {
        let config = self.surface.config().ok_or(StudioError::CanvasUnavailable)?;
        let request = VideoRequest {
            prompt: prompt.trim().to_owned(),
            start_frame: Some(self.drawing()?),
            end_frame: None,
            aspect_ratio: config.aspect_ratio,
            duration_secs,
        };
        request.validate()?;
        Ok(request)
    }

    /// Generate images from a prompt with the drawing as reference, and keep the results.
    pub async fn use_drawing_as_reference(
        &mut self,
        prompt: &str,
        count: u32,
    ) -> Result<Vec<HistoryItem>, StudioError> {
        let service = self.service.clone().ok_or(StudioError::NoService)?;
        let request = self.reference_request(prompt, count)?;
        let items = generate_items(service, request).await?;
        self.record(items.clone())?;
        Ok(items)
    }

    /// Remove the drawing's background and keep the result.
    pub async fn remove_drawing_background(
        &mut self,
        add_green_screen: bool,
    ) -> Result<HistoryItem, StudioError> {
        let service = self.service.clone().ok_or(StudioError::NoService)?;
        let drawing = self.drawing()?;
        let aspect_ratio = self.surface.config().map(|config| config.aspect_ratio);
        let item = remove_background_item(service, drawing, add_green_screen, aspect_ratio).await?;
        self.record(vec![item.clone()])?;
        Ok(item)
    }

    /// Analyze a history item and attach the result to it.
    ///
    /// Returns `None` when the item was removed while the analysis ran.
    pub async fn analyze_history_item(&mut self, id: Uuid) -> Result<Option<ImageAnalysis>, StudioError> {
        let service = self.service.clone().ok_or(StudioError::NoService)?;
        let src = self
            .history
            .get(id)
            .map(|item| item.src.clone())
            .ok_or_else(|| ServiceError::InvalidRequest(format!("no history item {id}")))?;
        let analysis = analyze_image(service, src).await?;
        self.attach_analysis(id, analysis)
    }

    /// Store an analysis on its item; `None` if the item no longer exists.
    pub fn attach_analysis(
        &mut self,
        id: Uuid,
        analysis: ImageAnalysis,
    ) -> Result<Option<ImageAnalysis>, StudioError> {
        let found = self.history.set_analysis(id, analysis.clone())?;
        Ok(found.then_some(analysis))
    }
}

// Service round trips. Each owns its inputs so it can run on a background task; the caller
// applies the result to the studio afterwards.

/// Generate images and turn them into history items tagged with the request's ratio.
pub async fn generate_items(
    service: Arc<dyn GenerativeService>,
    request: ImageRequest,
) -> ServiceResult<Vec<HistoryItem>> {
    request.validate()?;
    let aspect_ratio = request.aspect_ratio;
    let images = service
        .generate_images(request.clone())
        .await
        .inspect_err(|err| log::warn!("Image generation failed: {}", err))?;
    let images = require_images(images, &request)?;
    Ok(images
        .into_iter()
        .map(|image| image.into_history_item(Some(aspect_ratio)))
        .collect())
}

pub async fn remove_background_item(
    service: Arc<dyn GenerativeService>,
    image: InlineImage,
    add_green_screen: bool,
    aspect_ratio: Option<AspectRatio>,
) -> ServiceResult<HistoryItem> {
    let image = service
        .remove_background(image, add_green_screen)
        .await
        .inspect_err(|err| log::warn!("Background removal failed: {}", err))?;
    Ok(image.into_history_item(aspect_ratio))
}

/// Rewrite a prompt. Blank prompts are rejected without calling the service.
pub async fn optimize_prompt(service: Arc<dyn GenerativeService>, prompt: String) -> ServiceResult<String> {
    let prompt = prompt.trim().to_owned();
    if prompt.is_empty() {
        return Err(ServiceError::InvalidRequest("prompt is empty".to_owned()));
    }
    let optimized = service
        .optimize_prompt(prompt)
        .await
        .inspect_err(|err| log::warn!("Prompt optimization failed: {}", err))?;
    let optimized = optimized.trim();
    if optimized.is_empty() {
        return Err(ServiceError::InvalidResponse("empty prompt".to_owned()));
    }
    Ok(optimized.to_owned())
}

/// Analyze the image behind a `data:` URI.
pub async fn analyze_image(service: Arc<dyn GenerativeService>, src: String) -> ServiceResult<ImageAnalysis> {
    let image = InlineImage::from_data_uri(&src)
        .map_err(|err| ServiceError::InvalidRequest(err.to_string()))?;
    service
        .analyze_image(image)
        .await
        .inspect_err(|err| log::warn!("Image analysis failed: {}", err))
}

pub async fn generate_video(
    service: Arc<dyn GenerativeService>,
    request: VideoRequest,
) -> ServiceResult<GeneratedVideo> {
    request.validate()?;
    service
        .generate_video(request)
        .await
        .inspect_err(|err| log::warn!("Video generation failed: {}", err))
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("surface", &self.surface)
            .field("history", &self.history)
            .field("has_service", &self.has_service())
            .finish()
    }
}
