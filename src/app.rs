use crate::codec;
use crate::geometry::AspectRatio;
use crate::input::{self, InputEvent, InputHandler};
use crate::panels;
use crate::service::{GeneratedVideo, GenerativeService, ServiceError, ServiceResult};
use crate::state::{AppSettings, HistoryItem, HistoryStore, ImageAnalysis, MemoryBlobStore};
use crate::studio::{self, Studio, StudioError};
use crate::surface::{DrawingSurface, SurfaceConfig};
use crate::textures::{CanvasTexture, ThumbnailCache};
use crate::tool::{DrawTool, ToolStyle};
use crate::util::time;
use egui::{Color32, Rect, Vec2};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use uuid::Uuid;

/// Where exported drawings are written.
pub const EXPORT_FILE: &str = "drawing.png";

/// History location when the settings do not name one.
#[cfg(not(target_arch = "wasm32"))]
pub const DEFAULT_DATA_DIR: &str = "canvas_studio_data";

/// How long a status message stays visible.
const STATUS_SECS: f64 = 6.0;

/// Number of images requested per generation.
const GENERATION_COUNT: u32 = 4;

/// Length of clips generated from the drawing.
const VIDEO_SECS: u32 = 5;

const THUMBNAIL_CACHE_SIZE: usize = 32;

/// What a finished background job hands back to the UI thread.
#[derive(Debug)]
enum JobOutput {
    Items(Vec<HistoryItem>),
    Prompt(String),
    Analysis(Uuid, ImageAnalysis),
    Video(GeneratedVideo),
}

type JobResult = ServiceResult<JobOutput>;

struct PendingJob {
    label: &'static str,
    receiver: Receiver<JobResult>,
}

#[derive(Debug, Clone)]
pub(crate) struct Status {
    pub message: String,
    pub is_error: bool,
    shown_at: f64,
}

pub struct StudioApp {
    pub(crate) settings: AppSettings,
    pub(crate) studio: Studio,
    pub(crate) input: InputHandler,
    pub(crate) canvas_texture: CanvasTexture,
    pub(crate) thumbnails: ThumbnailCache,
    /// Encoded image stretched over the background; not persisted.
    pub(crate) background_image: Option<Vec<u8>>,
    /// Last solid fill, restored when the transparent toggle is switched off.
    pub(crate) fill_color: Color32,
    pub(crate) prompt: String,
    /// Most recent generated clip.
    pub(crate) last_video: Option<GeneratedVideo>,
    status: Option<Status>,
    pending: Option<PendingJob>,
    needs_configure: bool,
}

impl StudioApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: AppSettings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        Self::from_settings(settings)
    }

    pub fn from_settings(settings: AppSettings) -> Self {
        let history = open_history(&settings);
        log::info!("Loaded {} history items", history.len());
        Self::with_history(settings, history)
    }

    pub fn with_history(settings: AppSettings, history: HistoryStore) -> Self {
        let settings = settings.sanitized();
        let surface = DrawingSurface::with_tool(settings.tool, settings.style);

        Self {
            fill_color: settings.style.fill.color().unwrap_or(Color32::RED),
            settings,
            studio: Studio::new(surface, history),
            input: InputHandler::new(Rect::NOTHING),
            canvas_texture: CanvasTexture::new(),
            thumbnails: ThumbnailCache::new(THUMBNAIL_CACHE_SIZE),
            background_image: None,
            prompt: String::new(),
            last_video: None,
            status: None,
            pending: None,
            needs_configure: true,
        }
    }

    pub fn with_service(mut self, service: Arc<dyn GenerativeService>) -> Self {
        self.studio = self.studio.with_service(service);
        self
    }

    pub fn studio(&self) -> &Studio {
        &self.studio
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Rebuild the canvas on the next frame, e.g. after the aspect ratio or background changed.
    pub fn request_reconfigure(&mut self) {
        self.needs_configure = true;
    }

    /// Configure the surface for `area` if a rebuild is pending.
    pub fn ensure_canvas(&mut self, area: Vec2) {
        if !self.needs_configure {
            return;
        }
        let mut config = SurfaceConfig::new(self.settings.aspect_ratio, self.settings.background, area);
        if let Some(bytes) = &self.background_image {
            config = config.with_background_image(bytes.clone());
        }
        self.studio.surface_mut().configure(config);
        self.needs_configure = false;
    }

    pub fn set_tool(&mut self, tool: DrawTool) {
        log::debug!("Tool selected: {}", tool.name());
        self.settings.tool = tool;
        self.studio.surface_mut().set_tool(tool);
    }

    pub fn set_style(&mut self, style: ToolStyle) {
        let style = style.clamped();
        if let Some(color) = style.fill.color() {
            self.fill_color = color;
        }
        self.settings.style = style;
        self.studio.surface_mut().set_style(style);
    }

    pub fn handle_canvas_input(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        for event in self.input.process_input(ctx) {
            if typing && event == InputEvent::Undo {
                continue;
            }
            input::dispatch(event, self.studio.surface_mut());
        }
    }

    pub fn undo(&mut self) {
        self.studio.surface_mut().undo();
    }

    pub fn clear(&mut self) {
        self.studio.surface_mut().clear();
    }

    /// Write the drawing to disk and keep it in history.
    pub fn export(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let Some(png) = self.studio.surface().export_png() else {
                self.report(StudioError::CanvasUnavailable);
                return;
            };
            if let Err(err) = std::fs::write(EXPORT_FILE, png) {
                log::error!("Failed to write {}: {}", EXPORT_FILE, err);
                self.report_message(format!("Could not write {EXPORT_FILE}: {err}"));
                return;
            }
            log::info!("Exported drawing to {}", EXPORT_FILE);
        }

        match self.studio.save_drawing() {
            Ok(_) => self.notify("Drawing exported"),
            Err(err) => self.report(err),
        }
    }

    /// Stretch a history image over the canvas background and match its aspect ratio.
    pub fn use_as_background(&mut self, id: Uuid) {
        let Some(item) = self.studio.history().get(id) else {
            return;
        };
        let ratio: Option<AspectRatio> = item.aspect_ratio.as_deref().and_then(|ratio| ratio.parse().ok());
        match codec::from_data_uri(&item.src) {
            Ok((_, bytes)) => {
                self.background_image = Some(bytes);
                if let Some(ratio) = ratio {
                    self.settings.aspect_ratio = ratio;
                }
                self.request_reconfigure();
                self.notify("Background updated");
            }
            Err(err) => {
                log::warn!("Cannot use {} as background: {}", id, err);
                self.report_message(format!("Cannot use this image: {err}"));
            }
        }
    }

    pub fn clear_background_image(&mut self) {
        if self.background_image.take().is_some() {
            self.request_reconfigure();
        }
    }

    pub fn remove_history_item(&mut self, id: Uuid) {
        self.thumbnails.invalidate(id);
        if let Err(err) = self.studio.history_mut().remove(id) {
            self.report(err.into());
        }
    }

    pub fn clear_history(&mut self) {
        self.thumbnails.clear();
        if let Err(err) = self.studio.history_mut().clear() {
            self.report(err.into());
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn busy_label(&self) -> Option<&'static str> {
        self.pending.as_ref().map(|job| job.label)
    }

    /// Generate images from the prompt with the drawing as the reference image.
    pub fn generate_from_drawing(&mut self, ctx: &egui::Context) {
        let Some(service) = self.service_or_report() else {
            return;
        };
        match self.studio.reference_request(&self.prompt, GENERATION_COUNT) {
            Ok(request) => {
                let job = studio::generate_items(service, request).map(|r| r.map(JobOutput::Items));
                self.start_job("Generating", ctx, job.boxed());
            }
            Err(err) => self.report(err),
        }
    }

    pub fn remove_background(&mut self, ctx: &egui::Context, add_green_screen: bool) {
        let Some(service) = self.service_or_report() else {
            return;
        };
        let aspect_ratio = self.studio.surface().config().map(|config| config.aspect_ratio);
        match self.studio.drawing() {
            Ok(drawing) => {
                let job = studio::remove_background_item(service, drawing, add_green_screen, aspect_ratio)
                    .map(|r| r.map(|item| JobOutput::Items(vec![item])));
                self.start_job("Removing background", ctx, job.boxed());
            }
            Err(err) => self.report(err),
        }
    }

    /// Ask the service for a better prompt; the result replaces the prompt text.
    pub fn optimize_prompt(&mut self, ctx: &egui::Context) {
        let Some(service) = self.service_or_report() else {
            return;
        };
        let job = studio::optimize_prompt(service, self.prompt.clone()).map(|r| r.map(JobOutput::Prompt));
        self.start_job("Optimizing prompt", ctx, job.boxed());
    }

    /// Score a history image and attach the analysis to it.
    pub fn analyze(&mut self, ctx: &egui::Context, id: Uuid) {
        let Some(service) = self.service_or_report() else {
            return;
        };
        let Some(src) = self.studio.history().get(id).map(|item| item.src.clone()) else {
            return;
        };
        let job = studio::analyze_image(service, src).map(move |r| r.map(|a| JobOutput::Analysis(id, a)));
        self.start_job("Analyzing", ctx, job.boxed());
    }

    /// Animate the drawing into a short clip guided by the prompt.
    pub fn generate_video(&mut self, ctx: &egui::Context) {
        let Some(service) = self.service_or_report() else {
            return;
        };
        match self.studio.video_request(&self.prompt, VIDEO_SECS) {
            Ok(request) => {
                let job = studio::generate_video(service, request).map(|r| r.map(JobOutput::Video));
                self.start_job("Generating video", ctx, job.boxed());
            }
            Err(err) => self.report(err),
        }
    }

    fn service_or_report(&mut self) -> Option<Arc<dyn GenerativeService>> {
        let service = self.studio.service();
        if service.is_none() {
            self.report(StudioError::NoService);
        }
        service
    }

    fn start_job(&mut self, label: &'static str, ctx: &egui::Context, job: BoxFuture<'static, JobResult>) {
        if self.is_busy() {
            log::warn!("{} ignored, another job is running", label);
            return;
        }
        let (sender, receiver) = mpsc::channel();
        let ctx = ctx.clone();
        let task = async move {
            let result = job.await;
            if sender.send(result).is_err() {
                log::debug!("Job result dropped, the app is gone");
            }
            ctx.request_repaint();
        };

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || futures::executor::block_on(task));
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);

        log::info!("{} started", label);
        self.pending = Some(PendingJob { label, receiver });
    }

    fn poll_jobs(&mut self) {
        let Some(job) = &self.pending else {
            return;
        };
        let label = job.label;
        let result = match job.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(ServiceError::Request(
                "the job stopped without a result".to_owned(),
            )),
        };
        self.pending = None;

        match result.map_err(StudioError::from).and_then(|output| self.apply(output)) {
            Ok(message) => self.notify(format!("{label} finished: {message}")),
            Err(err) => self.report(err),
        }
    }

    /// Fold a finished job into the app state and describe what changed.
    fn apply(&mut self, output: JobOutput) -> Result<String, StudioError> {
        match output {
            JobOutput::Items(items) => {
                let count = items.len();
                self.studio.record(items)?;
                Ok(format!("{count} new item(s)"))
            }
            JobOutput::Prompt(prompt) => {
                self.prompt = prompt;
                Ok("prompt updated".to_owned())
            }
            JobOutput::Analysis(id, analysis) => match self.studio.attach_analysis(id, analysis)? {
                Some(analysis) => Ok(format!("score {}", analysis.score)),
                None => Ok("the image was deleted meanwhile".to_owned()),
            },
            JobOutput::Video(video) => {
                log::info!("Video {} ready at {}", video.id, video.video_url);
                self.last_video = Some(video);
                Ok("video ready".to_owned())
            }
        }
    }

    pub(crate) fn status(&self) -> Option<&Status> {
        self.status
            .as_ref()
            .filter(|status| time::now_secs() - status.shown_at < STATUS_SECS)
    }

    pub(crate) fn dismiss_status(&mut self) {
        self.status = None;
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.set_status(message.into(), false);
    }

    fn report(&mut self, err: StudioError) {
        log::warn!("{}", err);
        self.set_status(err.to_string(), true);
    }

    fn report_message(&mut self, message: String) {
        self.set_status(message, true);
    }

    fn set_status(&mut self, message: String, is_error: bool) {
        self.status = Some(Status {
            message,
            is_error,
            shown_at: time::now_secs(),
        });
    }
}

fn open_history(settings: &AppSettings) -> HistoryStore {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let dir = settings
            .data_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_owned());
        log::info!("History stored in {}", dir);
        HistoryStore::open(Box::new(crate::state::FileBlobStore::new(dir)))
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = settings;
        HistoryStore::open(Box::new(MemoryBlobStore::new()))
    }
}

impl eframe::App for StudioApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();
        self.thumbnails.begin_frame();

        panels::tools_panel(self, ctx);
        panels::history_panel(self, ctx);
        panels::central_panel(self, ctx);

        if let Some(status) = &self.status {
            let remaining = STATUS_SECS - (time::now_secs() - status.shown_at);
            if remaining > 0.0 {
                ctx.request_repaint_after(std::time::Duration::from_secs_f64(remaining));
            } else {
                self.status = None;
            }
        }
    }
}

/// In-memory history; nothing touches the disk.
impl Default for StudioApp {
    fn default() -> Self {
        Self::with_history(
            AppSettings::default(),
            HistoryStore::new(Box::new(MemoryBlobStore::new())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Fill;
    use crate::service::{GeneratedImage, ImageRequest, InlineImage, VideoRequest};
    use futures::future::ready;

    fn app() -> StudioApp {
        StudioApp::default()
    }

    fn green_uri(width: u32, height: u32) -> String {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 255, 0, 255]));
        codec::to_data_uri(codec::PNG_MIME, &codec::encode_png(&image).unwrap())
    }

    struct CannedService;

    impl GenerativeService for CannedService {
        fn generate_images(&self, request: ImageRequest) -> BoxFuture<'_, ServiceResult<Vec<GeneratedImage>>> {
            let images = (0..request.count)
                .map(|_| GeneratedImage::new(green_uri(16, 16), Some(request.prompt.clone())))
                .collect();
            ready(Ok(images)).boxed()
        }

        fn remove_background(
            &self,
            _image: InlineImage,
            _add_green_screen: bool,
        ) -> BoxFuture<'_, ServiceResult<GeneratedImage>> {
            ready(Ok(GeneratedImage::new(green_uri(8, 8), None))).boxed()
        }

        fn optimize_prompt(&self, prompt: String) -> BoxFuture<'_, ServiceResult<String>> {
            ready(Ok(format!("{prompt}, watercolor"))).boxed()
        }

        fn analyze_image(&self, _image: InlineImage) -> BoxFuture<'_, ServiceResult<ImageAnalysis>> {
            ready(Ok(ImageAnalysis {
                score: "8/10".to_owned(),
                analysis: "Balanced".to_owned(),
            }))
            .boxed()
        }

        fn generate_video(&self, request: VideoRequest) -> BoxFuture<'_, ServiceResult<GeneratedVideo>> {
            ready(Ok(GeneratedVideo {
                id: Uuid::new_v4(),
                video_url: format!("https://example.test/{}.mp4", request.duration_secs),
                thumbnail_url: None,
                timestamp: 0,
            }))
            .boxed()
        }
    }

    fn app_with_service() -> StudioApp {
        let mut app = app().with_service(Arc::new(CannedService));
        app.ensure_canvas(Vec2::new(64.0, 64.0));
        app
    }

    /// Poll until the background job has been applied.
    fn finish_job(app: &mut StudioApp) {
        for _ in 0..500 {
            app.poll_jobs();
            if !app.is_busy() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        panic!("job did not finish");
    }

    #[test]
    fn test_configure_happens_once_until_requested() {
        let mut app = app();
        app.ensure_canvas(Vec2::new(200.0, 100.0));
        assert_eq!(app.studio.surface().size(), Some([100, 100]));

        app.ensure_canvas(Vec2::new(50.0, 50.0));
        assert_eq!(app.studio.surface().size(), Some([100, 100]));

        app.settings.aspect_ratio = AspectRatio::new(2, 1).unwrap();
        app.request_reconfigure();
        app.ensure_canvas(Vec2::new(200.0, 200.0));
        assert_eq!(app.studio.surface().size(), Some([200, 100]));
    }

    #[test]
    fn test_style_changes_reach_surface() {
        let mut app = app();
        app.set_tool(DrawTool::Circle);
        app.set_style(ToolStyle {
            stroke_color: Color32::BLACK,
            fill: Fill::Solid(Color32::BLUE),
            width: 500.0,
        });
        assert_eq!(app.studio.surface().tool(), DrawTool::Circle);
        assert_eq!(app.studio.surface().style().width, 100.0);
        assert_eq!(app.settings.style.width, 100.0);
        assert_eq!(app.fill_color, Color32::BLUE);
    }

    #[test]
    fn test_generate_without_service_reports() {
        let mut app = app();
        let ctx = egui::Context::default();
        app.generate_from_drawing(&ctx);
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert!(!app.is_busy());
    }

    #[test]
    fn test_use_history_image_as_background() {
        let mut app = app();
        app.ensure_canvas(Vec2::new(64.0, 64.0));
        let image = image::RgbaImage::from_pixel(32, 16, image::Rgba([0, 255, 0, 255]));
        let uri = codec::to_data_uri(codec::PNG_MIME, &codec::encode_png(&image).unwrap());
        app.studio
            .record(vec![HistoryItem::new(uri, "green")])
            .unwrap();
        let id = app.studio.history().items()[0].id;

        app.use_as_background(id);
        app.ensure_canvas(Vec2::new(64.0, 64.0));
        assert_eq!(app.settings.aspect_ratio, AspectRatio::new(2, 1).unwrap());
        assert_eq!(app.studio.surface().size(), Some([64, 32]));
        let [r, g, b, _] = app.studio.surface().export_image().unwrap().get_pixel(10, 10).0;
        assert!(r < 5 && g > 250 && b < 5);

        app.remove_history_item(id);
        assert!(app.studio.history().is_empty());
    }

    #[test]
    fn test_generate_job_records_one_edit_of_the_drawing() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();
        app.prompt = "a castle".to_owned();

        app.generate_from_drawing(&ctx);
        assert_eq!(app.busy_label(), Some("Generating"));
        finish_job(&mut app);

        // a reference request keeps a single result
        assert_eq!(app.studio.history().len(), 1);
        let item = &app.studio.history().items()[0];
        assert_eq!(item.prompt.as_deref(), Some("a castle"));
        assert_eq!(item.aspect_ratio.as_deref(), Some("1:1"));
        assert!(!app.status().unwrap().is_error);
    }

    #[test]
    fn test_second_job_is_ignored_while_busy() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();
        app.prompt = "fox".to_owned();

        app.optimize_prompt(&ctx);
        app.remove_background(&ctx, false);
        assert_eq!(app.busy_label(), Some("Optimizing prompt"));
        finish_job(&mut app);
        assert!(app.studio.history().is_empty());
    }

    #[test]
    fn test_optimize_job_replaces_prompt() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();
        app.prompt = "  a fox ".to_owned();

        app.optimize_prompt(&ctx);
        finish_job(&mut app);
        assert_eq!(app.prompt, "a fox, watercolor");
    }

    #[test]
    fn test_blank_prompt_optimization_reports_error() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();

        app.optimize_prompt(&ctx);
        finish_job(&mut app);
        assert!(app.status().unwrap().is_error);
        assert_eq!(app.prompt, "");
    }

    #[test]
    fn test_analyze_job_attaches_score() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();
        app.studio
            .record(vec![HistoryItem::new(green_uri(4, 4), "green")])
            .unwrap();
        let id = app.studio.history().items()[0].id;

        app.analyze(&ctx, id);
        finish_job(&mut app);

        let analysis = app.studio.history().get(id).unwrap().analysis.clone().unwrap();
        assert_eq!(analysis.score, "8/10");
        assert!(app.status().unwrap().message.contains("8/10"));
    }

    #[test]
    fn test_analysis_of_deleted_item_is_dropped() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();
        app.studio
            .record(vec![HistoryItem::new(green_uri(4, 4), "green")])
            .unwrap();
        let id = app.studio.history().items()[0].id;

        app.analyze(&ctx, id);
        app.remove_history_item(id);
        finish_job(&mut app);
        assert!(app.studio.history().is_empty());
        assert!(!app.status().unwrap().is_error);
    }

    #[test]
    fn test_video_job_keeps_last_clip() {
        let mut app = app_with_service();
        let ctx = egui::Context::default();
        app.prompt = "waves".to_owned();

        app.generate_video(&ctx);
        finish_job(&mut app);
        assert_eq!(
            app.last_video.as_ref().map(|video| video.video_url.as_str()),
            Some("https://example.test/5.mp4")
        );
    }

    #[test]
    fn test_video_rejects_unsupported_ratio() {
        let mut app = app_with_service();
        app.settings.aspect_ratio = AspectRatio::new(4, 3).unwrap();
        app.request_reconfigure();
        app.ensure_canvas(Vec2::new(64.0, 64.0));

        app.generate_video(&egui::Context::default());
        assert!(!app.is_busy());
        assert!(app.status().unwrap().is_error);
    }
}
