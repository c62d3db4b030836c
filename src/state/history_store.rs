use super::persistence::{BlobStore, PersistenceResult};
use crate::codec;
use crate::geometry::AspectRatio;
use crate::util::time;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Blob store key the history list is saved under.
pub const HISTORY_KEY: &str = "image-gen-history";

/// Maximum number of artifacts kept.
pub const MAX_HISTORY_ITEMS: usize = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub score: String,
    pub analysis: String,
}

/// A produced artifact: a generated image, a processed image or an exported drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    /// `data:` URI of the image.
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Decoded size in bytes.
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub analysis: Option<ImageAnalysis>,
    #[serde(default)]
    pub created_at: u64,
}

impl HistoryItem {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: src.into(),
            alt: alt.into(),
            prompt: None,
            width: None,
            height: None,
            size: None,
            aspect_ratio: None,
            analysis: None,
            created_at: time::unix_timestamp(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio.to_string());
        self
    }

    /// Fill in dimensions, byte size and aspect ratio where they are missing.
    ///
    /// A `src` that cannot be decoded leaves the fields empty; it is not an error.
    pub fn fill_metadata(&mut self) {
        if self.width.is_some() && self.height.is_some() && self.size.is_some() {
            if self.aspect_ratio.is_none() {
                self.aspect_ratio = self.derived_ratio();
            }
            return;
        }

        let decoded = codec::from_data_uri(&self.src)
            .and_then(|(_, bytes)| codec::image_dimensions(&bytes));
        match decoded {
            Ok((width, height)) => {
                self.width = Some(width);
                self.height = Some(height);
                self.size = Some(codec::data_uri_payload_size(&self.src));
                if self.aspect_ratio.is_none() {
                    self.aspect_ratio = self.derived_ratio();
                }
            }
            Err(err) => {
                log::warn!("Could not read image metadata for {}: {}", self.id, err);
            }
        }
    }

    fn derived_ratio(&self) -> Option<String> {
        AspectRatio::from_dimensions(self.width?, self.height?)
            .ok()
            .map(|ratio| ratio.to_string())
    }
}

/// Newest-first list of artifacts, capped and mirrored into a blob store as JSON.
///
/// Every mutation updates memory first and then persists. A failed write is returned for
/// the host to report, but the in-memory list keeps the change.
pub struct HistoryStore {
    items: Vec<HistoryItem>,
    store: Box<dyn BlobStore>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self {
            items: Vec::new(),
            store,
            capacity: MAX_HISTORY_ITEMS,
        }
    }

    /// Open a store and load whatever it already holds.
    pub fn open(store: Box<dyn BlobStore>) -> Self {
        let mut history = Self::new(store);
        history.load();
        history
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Missing or corrupt data yields an empty list.
    pub fn load(&mut self) -> &[HistoryItem] {
        self.items = match self.store.get(HISTORY_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<HistoryItem>>(&json) {
                Ok(mut items) => {
                    items.truncate(self.capacity);
                    items
                }
                Err(err) => {
                    log::error!("Failed to parse saved history: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                log::error!("Failed to load history: {}", err);
                Vec::new()
            }
        };
        log::debug!("Loaded {} history items", self.items.len());
        &self.items
    }

    /// Put `new_items` in front, in the given order, and evict beyond the cap.
    pub fn append(&mut self, new_items: Vec<HistoryItem>) -> PersistenceResult<()> {
        let mut new_items = new_items;
        for item in &mut new_items {
            item.fill_metadata();
        }
        new_items.append(&mut self.items);
        new_items.truncate(self.capacity);
        self.items = new_items;
        self.save()
    }

    pub fn remove(&mut self, id: Uuid) -> PersistenceResult<bool> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Attach an analysis result to an item; returns false if the id is unknown.
    pub fn set_analysis(&mut self, id: Uuid, analysis: ImageAnalysis) -> PersistenceResult<bool> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        item.analysis = Some(analysis);
        self.save()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> PersistenceResult<()> {
        self.items.clear();
        self.store.remove(HISTORY_KEY)
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn save(&mut self) -> PersistenceResult<()> {
        let json = serde_json::to_string(&self.items)?;
        self.store.set(HISTORY_KEY, &json).inspect_err(|err| {
            log::error!("Failed to save history: {}", err);
        })
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("items", &self.items.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
