mod history_store;
mod persistence;
mod settings;

pub use history_store::{HISTORY_KEY, HistoryItem, HistoryStore, ImageAnalysis, MAX_HISTORY_ITEMS};
pub use persistence::{
    BlobStore,
    FileBlobStore,
    MemoryBlobStore,
    PersistenceError,
    PersistenceResult,
};
pub use settings::{AppSettings, DEFAULT_BACKGROUND};
