pub mod format;
pub mod time;

pub use format::format_file_size;
