mod central_panel;
mod history_panel;
mod tools_panel;

pub use central_panel::{central_panel, display_rect};
pub use history_panel::{describe, history_panel};
pub use tools_panel::tools_panel;
