//! When live views get written back, and when carried copies get rebuilt.

mod refresh;
mod save_manager;

pub use refresh::RefreshThrottle;
pub use save_manager::{SaveKey, SaveManager};
