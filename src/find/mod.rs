//! 查找控制器层

pub mod config;
pub mod controller;
pub mod decorations;
pub mod state;

pub use config::FindConfig;
pub use controller::FindController;
pub use decorations::{DecorationId, FindDecorations};
pub use state::{FindReplaceState, FindStateChange, FindStateUpdate};
