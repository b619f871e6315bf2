pub mod app;
pub mod input;
pub mod render;
pub mod shortcut;
pub mod theme;

pub use app::run;
