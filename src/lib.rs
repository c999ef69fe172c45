pub mod app;
pub mod prompt;
pub mod render;

pub use app::{Application, BatchOverrides, TargetSelection};
