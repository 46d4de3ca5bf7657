//! Scenes and scene management

pub mod scene;
pub mod scene_manager;

pub use scene::{Scene, SceneContent, SceneScript};
pub use scene_manager::{SceneError, SceneManager};
