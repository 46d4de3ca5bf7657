//! # Scene Engine
//!
//! A small real-time 3D engine built around three ideas:
//!
//! - **Resources**: GPU-backed objects with a load/unload lifecycle and
//!   dependencies that load before and unload after their dependents
//! - **Scenes**: resources owning named shader/texture/mesh registries and an
//!   ECS world with update, render and resize system phases
//! - **Engine**: an explicit context that configures a window backend, drives
//!   the current scene from the frame callbacks and tears everything down
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Empty;
//!
//! impl SceneScript for Empty {
//!     fn load(&mut self, scene: &mut SceneContent, _ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
//!         let camera = scene.world.create_entity();
//!         scene.world.add_component(camera, CameraComponent::default());
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(MemoryAssetLoader::new());
//!     engine.configure_render_settings(RenderSettings::new("demo", 800, 600))?;
//!     engine.add_scene(Scene::new("main", Empty));
//!     engine.run_window(&mut HeadlessWindow::new(60, 1.0 / 60.0))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;

pub mod assets;
pub mod ecs;
pub mod input;
pub mod render;
pub mod scene;
pub mod window;

mod engine;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineError, EngineState};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{
            dispose, initialize, shared, AssetLoader, AssetService, FsAssetLoader, Lifecycle, Manager,
            MemoryAssetLoader, Resource, ResourceContext, ResourceError, Shared,
        },
        config::Config,
        core::config::{EngineConfig, RenderSettings},
        ecs::{
            components::{
                CameraComponent, MeshComponent, ShaderComponent, SpinComponent, TextureComponent, Toggleable,
                TransformComponent, Visible,
            },
            systems::{RenderingSystem, SpinSystem, VisibilityToggleSystem},
            Component, Entity, Query, System, SystemResult, SystemRoles, World,
        },
        foundation::{
            math::{Mat4, Vec3},
            time::Timer,
        },
        input::{InputState, KeyCode, MouseButton},
        render::{api::GraphicsApi, Mesh, MeshData, Renderer, Shader, Texture},
        scene::{Scene, SceneContent, SceneManager, SceneScript},
        window::{HeadlessWindow, WindowBackend},
        Engine, EngineError, EngineState,
    };
}
