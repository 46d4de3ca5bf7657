//! Scene: a resource that owns its GPU resources and its world
//!
//! Application code supplies a [`SceneScript`] with the load and per-frame
//! hooks. The [`Scene`] wraps it with the lifecycle guard: frame events reach
//! the script and the world only while the scene is loaded.

use crate::assets::{Lifecycle, Manager, Resource, ResourceContext, ResourceError};
use crate::ecs::components::CameraComponent;
use crate::ecs::{SystemResult, World};
use crate::input::InputState;
use crate::render::api::GraphicsApi;
use crate::render::{Mesh, Shader, Texture};

/// Everything a scene owns: three resource registries and one world
#[derive(Debug)]
pub struct SceneContent {
    /// Shader programs
    pub shaders: Manager<Shader>,
    /// Textures
    pub textures: Manager<Texture>,
    /// Meshes
    pub objects: Manager<Mesh>,
    /// Entities, components and systems
    pub world: World,
    requested_scene: Option<String>,
}

impl SceneContent {
    fn new() -> Self {
        Self {
            shaders: Manager::new("shaders"),
            textures: Manager::new("textures"),
            objects: Manager::new("objects"),
            world: World::new(),
            requested_scene: None,
        }
    }

    /// Ask the scene manager to make another scene current at the start of
    /// the next update
    pub fn request_scene(&mut self, name: impl Into<String>) {
        self.requested_scene = Some(name.into());
    }

    pub(crate) fn take_requested_scene(&mut self) -> Option<String> {
        self.requested_scene.take()
    }

    fn release(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        self.world.clear();
        self.requested_scene = None;
        let results = [
            self.objects.dispose(ctx),
            self.textures.dispose(ctx),
            self.shaders.dispose(ctx),
        ];
        results.into_iter().collect()
    }
}

/// Application hooks for one scene
pub trait SceneScript {
    /// Populate the registries and the world. Registered resources are
    /// initialized right after this returns.
    fn load(&mut self, scene: &mut SceneContent, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError>;

    /// Release anything acquired outside the registries
    fn unload(&mut self, _scene: &mut SceneContent, _ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Per-frame logic, run before the world's update systems
    fn update(&mut self, _scene: &mut SceneContent, _input: &InputState, _delta_time: f32) -> SystemResult {
        Ok(())
    }

    /// Per-frame drawing, run before the world's render systems
    fn render(&mut self, _scene: &mut SceneContent, _gpu: &mut dyn GraphicsApi, _delta_time: f32) -> SystemResult {
        Ok(())
    }

    /// Framebuffer size change, run before the world's resize systems
    fn resize(&mut self, _scene: &mut SceneContent, _width: u32, _height: u32) -> SystemResult {
        Ok(())
    }
}

/// A loadable scene
pub struct Scene {
    lifecycle: Lifecycle,
    content: SceneContent,
    script: Box<dyn SceneScript>,
}

impl Scene {
    /// Unloaded scene driven by `script`
    pub fn new(name: impl Into<String>, script: impl SceneScript + 'static) -> Self {
        Self {
            lifecycle: Lifecycle::new(name),
            content: SceneContent::new(),
            script: Box::new(script),
        }
    }

    /// Registries and world
    pub fn content(&self) -> &SceneContent {
        &self.content
    }

    /// Mutable registries and world
    pub fn content_mut(&mut self) -> &mut SceneContent {
        &mut self.content
    }

    /// The scene's world
    pub fn world(&self) -> &World {
        &self.content.world
    }

    /// Forward an update to the script, then the world. No-op while unloaded.
    pub fn update_scene(&mut self, input: &InputState, delta_time: f32) -> SystemResult {
        if !self.is_loaded() {
            log::trace!("Scene '{}' not loaded, update skipped", self.name());
            return Ok(());
        }
        self.script.update(&mut self.content, input, delta_time)?;
        self.content.world.update(input, delta_time)
    }

    /// Forward a render to the script, then the world. No-op while unloaded.
    pub fn render_scene(&mut self, gpu: &mut dyn GraphicsApi, delta_time: f32) -> SystemResult {
        if !self.is_loaded() {
            log::trace!("Scene '{}' not loaded, render skipped", self.name());
            return Ok(());
        }
        self.script.render(&mut self.content, gpu, delta_time)?;
        self.content.world.render(gpu, delta_time)
    }

    /// Update camera aspect ratios, then forward to the script and the world.
    /// No-op while unloaded.
    pub fn resize_scene(&mut self, width: u32, height: u32) -> SystemResult {
        if !self.is_loaded() {
            log::trace!("Scene '{}' not loaded, resize skipped", self.name());
            return Ok(());
        }
        for (_, (camera,)) in self.content.world.query_mut::<(CameraComponent,)>() {
            camera.set_viewport(width, height);
        }
        self.script.resize(&mut self.content, width, height)?;
        self.content.world.resize(width, height)
    }
}

impl Resource for Scene {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn load(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        log::info!("Loading scene '{}'", self.lifecycle.name());
        self.script.load(&mut self.content, ctx)?;
        self.content.shaders.initialize_all(ctx)?;
        self.content.textures.initialize_all(ctx)?;
        self.content.objects.initialize_all(ctx)?;
        log::info!(
            "Scene '{}' loaded: {} shaders, {} textures, {} objects, {} entities",
            self.lifecycle.name(),
            self.content.shaders.len(),
            self.content.textures.len(),
            self.content.objects.len(),
            self.content.world.entity_count()
        );
        Ok(())
    }

    fn unload(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        log::info!("Unloading scene '{}'", self.lifecycle.name());
        let script = self.script.unload(&mut self.content, ctx);
        let content = self.content.release(ctx);
        script.and(content)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("lifecycle", &self.lifecycle)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}
