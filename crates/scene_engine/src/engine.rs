//! Core engine implementation
//!
//! [`Engine`] is an explicit context object: build one, configure it, add
//! scenes, then hand it a [`WindowBackend`] with [`Engine::run_window`]. It
//! owns the render service, the asset service and the scene registry, and
//! tears them down in that order once the frame loop exits.

use thiserror::Error;

use crate::assets::{AssetLoader, AssetService, FsAssetLoader, Resource, ResourceContext, ResourceError, Shared};
use crate::config::ConfigError;
use crate::core::config::{EngineConfig, RenderSettings};
use crate::ecs::SystemError;
use crate::render::api::RenderError;
use crate::render::Renderer;
use crate::scene::{Scene, SceneError, SceneManager};
use crate::window::{FrameContext, FrameHandler, WindowBackend, WindowError};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Settings and scenes may still change
    Configuring,
    /// The frame loop is running
    Running,
    /// The frame loop has exited and services are released
    Stopped,
}

/// Main engine struct
///
/// The engine coordinates all subsystems and is driven by a window backend.
#[derive(Debug)]
pub struct Engine {
    state: EngineState,
    config: EngineConfig,
    renderer: Renderer,
    assets: AssetService,
    scenes: SceneManager,
}

impl Engine {
    /// Engine with default configuration reading assets through `loader`
    pub fn new(loader: impl AssetLoader + 'static) -> Self {
        Self::with_config(EngineConfig::default(), loader)
    }

    /// Engine with explicit configuration
    pub fn with_config(config: EngineConfig, loader: impl AssetLoader + 'static) -> Self {
        log::info!("Initializing engine...");
        Self {
            state: EngineState::Configuring,
            config,
            renderer: Renderer::new(),
            assets: AssetService::new(loader),
            scenes: SceneManager::new(),
        }
    }

    /// Engine reading assets from `config.assets.root` on disk
    pub fn from_config(config: EngineConfig) -> Self {
        let loader = FsAssetLoader::new(&config.assets.root);
        Self::with_config(config, loader)
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render service
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Asset service
    pub fn assets(&self) -> &AssetService {
        &self.assets
    }

    /// Scene registry
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Replace the window/render settings.
    ///
    /// Once the frame loop has started the call is ignored and returns
    /// `Ok(false)` without looking at the settings. Before that, invalid
    /// settings are rejected.
    pub fn configure_render_settings(&mut self, settings: RenderSettings) -> Result<bool, ConfigError> {
        if self.state != EngineState::Configuring {
            log::warn!("Render settings ignored: engine is {:?}", self.state);
            return Ok(false);
        }
        settings.validate()?;
        self.config.render = settings;
        Ok(true)
    }

    /// Register a scene before the frame loop starts. Returns `None` once running.
    pub fn add_scene(&mut self, scene: Scene) -> Option<Shared<Scene>> {
        if self.state != EngineState::Configuring {
            log::warn!(
                "Scene '{}' ignored: engine is {:?}",
                scene.lifecycle().name(),
                self.state
            );
            return None;
        }
        Some(self.scenes.add_scene(scene))
    }

    /// Choose the scene loaded when the window opens
    pub fn set_current_scene(&mut self, name: &str) -> bool {
        self.scenes.set_current(name)
    }

    /// Open `window`, run its frame loop, then release every service.
    ///
    /// Teardown happens even when the loop fails; the first error is returned.
    pub fn run_window<W: WindowBackend>(&mut self, window: &mut W) -> Result<(), EngineError> {
        if self.state != EngineState::Configuring {
            log::warn!("run_window called on a {:?} engine", self.state);
            return Err(EngineError::AlreadyStarted);
        }
        self.config.validate()?;
        window.open(&self.config.render)?;

        self.state = EngineState::Running;
        log::info!("Starting main loop...");
        let result = window.run(self);
        if let Err(e) = &result {
            log::error!("Frame loop failed: {e}");
        }

        let teardown = self.shutdown(window);
        window.close();
        self.state = EngineState::Stopped;
        log::info!("Engine shutdown complete");
        result.and(teardown)
    }

    fn shutdown<W: WindowBackend>(&mut self, window: &mut W) -> Result<(), EngineError> {
        self.renderer.dispose();
        self.assets.dispose();
        let mut ctx = ResourceContext::new(window.graphics(), &mut self.assets);
        self.scenes.dispose(&mut ctx)?;
        Ok(())
    }
}

impl FrameHandler for Engine {
    fn on_load(&mut self, frame: &mut FrameContext<'_>) -> Result<(), EngineError> {
        self.renderer.initialize(frame.gpu, &self.config.render)?;
        let mut ctx = ResourceContext::new(frame.gpu, &mut self.assets);
        self.scenes.initialize_current(&mut ctx)?;
        Ok(())
    }

    fn on_resize(&mut self, frame: &mut FrameContext<'_>, width: u32, height: u32) -> Result<(), EngineError> {
        log::debug!("Framebuffer resized to {width}x{height}");
        self.renderer.resize(frame.gpu, width, height)?;
        self.scenes.resize(width, height)?;
        Ok(())
    }

    fn on_update_frame(&mut self, frame: &mut FrameContext<'_>, delta_time: f32) -> Result<(), EngineError> {
        let mut ctx = ResourceContext::new(frame.gpu, &mut self.assets);
        self.scenes.update(&mut ctx, frame.input, delta_time)?;
        Ok(())
    }

    fn on_render_frame(&mut self, frame: &mut FrameContext<'_>, delta_time: f32) -> Result<(), EngineError> {
        self.renderer.begin_frame(frame.gpu, delta_time)?;
        self.scenes.render(frame.gpu, delta_time)?;
        Ok(())
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window backend failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// A resource failed to load or unload
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Graphics API failure outside any resource
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A system failed during a frame phase
    #[error("System error: {0}")]
    System(#[from] SystemError),

    /// Scene switching or a scene frame pass failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// `run_window` called twice
    #[error("Engine has already been started")]
    AlreadyStarted,
}
