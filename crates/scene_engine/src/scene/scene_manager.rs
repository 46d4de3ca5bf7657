//! Scene registry with a current scene and deferred switching

use thiserror::Error;

use crate::assets::{initialize, Manager, Resource, ResourceContext, ResourceError, Shared};
use crate::ecs::SystemError;
use crate::input::InputState;
use crate::render::api::GraphicsApi;

use super::Scene;

/// Errors from driving the current scene
#[derive(Debug, Error)]
pub enum SceneError {
    /// Loading or releasing a scene failed
    #[error("Scene resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A frame pass failed
    #[error("Scene system error: {0}")]
    System(#[from] SystemError),
}

/// Owns every registered scene and tracks which one is current.
///
/// Switching scenes never disposes the previous one; it stays loaded until the
/// caller disposes it or the manager itself is disposed.
#[derive(Debug)]
pub struct SceneManager {
    scenes: Manager<Scene>,
    pending_switch: Option<String>,
}

impl SceneManager {
    /// Empty manager
    pub fn new() -> Self {
        Self {
            scenes: Manager::new("scenes"),
            pending_switch: None,
        }
    }

    /// Register a scene. The first scene registered becomes current.
    pub fn add_scene(&mut self, scene: Scene) -> Shared<Scene> {
        let scene = self.scenes.insert(scene);
        if self.scenes.current().is_none() && self.scenes.len() == 1 {
            let name = scene.borrow().lifecycle().name().to_string();
            self.scenes.set_current(&name);
        }
        scene
    }

    /// The registry itself
    pub fn scenes(&self) -> &Manager<Scene> {
        &self.scenes
    }

    /// Make a scene current immediately. Unknown names clear the selection.
    pub fn set_current(&mut self, name: &str) -> bool {
        self.pending_switch = None;
        self.scenes.set_current(name)
    }

    /// Current scene
    pub fn current(&self) -> Option<Shared<Scene>> {
        self.scenes.current()
    }

    /// Name of the current scene
    pub fn current_name(&self) -> Option<String> {
        self.scenes.current_name()
    }

    /// Queue a switch applied at the start of the next update
    pub fn request_switch(&mut self, name: &str) -> bool {
        if !self.scenes.contains(name) {
            log::warn!("Scene '{name}' is not registered, switch ignored");
            return false;
        }
        self.pending_switch = Some(name.to_string());
        true
    }

    /// Whether a switch is queued
    pub fn has_pending_switch(&self) -> bool {
        self.pending_switch.is_some()
    }

    /// Initialize the current scene if it is not loaded yet
    pub fn initialize_current(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        match self.scenes.current() {
            Some(scene) => initialize(&*scene, ctx),
            None => {
                log::warn!("No current scene to initialize");
                Ok(())
            }
        }
    }

    /// Apply a queued switch, then update the current scene
    pub fn update(&mut self, ctx: &mut ResourceContext<'_>, input: &InputState, delta_time: f32) -> Result<(), SceneError> {
        if let Some(target) = self.pending_switch.take() {
            self.switch_to(&target, ctx)?;
        }
        let Some(scene) = self.scenes.current() else {
            return Ok(());
        };
        let requested = {
            let mut scene = scene.borrow_mut();
            scene.update_scene(input, delta_time)?;
            scene.content_mut().take_requested_scene()
        };
        if let Some(name) = requested {
            self.request_switch(&name);
        }
        Ok(())
    }

    /// Render the current scene
    pub fn render(&mut self, gpu: &mut dyn GraphicsApi, delta_time: f32) -> Result<(), SceneError> {
        if let Some(scene) = self.scenes.current() {
            scene.borrow_mut().render_scene(gpu, delta_time)?;
        }
        Ok(())
    }

    /// Resize the current scene
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
        if let Some(scene) = self.scenes.current() {
            scene.borrow_mut().resize_scene(width, height)?;
        }
        Ok(())
    }

    /// Dispose every scene and empty the registry
    pub fn dispose(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        self.pending_switch = None;
        self.scenes.dispose(ctx)
    }

    fn switch_to(&mut self, target: &str, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        let previous = self.scenes.current_name();
        if previous.as_deref() == Some(target) {
            return Ok(());
        }
        self.scenes.set_current(target);
        log::info!(
            "Switching scene: {} -> {target}",
            previous.as_deref().unwrap_or("<none>")
        );
        self.initialize_current(ctx)
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::SystemResult;
    use crate::scene::{SceneContent, SceneScript};
    use crate::testing::{event_log, EventLog, TestServices};

    /// Asks for `next` after `frames` updates
    struct Hopper {
        log: EventLog,
        next: Option<&'static str>,
        frames: u32,
    }

    impl SceneScript for Hopper {
        fn load(&mut self, _scene: &mut SceneContent, _ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
            self.log.borrow_mut().push("hop:load".to_string());
            Ok(())
        }

        fn update(&mut self, scene: &mut SceneContent, _input: &InputState, _dt: f32) -> SystemResult {
            self.frames = self.frames.saturating_sub(1);
            if self.frames == 0 {
                if let Some(next) = self.next.take() {
                    scene.request_scene(next);
                }
            }
            Ok(())
        }
    }

    fn hopper(log: &EventLog, next: Option<&'static str>, frames: u32) -> Hopper {
        Hopper {
            log: log.clone(),
            next,
            frames,
        }
    }

    struct Quiet;

    impl SceneScript for Quiet {
        fn load(&mut self, _scene: &mut SceneContent, _ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
            Ok(())
        }
    }

    #[test]
    fn test_first_scene_becomes_current() {
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::new("menu", Quiet));
        manager.add_scene(Scene::new("level", Quiet));
        assert_eq!(manager.current_name().as_deref(), Some("menu"));

        assert!(!manager.set_current("missing"));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_requested_switch_applies_next_update_and_keeps_previous_loaded() {
        let log = event_log();
        let mut manager = SceneManager::new();
        let menu = manager.add_scene(Scene::new("menu", hopper(&log, Some("level"), 1)));
        let level = manager.add_scene(Scene::new("level", Quiet));
        let mut services = TestServices::new();
        let input = InputState::new();

        manager.initialize_current(&mut services.context()).unwrap();
        manager.update(&mut services.context(), &input, 0.016).unwrap();
        assert_eq!(manager.current_name().as_deref(), Some("menu"));
        assert!(manager.has_pending_switch());

        manager.update(&mut services.context(), &input, 0.016).unwrap();
        assert_eq!(manager.current_name().as_deref(), Some("level"));
        assert!(level.borrow().is_loaded());
        assert!(menu.borrow().is_loaded());

        manager.dispose(&mut services.context()).unwrap();
        assert!(!menu.borrow().is_loaded());
        assert!(!level.borrow().is_loaded());
    }

    #[test]
    fn test_unknown_switch_is_ignored() {
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::new("only", Quiet));
        assert!(!manager.request_switch("elsewhere"));
        assert!(!manager.has_pending_switch());
    }

    #[test]
    fn test_frame_events_before_initialize_are_noops() {
        let log = event_log();
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::new("lazy", hopper(&log, None, 0)));
        let mut services = TestServices::new();

        manager.update(&mut services.context(), &InputState::new(), 0.016).unwrap();
        manager.render(&mut services.device, 0.016).unwrap();
        manager.resize(10, 10).unwrap();
        assert!(log.borrow().is_empty());
    }
}
