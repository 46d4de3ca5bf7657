//! System trait and phase roles

use bitflags::bitflags;
use thiserror::Error;

use crate::assets::ResourceError;
use crate::input::InputState;
use crate::render::api::{GraphicsApi, RenderError};

use super::World;

/// System execution phases, run by the world in this order within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemPhase {
    /// Simulation and input handling
    Update = 0,
    /// Draw submission
    Render = 1,
    /// Framebuffer size changes
    Resize = 2,
}

impl SystemPhase {
    /// Every phase
    pub const ALL: [Self; 3] = [Self::Update, Self::Render, Self::Resize];

    /// Role flag that opts a system into this phase
    pub fn role(self) -> SystemRoles {
        match self {
            Self::Update => SystemRoles::UPDATE,
            Self::Render => SystemRoles::RENDER,
            Self::Resize => SystemRoles::RESIZE,
        }
    }
}

bitflags! {
    /// Phases a system takes part in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SystemRoles: u8 {
        /// Runs during [`World::update`]
        const UPDATE = 0b001;
        /// Runs during [`World::render`]
        const RENDER = 0b010;
        /// Runs during [`World::resize`]
        const RESIZE = 0b100;
    }
}

/// Errors raised by a system pass
#[derive(Debug, Error)]
pub enum SystemError {
    /// Graphics call failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Resource used by the system is unusable
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// System-specific failure
    #[error("System '{system}' failed: {reason}")]
    Failed {
        /// System name
        system: String,
        /// Failure description
        reason: String,
    },
}

/// Result of one system pass
pub type SystemResult = Result<(), SystemError>;

/// Behaviour run by the world in one or more phases.
///
/// Systems get the whole world every call and re-query what they need;
/// nothing carries over between frames except the system's own fields.
pub trait System {
    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Phases this system is registered into
    fn roles(&self) -> SystemRoles;

    /// Update pass
    fn update(&mut self, _world: &mut World, _input: &InputState, _delta_time: f32) -> SystemResult {
        Ok(())
    }

    /// Render pass
    fn render(&mut self, _world: &mut World, _gpu: &mut dyn GraphicsApi, _delta_time: f32) -> SystemResult {
        Ok(())
    }

    /// Resize pass
    fn resize(&mut self, _world: &mut World, _width: u32, _height: u32) -> SystemResult {
        Ok(())
    }
}
