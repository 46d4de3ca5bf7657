//! Window backends and the per-frame callback contract
//!
//! A [`WindowBackend`] owns the event loop and the graphics context. The
//! engine implements [`FrameHandler`] and is driven through its callbacks:
//! `on_load` once, `on_resize` whenever the framebuffer changes (and once
//! right after load), then `on_update_frame` / `on_render_frame` per frame.

pub mod headless;

#[cfg(feature = "glfw-window")]
pub mod glfw_window;

use thiserror::Error;

use crate::core::config::RenderSettings;
use crate::engine::EngineError;
use crate::input::InputState;
use crate::render::api::GraphicsApi;

pub use headless::HeadlessWindow;

#[cfg(feature = "glfw-window")]
pub use glfw_window::GlfwWindow;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The windowing library could not start
    #[error("Window system initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// `run` was called before `open`
    #[error("Window is not open")]
    NotOpen,

    /// Backend-specific failure
    #[error("Window backend error: {0}")]
    Backend(String),
}

/// Services available to a frame callback
pub struct FrameContext<'a> {
    /// Graphics API owning the window's context
    pub gpu: &'a mut dyn GraphicsApi,
    /// Input state for this frame
    pub input: &'a InputState,
}

/// Callbacks driven by a window backend's frame loop
pub trait FrameHandler {
    /// Graphics context is ready
    fn on_load(&mut self, frame: &mut FrameContext<'_>) -> Result<(), EngineError>;

    /// Framebuffer size changed
    fn on_resize(&mut self, frame: &mut FrameContext<'_>, width: u32, height: u32) -> Result<(), EngineError>;

    /// Simulation step
    fn on_update_frame(&mut self, frame: &mut FrameContext<'_>, delta_time: f32) -> Result<(), EngineError>;

    /// Drawing step
    fn on_render_frame(&mut self, frame: &mut FrameContext<'_>, delta_time: f32) -> Result<(), EngineError>;
}

/// Window plus blocking frame loop
pub trait WindowBackend {
    /// Create the window and its graphics context
    fn open(&mut self, settings: &RenderSettings) -> Result<(), WindowError>;

    /// Run the frame loop until the window closes or a callback fails
    fn run(&mut self, handler: &mut dyn FrameHandler) -> Result<(), EngineError>;

    /// Graphics API of the open context, used for teardown after `run`
    fn graphics(&mut self) -> &mut dyn GraphicsApi;

    /// Destroy the window and its context
    fn close(&mut self);
}
