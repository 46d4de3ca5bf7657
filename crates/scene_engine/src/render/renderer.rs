//! Frame-level render service
//!
//! Owns what belongs to the frame rather than to a scene: viewport size,
//! clear colour and per-frame counters.

use crate::core::config::RenderSettings;

use super::api::{check_error, GraphicsApi, RenderResult};

/// Per-run frame statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frames started with [`Renderer::begin_frame`]
    pub frames: u64,
    /// Seconds accumulated from frame deltas
    pub elapsed: f32,
    /// Delta of the most recent frame
    pub last_delta: f32,
}

impl FrameStats {
    /// Mean frames per second over the run
    pub fn average_fps(&self) -> f32 {
        if self.elapsed > 0.0 {
            self.frames as f32 / self.elapsed
        } else {
            0.0
        }
    }
}

/// Render service
#[derive(Debug, Default)]
pub struct Renderer {
    clear_color: [f32; 4],
    viewport: (u32, u32),
    stats: FrameStats,
    initialized: bool,
}

impl Renderer {
    /// Uninitialized renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply settings and set the initial viewport
    pub fn initialize(&mut self, gpu: &mut dyn GraphicsApi, settings: &RenderSettings) -> RenderResult<()> {
        self.clear_color = settings.clear_color;
        self.stats = FrameStats::default();
        self.initialized = true;
        self.resize(gpu, settings.width, settings.height)?;
        log::info!(
            "Renderer initialized ({}x{}, vsync {})",
            settings.width,
            settings.height,
            settings.vsync
        );
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) ran and [`dispose`](Self::dispose) did not
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Update the viewport to the new framebuffer size
    pub fn resize(&mut self, gpu: &mut dyn GraphicsApi, width: u32, height: u32) -> RenderResult<()> {
        self.viewport = (width, height);
        gpu.set_viewport(width, height);
        check_error(gpu, "set_viewport")
    }

    /// Clear the framebuffer and count the frame
    pub fn begin_frame(&mut self, gpu: &mut dyn GraphicsApi, delta_time: f32) -> RenderResult<()> {
        self.stats.frames += 1;
        self.stats.elapsed += delta_time;
        self.stats.last_delta = delta_time;
        gpu.clear(self.clear_color);
        check_error(gpu, "clear")
    }

    /// Current viewport size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Frame statistics
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Release the service
    pub fn dispose(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        log::info!(
            "Renderer disposed after {} frames ({:.1} fps average)",
            self.stats.frames,
            self.stats.average_fps()
        );
    }
}
