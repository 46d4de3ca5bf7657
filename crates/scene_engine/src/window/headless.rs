//! Window backend without a window
//!
//! Runs a fixed number of frames at a fixed delta time on a
//! [`HeadlessDevice`]. Key presses and resizes can be scripted per frame,
//! which is how demos run in CI and how the engine's own tests drive it.

use std::collections::BTreeMap;

use crate::core::config::{HeadlessSettings, RenderSettings};
use crate::engine::EngineError;
use crate::input::{InputState, KeyCode};
use crate::render::api::GraphicsApi;
use crate::render::headless::HeadlessDevice;

use super::{FrameContext, FrameHandler, WindowBackend, WindowError};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScriptedEvent {
    Key(KeyCode, bool),
    Resize(u32, u32),
}

/// Fixed-step, GPU-less window backend
#[derive(Debug)]
pub struct HeadlessWindow {
    device: HeadlessDevice,
    input: InputState,
    frames: u32,
    fixed_delta: f32,
    size: (u32, u32),
    script: BTreeMap<u32, Vec<ScriptedEvent>>,
    open: bool,
    frames_run: u32,
}

impl HeadlessWindow {
    /// Run `frames` frames of `fixed_delta` seconds each
    pub fn new(frames: u32, fixed_delta: f32) -> Self {
        Self {
            device: HeadlessDevice::new(),
            input: InputState::new(),
            frames,
            fixed_delta,
            size: (0, 0),
            script: BTreeMap::new(),
            open: false,
            frames_run: 0,
        }
    }

    /// Build from configuration
    pub fn from_settings(settings: &HeadlessSettings) -> Self {
        Self::new(settings.frames, settings.fixed_delta)
    }

    /// Press `key` at the start of `frame` and release it one frame later
    pub fn press_key_at(mut self, frame: u32, key: KeyCode) -> Self {
        self.script.entry(frame).or_default().push(ScriptedEvent::Key(key, true));
        self.script
            .entry(frame + 1)
            .or_default()
            .push(ScriptedEvent::Key(key, false));
        self
    }

    /// Resize the framebuffer at the start of `frame`
    pub fn resize_at(mut self, frame: u32, width: u32, height: u32) -> Self {
        self.script
            .entry(frame)
            .or_default()
            .push(ScriptedEvent::Resize(width, height));
        self
    }

    /// The in-memory graphics device
    pub fn device(&self) -> &HeadlessDevice {
        &self.device
    }

    /// Frames completed by the last `run`
    pub fn frames_run(&self) -> u32 {
        self.frames_run
    }

    /// Current framebuffer size
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Whether `open` was called and `close` was not
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl WindowBackend for HeadlessWindow {
    fn open(&mut self, settings: &RenderSettings) -> Result<(), WindowError> {
        if settings.width == 0 || settings.height == 0 {
            return Err(WindowError::CreationFailed);
        }
        self.size = (settings.width, settings.height);
        self.open = true;
        self.frames_run = 0;
        log::info!(
            "Headless window '{}' opened ({}x{}, {} frames)",
            settings.title,
            settings.width,
            settings.height,
            self.frames
        );
        Ok(())
    }

    fn run(&mut self, handler: &mut dyn FrameHandler) -> Result<(), EngineError> {
        if !self.open {
            return Err(WindowError::NotOpen.into());
        }

        let (width, height) = self.size;
        handler.on_load(&mut FrameContext {
            gpu: &mut self.device,
            input: &self.input,
        })?;
        handler.on_resize(
            &mut FrameContext {
                gpu: &mut self.device,
                input: &self.input,
            },
            width,
            height,
        )?;

        for frame in 0..self.frames {
            self.input.begin_frame();
            let mut resized = None;
            for event in self.script.get(&frame).into_iter().flatten() {
                match *event {
                    ScriptedEvent::Key(key, pressed) => self.input.handle_key_input(key, pressed),
                    ScriptedEvent::Resize(width, height) => resized = Some((width, height)),
                }
            }

            let mut ctx = FrameContext {
                gpu: &mut self.device,
                input: &self.input,
            };
            if let Some((width, height)) = resized {
                self.size = (width, height);
                handler.on_resize(&mut ctx, width, height)?;
            }
            handler.on_update_frame(&mut ctx, self.fixed_delta)?;
            handler.on_render_frame(&mut ctx, self.fixed_delta)?;
            self.frames_run += 1;
        }

        log::info!("Headless run finished after {} frames", self.frames_run);
        Ok(())
    }

    fn graphics(&mut self) -> &mut dyn GraphicsApi {
        &mut self.device
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            log::info!("Headless window closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        events: Vec<String>,
    }

    impl FrameHandler for Counter {
        fn on_load(&mut self, _frame: &mut FrameContext<'_>) -> Result<(), EngineError> {
            self.events.push("load".to_string());
            Ok(())
        }

        fn on_resize(&mut self, _frame: &mut FrameContext<'_>, width: u32, height: u32) -> Result<(), EngineError> {
            self.events.push(format!("resize:{width}x{height}"));
            Ok(())
        }

        fn on_update_frame(&mut self, frame: &mut FrameContext<'_>, _dt: f32) -> Result<(), EngineError> {
            if frame.input.is_key_pressed(KeyCode::Space) {
                self.events.push("space".to_string());
            }
            self.events.push("update".to_string());
            Ok(())
        }

        fn on_render_frame(&mut self, frame: &mut FrameContext<'_>, _dt: f32) -> Result<(), EngineError> {
            frame.gpu.clear([0.0; 4]);
            self.events.push("render".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_run_requires_open() {
        let mut window = HeadlessWindow::new(1, 0.1);
        let mut counter = Counter::default();
        assert!(window.run(&mut counter).is_err());
        assert!(counter.events.is_empty());
    }

    #[test]
    fn test_scripted_run() {
        let mut window = HeadlessWindow::new(2, 0.1)
            .press_key_at(1, KeyCode::Space)
            .resize_at(1, 50, 25);
        window.open(&RenderSettings::new("t", 100, 80)).unwrap();
        let mut counter = Counter::default();
        window.run(&mut counter).unwrap();

        assert_eq!(
            counter.events,
            vec![
                "load",
                "resize:100x80",
                "update",
                "render",
                "resize:50x25",
                "space",
                "update",
                "render"
            ]
        );
        assert_eq!(window.frames_run(), 2);
        assert_eq!(window.size(), (50, 25));
        assert_eq!(window.device().stats().clears, 2);

        window.close();
        assert!(!window.is_open());
    }
}
