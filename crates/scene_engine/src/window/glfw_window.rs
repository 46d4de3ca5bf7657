//! Window management using GLFW
//!
//! The window and its event loop come from GLFW; drawing goes through the
//! [`GraphicsApi`] implementation supplied by the application, which is
//! expected to target the context this window creates.

use glfw::{Action, Context, GlfwReceiver, PWindow, WindowEvent};

use crate::core::config::RenderSettings;
use crate::engine::EngineError;
use crate::foundation::time::Timer;
use crate::input::{InputState, KeyCode, MouseButton};
use crate::render::api::GraphicsApi;

use super::{FrameContext, FrameHandler, WindowBackend, WindowError};

struct OpenWindow {
    glfw: glfw::Glfw,
    window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
}

/// GLFW window wrapper
pub struct GlfwWindow {
    state: Option<OpenWindow>,
    gpu: Box<dyn GraphicsApi>,
    client_api: glfw::ClientApiHint,
    input: InputState,
    timer: Timer,
}

impl GlfwWindow {
    /// Window drawing through `gpu`. No client API context is requested by default.
    pub fn new(gpu: Box<dyn GraphicsApi>) -> Self {
        Self {
            state: None,
            gpu,
            client_api: glfw::ClientApiHint::NoApi,
            input: InputState::new(),
            timer: Timer::new(),
        }
    }

    /// Request a client API context (e.g. OpenGL) for `gpu` to use
    pub fn with_client_api(mut self, client_api: glfw::ClientApiHint) -> Self {
        self.client_api = client_api;
        self
    }

    fn has_context(&self) -> bool {
        !matches!(self.client_api, glfw::ClientApiHint::NoApi)
    }
}

impl WindowBackend for GlfwWindow {
    fn open(&mut self, settings: &RenderSettings) -> Result<(), WindowError> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ClientApi(self.client_api));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(settings.width, settings.height, &settings.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);

        if self.has_context() {
            window.make_current();
            glfw.set_swap_interval(if settings.vsync {
                glfw::SwapInterval::Sync(1)
            } else {
                glfw::SwapInterval::None
            });
        }

        log::info!("GLFW window '{}' opened ({}x{})", settings.title, settings.width, settings.height);
        self.state = Some(OpenWindow { glfw, window, events });
        Ok(())
    }

    fn run(&mut self, handler: &mut dyn FrameHandler) -> Result<(), EngineError> {
        let has_context = self.has_context();
        let Self {
            state,
            gpu,
            input,
            timer,
            ..
        } = self;
        let Some(OpenWindow { glfw, window, events }) = state.as_mut() else {
            return Err(WindowError::NotOpen.into());
        };

        let (width, height) = framebuffer_size(window);
        handler.on_load(&mut FrameContext {
            gpu: gpu.as_mut(),
            input: &*input,
        })?;
        handler.on_resize(
            &mut FrameContext {
                gpu: gpu.as_mut(),
                input: &*input,
            },
            width,
            height,
        )?;
        *timer = Timer::new();

        while !window.should_close() {
            glfw.poll_events();
            input.begin_frame();
            let mut resized = None;
            for (_, event) in glfw::flush_messages(events) {
                match event {
                    WindowEvent::Key(glfw::Key::Escape, _, Action::Press, _) => window.set_should_close(true),
                    WindowEvent::Key(key, _, action, _) => {
                        if let Some(code) = map_key(key) {
                            input.handle_key_input(code, action != Action::Release);
                        }
                    }
                    WindowEvent::MouseButton(button, action, _) => {
                        if let Some(button) = map_mouse_button(button) {
                            input.handle_mouse_button(button, action != Action::Release);
                        }
                    }
                    WindowEvent::CursorPos(x, y) => input.handle_mouse_move(x, y),
                    WindowEvent::FramebufferSize(w, h) => resized = Some((w.max(0) as u32, h.max(0) as u32)),
                    _ => {}
                }
            }

            timer.update();
            let delta_time = timer.delta_time();
            let mut ctx = FrameContext {
                gpu: gpu.as_mut(),
                input: &*input,
            };
            if let Some((width, height)) = resized {
                handler.on_resize(&mut ctx, width, height)?;
            }
            handler.on_update_frame(&mut ctx, delta_time)?;
            handler.on_render_frame(&mut ctx, delta_time)?;

            if has_context {
                window.swap_buffers();
            }
        }

        log::info!("GLFW window loop exited after {} frames", timer.frame_count());
        Ok(())
    }

    fn graphics(&mut self) -> &mut dyn GraphicsApi {
        self.gpu.as_mut()
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::info!("GLFW window closed");
        }
    }
}

fn framebuffer_size(window: &PWindow) -> (u32, u32) {
    let (width, height) = window.get_framebuffer_size();
    (width.max(0) as u32, height.max(0) as u32)
}

fn map_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        _ => None,
    }
}

fn map_key(key: glfw::Key) -> Option<KeyCode> {
    use glfw::Key;
    Some(match key {
        Key::A => KeyCode::A,
        Key::B => KeyCode::B,
        Key::C => KeyCode::C,
        Key::D => KeyCode::D,
        Key::E => KeyCode::E,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::H => KeyCode::H,
        Key::I => KeyCode::I,
        Key::J => KeyCode::J,
        Key::K => KeyCode::K,
        Key::L => KeyCode::L,
        Key::M => KeyCode::M,
        Key::N => KeyCode::N,
        Key::O => KeyCode::O,
        Key::P => KeyCode::P,
        Key::Q => KeyCode::Q,
        Key::R => KeyCode::R,
        Key::S => KeyCode::S,
        Key::T => KeyCode::T,
        Key::U => KeyCode::U,
        Key::V => KeyCode::V,
        Key::W => KeyCode::W,
        Key::X => KeyCode::X,
        Key::Y => KeyCode::Y,
        Key::Z => KeyCode::Z,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Escape => KeyCode::Escape,
        Key::Tab => KeyCode::Tab,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        Key::Num1 => KeyCode::Num1,
        Key::Num2 => KeyCode::Num2,
        Key::Num3 => KeyCode::Num3,
        _ => return None,
    })
}
