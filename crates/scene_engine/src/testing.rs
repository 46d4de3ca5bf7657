//! Shared test fixtures

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::{AssetService, Lifecycle, MemoryAssetLoader, Resource, ResourceContext, ResourceError};
use crate::render::api::{GpuHandle, GraphicsApi};
use crate::render::headless::HeadlessDevice;

/// Ordered record of hook calls
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Resource that records `load:<name>` / `unload:<name>` and holds one buffer while loaded
#[derive(Debug)]
pub struct Probe {
    lifecycle: Lifecycle,
    log: EventLog,
    buffer: Option<GpuHandle>,
    fail_load: bool,
    fail_unload: bool,
}

impl Probe {
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            lifecycle: Lifecycle::new(name),
            log: Rc::clone(log),
            buffer: None,
            fail_load: false,
            fail_unload: false,
        }
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn failing_unload(mut self) -> Self {
        self.fail_unload = true;
        self
    }

    fn failure(&self, reason: &str) -> ResourceError {
        ResourceError::Failed {
            resource: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Resource for Probe {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn load(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        self.log.borrow_mut().push(format!("load:{}", self.name()));
        if self.fail_load {
            return Err(self.failure("load refused"));
        }
        self.buffer = Some(ctx.gpu.create_buffer()?);
        Ok(())
    }

    fn unload(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        self.log.borrow_mut().push(format!("unload:{}", self.name()));
        if let Some(buffer) = self.buffer.take() {
            ctx.gpu.delete_buffer(buffer);
        }
        if self.fail_unload {
            return Err(self.failure("unload refused"));
        }
        Ok(())
    }
}

/// Headless device plus an in-memory asset service
pub struct TestServices {
    pub device: HeadlessDevice,
    pub assets: AssetService,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_loader(MemoryAssetLoader::new())
    }

    pub fn with_loader(loader: MemoryAssetLoader) -> Self {
        Self {
            device: HeadlessDevice::new(),
            assets: AssetService::new(loader),
        }
    }

    pub fn context(&mut self) -> ResourceContext<'_> {
        ResourceContext::new(&mut self.device, &mut self.assets)
    }
}

/// Loader with a working shader pair at `shaders/basic.vert` / `shaders/basic.frag`
/// and a 2x2 image at `textures/checker.png`
pub fn basic_loader() -> MemoryAssetLoader {
    MemoryAssetLoader::new()
        .with_text("shaders/basic.vert", "void main() { gl_Position = vec4(0.0); }")
        .with_text("shaders/basic.frag", "out vec4 color; void main() { color = vec4(1.0); }")
        .with_text("shaders/broken.frag", "#error does not compile")
        .with_image(
            "textures/checker.png",
            crate::render::api::TextureData {
                width: 2,
                height: 2,
                pixels: vec![255; 16],
            },
        )
}
