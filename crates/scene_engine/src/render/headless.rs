//! In-memory graphics backend
//!
//! `HeadlessDevice` implements [`GraphicsApi`] without a GPU. It hands out
//! integer handles, remembers which ones are alive and counts the work it was
//! asked to do. Headless runs, CI and the engine's own tests use it to check
//! that every acquired handle is released again.

use std::collections::{BTreeMap, VecDeque};

use super::api::{BufferKind, GpuHandle, GraphicsApi, RenderError, RenderResult, TextureData, UniformValue};

/// Kind of object a live handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// Buffer object
    Buffer,
    /// Vertex array object
    VertexArray,
    /// Texture object
    Texture,
    /// Linked program
    Program,
}

/// Source marker that makes [`HeadlessDevice::create_program`] fail like a driver would
pub const COMPILE_ERROR_MARKER: &str = "#error";

/// Counters for work submitted to the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Indexed draw calls
    pub draw_calls: u64,
    /// Framebuffer clears
    pub clears: u64,
    /// Bytes uploaded into buffers and textures
    pub bytes_uploaded: u64,
    /// Uniform writes
    pub uniform_writes: u64,
}

/// GPU-less implementation of [`GraphicsApi`]
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: u32,
    live: BTreeMap<GpuHandle, HandleKind>,
    active_program: Option<GpuHandle>,
    viewport: (u32, u32),
    pending_errors: VecDeque<u32>,
    stats: DeviceStats,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet deleted
    pub fn live_handle_count(&self) -> usize {
        self.live.len()
    }

    /// Number of live handles of one kind
    pub fn live_count(&self, kind: HandleKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }

    /// Whether `handle` is alive
    pub fn is_live(&self, handle: GpuHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Work counters
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Current viewport size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Currently bound program
    pub fn active_program(&self) -> Option<GpuHandle> {
        self.active_program
    }

    /// Queue an error code to be reported by the next [`GraphicsApi::poll_error`]
    pub fn inject_error(&mut self, code: u32) {
        self.pending_errors.push_back(code);
    }

    fn allocate(&mut self, kind: HandleKind) -> GpuHandle {
        self.next_handle += 1;
        let handle = GpuHandle(self.next_handle);
        self.live.insert(handle, kind);
        log::trace!("headless: created {kind:?} {handle:?}");
        handle
    }

    fn expect(&self, handle: GpuHandle, kind: HandleKind) -> RenderResult<()> {
        match self.live.get(&handle) {
            Some(k) if *k == kind => Ok(()),
            _ => Err(RenderError::InvalidHandle(handle)),
        }
    }

    fn release(&mut self, handle: GpuHandle, kind: HandleKind) {
        match self.live.get(&handle) {
            Some(k) if *k == kind => {
                self.live.remove(&handle);
                log::trace!("headless: deleted {kind:?} {handle:?}");
            }
            _ => log::warn!("headless: delete of unknown {kind:?} {handle:?}"),
        }
    }
}

impl GraphicsApi for HeadlessDevice {
    fn create_buffer(&mut self) -> RenderResult<GpuHandle> {
        Ok(self.allocate(HandleKind::Buffer))
    }

    fn upload_buffer(&mut self, buffer: GpuHandle, kind: BufferKind, data: &[u8]) -> RenderResult<()> {
        self.expect(buffer, HandleKind::Buffer)?;
        if kind == BufferKind::Index && data.len() % 4 != 0 {
            return Err(RenderError::InvalidData(format!(
                "index buffer length {} is not a multiple of 4",
                data.len()
            )));
        }
        self.stats.bytes_uploaded += data.len() as u64;
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: GpuHandle) {
        self.release(buffer, HandleKind::Buffer);
    }

    fn create_vertex_array(&mut self) -> RenderResult<GpuHandle> {
        Ok(self.allocate(HandleKind::VertexArray))
    }

    fn attach_buffers(
        &mut self,
        vertex_array: GpuHandle,
        vertex_buffer: GpuHandle,
        index_buffer: GpuHandle,
        stride: u32,
    ) -> RenderResult<()> {
        self.expect(vertex_array, HandleKind::VertexArray)?;
        self.expect(vertex_buffer, HandleKind::Buffer)?;
        self.expect(index_buffer, HandleKind::Buffer)?;
        if stride == 0 {
            return Err(RenderError::InvalidData("vertex stride must be non-zero".to_string()));
        }
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: GpuHandle) {
        self.release(vertex_array, HandleKind::VertexArray);
    }

    fn create_texture(&mut self) -> RenderResult<GpuHandle> {
        Ok(self.allocate(HandleKind::Texture))
    }

    fn upload_texture(&mut self, texture: GpuHandle, data: &TextureData) -> RenderResult<()> {
        self.expect(texture, HandleKind::Texture)?;
        if !data.is_consistent() {
            return Err(RenderError::InvalidData(format!(
                "{}x{} texture needs {} bytes, got {}",
                data.width,
                data.height,
                u64::from(data.width) * u64::from(data.height) * 4,
                data.pixels.len()
            )));
        }
        self.stats.bytes_uploaded += data.pixels.len() as u64;
        Ok(())
    }

    fn bind_texture(&mut self, texture: GpuHandle, _unit: u32) -> RenderResult<()> {
        self.expect(texture, HandleKind::Texture)
    }

    fn delete_texture(&mut self, texture: GpuHandle) {
        self.release(texture, HandleKind::Texture);
    }

    fn create_program(&mut self, name: &str, vertex_source: &str, fragment_source: &str) -> RenderResult<GpuHandle> {
        for (stage, source) in [("vertex", vertex_source), ("fragment", fragment_source)] {
            if source.trim().is_empty() {
                return Err(RenderError::ShaderCompilation {
                    name: name.to_string(),
                    log: format!("{stage} shader: empty source"),
                });
            }
            if let Some(line) = source.lines().position(|l| l.contains(COMPILE_ERROR_MARKER)) {
                return Err(RenderError::ShaderCompilation {
                    name: name.to_string(),
                    log: format!("{stage} shader: 0:{}: error directive", line + 1),
                });
            }
        }
        Ok(self.allocate(HandleKind::Program))
    }

    fn use_program(&mut self, program: GpuHandle) -> RenderResult<()> {
        self.expect(program, HandleKind::Program)?;
        self.active_program = Some(program);
        Ok(())
    }

    fn set_uniform(&mut self, program: GpuHandle, _name: &str, _value: UniformValue) -> RenderResult<()> {
        self.expect(program, HandleKind::Program)?;
        self.stats.uniform_writes += 1;
        Ok(())
    }

    fn delete_program(&mut self, program: GpuHandle) {
        if self.active_program == Some(program) {
            self.active_program = None;
        }
        self.release(program, HandleKind::Program);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.stats.clears += 1;
    }

    fn draw_indexed(&mut self, vertex_array: GpuHandle, _index_count: u32) -> RenderResult<()> {
        self.expect(vertex_array, HandleKind::VertexArray)?;
        self.stats.draw_calls += 1;
        Ok(())
    }

    fn poll_error(&mut self) -> Option<u32> {
        self.pending_errors.pop_front()
    }
}
