//! Backend abstraction for the graphics API
//!
//! The engine never talks to a GPU directly. Everything goes through
//! [`GraphicsApi`], which deals in opaque integer handles with explicit
//! create / bind / upload / delete verbs. Backends decide what a handle means.

use thiserror::Error;

/// Opaque handle to a GPU object (buffer, vertex array, texture or program)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuHandle(pub u32);

/// What a buffer holds, so backends can pick the right binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Interleaved vertex attributes
    Vertex,
    /// `u32` element indices
    Index,
}

/// CPU-side RGBA8 image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// A single-colour 1x1 texture
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Whether the pixel buffer matches the declared size
    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

/// Value for a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Scalar float
    Float(f32),
    /// Scalar int (also used for sampler units)
    Int(i32),
    /// 3-component vector
    Vec3([f32; 3]),
    /// 4-component vector
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([[f32; 4]; 4]),
}

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Shader compilation or linking failed; carries the driver log
    #[error("Shader compilation failed for '{name}':\n{log}")]
    ShaderCompilation {
        /// Program name as known to the engine
        name: String,
        /// Diagnostic log from the compiler/linker
        log: String,
    },

    /// A GPU call reported an error code (debug builds only)
    #[error("Graphics API error after {operation}: code 0x{code:04X}")]
    Api {
        /// Operation that was checked
        operation: String,
        /// Backend error code
        code: u32,
    },

    /// Handle does not name a live object of the expected kind
    #[error("Invalid GPU handle {0:?}")]
    InvalidHandle(GpuHandle),

    /// Uploaded data is malformed
    #[error("Invalid upload: {0}")]
    InvalidData(String),
}

/// Result type for graphics operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Graphics API collaborator contract
///
/// Implementations own the graphics context. All calls happen on the thread
/// that owns that context.
pub trait GraphicsApi {
    /// Create an empty buffer object
    fn create_buffer(&mut self) -> RenderResult<GpuHandle>;

    /// Upload raw bytes into a buffer
    fn upload_buffer(&mut self, buffer: GpuHandle, kind: BufferKind, data: &[u8]) -> RenderResult<()>;

    /// Delete a buffer
    fn delete_buffer(&mut self, buffer: GpuHandle);

    /// Create a vertex array object
    fn create_vertex_array(&mut self) -> RenderResult<GpuHandle>;

    /// Attach vertex and index buffers to a vertex array with the given vertex stride
    fn attach_buffers(
        &mut self,
        vertex_array: GpuHandle,
        vertex_buffer: GpuHandle,
        index_buffer: GpuHandle,
        stride: u32,
    ) -> RenderResult<()>;

    /// Delete a vertex array
    fn delete_vertex_array(&mut self, vertex_array: GpuHandle);

    /// Create an empty texture
    fn create_texture(&mut self) -> RenderResult<GpuHandle>;

    /// Upload RGBA8 pixels into a texture
    fn upload_texture(&mut self, texture: GpuHandle, data: &TextureData) -> RenderResult<()>;

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, texture: GpuHandle, unit: u32) -> RenderResult<()>;

    /// Delete a texture
    fn delete_texture(&mut self, texture: GpuHandle);

    /// Compile and link a program from vertex and fragment sources
    fn create_program(&mut self, name: &str, vertex_source: &str, fragment_source: &str) -> RenderResult<GpuHandle>;

    /// Make a program current
    fn use_program(&mut self, program: GpuHandle) -> RenderResult<()>;

    /// Set a uniform on a program
    fn set_uniform(&mut self, program: GpuHandle, name: &str, value: UniformValue) -> RenderResult<()>;

    /// Delete a program
    fn delete_program(&mut self, program: GpuHandle);

    /// Set the viewport rectangle
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the current framebuffer
    fn clear(&mut self, color: [f32; 4]);

    /// Draw indexed triangles from a vertex array
    fn draw_indexed(&mut self, vertex_array: GpuHandle, index_count: u32) -> RenderResult<()>;

    /// Pop the oldest pending error code, if any
    fn poll_error(&mut self) -> Option<u32>;
}

/// Check for a pending API error after `operation`.
///
/// Only debug builds pay for the check; release builds return `Ok(())`
/// without touching the backend.
pub fn check_error(gpu: &mut dyn GraphicsApi, operation: &str) -> RenderResult<()> {
    if cfg!(debug_assertions) {
        if let Some(code) = gpu.poll_error() {
            log::error!("Graphics API error 0x{code:04X} after {operation}");
            return Err(RenderError::Api {
                operation: operation.to_string(),
                code,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_texture_is_consistent() {
        let data = TextureData::solid([255, 0, 0, 255]);
        assert!(data.is_consistent());

        let broken = TextureData {
            width: 2,
            height: 2,
            pixels: vec![0; 4],
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_api_error_message_names_operation() {
        let err = RenderError::Api {
            operation: "upload_texture".to_string(),
            code: 0x0502,
        };
        assert_eq!(err.to_string(), "Graphics API error after upload_texture: code 0x0502");
    }
}
