//! Rendering: graphics API contract, GPU resources and the frame renderer

pub mod api;
pub mod headless;
pub mod mesh;
pub mod renderer;
pub mod shader;
pub mod texture;

pub use api::{check_error, BufferKind, GpuHandle, GraphicsApi, RenderError, RenderResult, TextureData, UniformValue};
pub use headless::{DeviceStats, HandleKind, HeadlessDevice};
pub use mesh::{Mesh, MeshData, Vertex};
pub use renderer::{FrameStats, Renderer};
pub use shader::{Shader, ShaderSource};
pub use texture::{Texture, TextureSource};
