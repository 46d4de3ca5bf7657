//! Mesh geometry and its GPU resource
//!
//! [`MeshData`] is plain CPU geometry. [`Mesh`] is the resource that uploads it
//! into a vertex array with one vertex and one index buffer.

use crate::assets::{Lifecycle, Resource, ResourceContext, ResourceError};

use super::api::{check_error, BufferKind, GpuHandle, GraphicsApi, RenderResult};

/// Interleaved vertex: position, normal, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Unit normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Floats per vertex
    pub const COMPONENTS: usize = 8;

    /// Size of one vertex in bytes, used as the buffer stride
    pub const STRIDE: u32 = (Self::COMPONENTS * std::mem::size_of::<f32>()) as u32;

    /// Create a vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Interleaved layout as uploaded to the vertex buffer
    pub fn to_array(&self) -> [f32; Self::COMPONENTS] {
        let [x, y, z] = self.position;
        let [nx, ny, nz] = self.normal;
        let [u, v] = self.tex_coord;
        [x, y, z, nx, ny, nz, u, v]
    }
}

/// Indexed triangle geometry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create geometry from raw parts
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Single triangle in the XY plane
    pub fn triangle() -> Self {
        let n = [0.0, 0.0, 1.0];
        Self::new(
            vec![
                Vertex::new([-0.5, -0.5, 0.0], n, [0.0, 0.0]),
                Vertex::new([0.5, -0.5, 0.0], n, [1.0, 0.0]),
                Vertex::new([0.0, 0.5, 0.0], n, [0.5, 1.0]),
            ],
            vec![0, 1, 2],
        )
    }

    /// Unit quad in the XY plane facing +Z
    pub fn quad() -> Self {
        let n = [0.0, 0.0, 1.0];
        Self::new(
            vec![
                Vertex::new([-0.5, -0.5, 0.0], n, [0.0, 0.0]),
                Vertex::new([0.5, -0.5, 0.0], n, [1.0, 0.0]),
                Vertex::new([0.5, 0.5, 0.0], n, [1.0, 1.0]),
                Vertex::new([-0.5, 0.5, 0.0], n, [0.0, 1.0]),
            ],
            vec![0, 1, 2, 2, 3, 0],
        )
    }

    /// Cube of edge length 1 centered at the origin.
    ///
    /// Every face has its own four vertices so normals stay flat: 24 vertices,
    /// 36 indices.
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face; u x v == normal
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in FACES {
            let base = vertices.len() as u32;
            for (a, b) in CORNERS {
                let position = [
                    normal[0] * 0.5 + u[0] * a + v[0] * b,
                    normal[1] * 0.5 + u[1] * a + v[1] * b,
                    normal[2] * 0.5 + u[2] * a + v[2] * b,
                ];
                vertices.push(Vertex::new(position, normal, [a + 0.5, b + 0.5]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self::new(vertices, indices)
    }

    /// Whether every index points at an existing vertex
    pub fn is_valid(&self) -> bool {
        self.indices.len() % 3 == 0 && self.indices.iter().all(|&i| (i as usize) < self.vertices.len())
    }
}

#[derive(Debug, Clone, Copy)]
struct MeshBuffers {
    vertex_array: GpuHandle,
    vertex_buffer: GpuHandle,
    index_buffer: GpuHandle,
}

/// Geometry resource: a vertex array plus its vertex and index buffers
#[derive(Debug)]
pub struct Mesh {
    lifecycle: Lifecycle,
    data: MeshData,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Unloaded mesh over `data`
    pub fn new(name: impl Into<String>, data: MeshData) -> Self {
        Self {
            lifecycle: Lifecycle::new(name),
            data,
            buffers: None,
        }
    }

    /// CPU geometry
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Number of indices drawn per call
    pub fn index_count(&self) -> u32 {
        self.data.indices.len() as u32
    }

    /// Vertex array handle while loaded
    pub fn vertex_array(&self) -> Option<GpuHandle> {
        self.buffers.map(|b| b.vertex_array)
    }

    /// Issue one indexed draw. Does nothing while unloaded.
    pub fn draw(&self, gpu: &mut dyn GraphicsApi) -> RenderResult<()> {
        let Some(buffers) = self.buffers else {
            log::trace!("Mesh '{}' drawn while not uploaded, skipping", self.name());
            return Ok(());
        };
        gpu.draw_indexed(buffers.vertex_array, self.index_count())?;
        check_error(gpu, "draw_indexed")
    }

    fn upload(&self, gpu: &mut dyn GraphicsApi, buffers: MeshBuffers) -> RenderResult<()> {
        let vertices: Vec<f32> = self.data.vertices.iter().flat_map(Vertex::to_array).collect();
        gpu.upload_buffer(
            buffers.vertex_buffer,
            BufferKind::Vertex,
            bytemuck::cast_slice(&vertices),
        )?;
        gpu.upload_buffer(
            buffers.index_buffer,
            BufferKind::Index,
            bytemuck::cast_slice(&self.data.indices),
        )?;
        gpu.attach_buffers(
            buffers.vertex_array,
            buffers.vertex_buffer,
            buffers.index_buffer,
            Vertex::STRIDE,
        )?;
        check_error(gpu, "mesh upload")
    }

    fn release(gpu: &mut dyn GraphicsApi, buffers: MeshBuffers) {
        gpu.delete_vertex_array(buffers.vertex_array);
        gpu.delete_buffer(buffers.index_buffer);
        gpu.delete_buffer(buffers.vertex_buffer);
    }
}

impl Resource for Mesh {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn load(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        if !self.data.is_valid() {
            return Err(ResourceError::Failed {
                resource: self.name().to_string(),
                reason: "index out of range or incomplete triangle".to_string(),
            });
        }

        let vertex_array = ctx.gpu.create_vertex_array()?;
        let vertex_buffer = match ctx.gpu.create_buffer() {
            Ok(handle) => handle,
            Err(err) => {
                ctx.gpu.delete_vertex_array(vertex_array);
                return Err(err.into());
            }
        };
        let index_buffer = match ctx.gpu.create_buffer() {
            Ok(handle) => handle,
            Err(err) => {
                ctx.gpu.delete_buffer(vertex_buffer);
                ctx.gpu.delete_vertex_array(vertex_array);
                return Err(err.into());
            }
        };
        let buffers = MeshBuffers {
            vertex_array,
            vertex_buffer,
            index_buffer,
        };
        if let Err(err) = self.upload(&mut *ctx.gpu, buffers) {
            Self::release(&mut *ctx.gpu, buffers);
            return Err(err.into());
        }
        self.buffers = Some(buffers);

        log::debug!(
            "Mesh '{}' uploaded: {} vertices, {} indices",
            self.name(),
            self.data.vertices.len(),
            self.data.indices.len()
        );
        Ok(())
    }

    fn unload(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        if let Some(buffers) = self.buffers.take() {
            Self::release(&mut *ctx.gpu, buffers);
        }
        Ok(())
    }
}
