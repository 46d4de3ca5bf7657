//! Shader program resource

use std::rc::Rc;

use crate::assets::{Lifecycle, Resource, ResourceContext, ResourceError};
use crate::foundation::math::{to_cols_array, Mat4, Vec3, Vec4};

use super::api::{check_error, GpuHandle, GraphicsApi, RenderResult, UniformValue};

/// Where a program's stage sources come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// Paths resolved through the asset service
    Files {
        /// Vertex stage path
        vertex: String,
        /// Fragment stage path
        fragment: String,
    },
    /// Sources embedded in code
    Inline {
        /// Vertex stage source
        vertex: String,
        /// Fragment stage source
        fragment: String,
    },
}

/// Compiled and linked shader program
#[derive(Debug)]
pub struct Shader {
    lifecycle: Lifecycle,
    source: ShaderSource,
    program: Option<GpuHandle>,
}

impl Shader {
    /// Program whose stages are read from files when it loads
    pub fn from_files(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::new(
            name,
            ShaderSource::Files {
                vertex: vertex.into(),
                fragment: fragment.into(),
            },
        )
    }

    /// Program over inline sources
    pub fn from_source(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::new(
            name,
            ShaderSource::Inline {
                vertex: vertex.into(),
                fragment: fragment.into(),
            },
        )
    }

    /// Unloaded program over `source`
    pub fn new(name: impl Into<String>, source: ShaderSource) -> Self {
        Self {
            lifecycle: Lifecycle::new(name),
            source,
            program: None,
        }
    }

    /// Stage sources
    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    /// Program handle while loaded
    pub fn program(&self) -> Option<GpuHandle> {
        self.program
    }

    fn require_program(&self) -> Result<GpuHandle, ResourceError> {
        self.program.ok_or_else(|| ResourceError::Failed {
            resource: self.name().to_string(),
            reason: "program is not loaded".to_string(),
        })
    }

    /// Make this program current
    pub fn bind(&self, gpu: &mut dyn GraphicsApi) -> Result<(), ResourceError> {
        let program = self.require_program()?;
        gpu.use_program(program)?;
        Ok(())
    }

    /// Set a uniform by name
    pub fn set_uniform(&self, gpu: &mut dyn GraphicsApi, name: &str, value: UniformValue) -> Result<(), ResourceError> {
        let program = self.require_program()?;
        gpu.set_uniform(program, name, value)?;
        Ok(())
    }

    /// Set a matrix uniform
    pub fn set_mat4(&self, gpu: &mut dyn GraphicsApi, name: &str, value: &Mat4) -> Result<(), ResourceError> {
        self.set_uniform(gpu, name, UniformValue::Mat4(to_cols_array(value)))
    }

    /// Set a vector uniform
    pub fn set_vec3(&self, gpu: &mut dyn GraphicsApi, name: &str, value: &Vec3) -> Result<(), ResourceError> {
        self.set_uniform(gpu, name, UniformValue::Vec3([value.x, value.y, value.z]))
    }

    /// Set a 4-component vector uniform
    pub fn set_vec4(&self, gpu: &mut dyn GraphicsApi, name: &str, value: &Vec4) -> Result<(), ResourceError> {
        self.set_uniform(gpu, name, UniformValue::Vec4([value.x, value.y, value.z, value.w]))
    }

    /// Set an integer uniform, e.g. a sampler unit
    pub fn set_int(&self, gpu: &mut dyn GraphicsApi, name: &str, value: i32) -> Result<(), ResourceError> {
        self.set_uniform(gpu, name, UniformValue::Int(value))
    }

    fn sources(&self, ctx: &mut ResourceContext<'_>) -> Result<(Rc<str>, Rc<str>), ResourceError> {
        Ok(match &self.source {
            ShaderSource::Files { vertex, fragment } => {
                (ctx.assets.read_text(vertex)?, ctx.assets.read_text(fragment)?)
            }
            ShaderSource::Inline { vertex, fragment } => (vertex.as_str().into(), fragment.as_str().into()),
        })
    }

    fn compile(&self, gpu: &mut dyn GraphicsApi, vertex: &str, fragment: &str) -> RenderResult<GpuHandle> {
        let program = gpu.create_program(self.name(), vertex, fragment)?;
        if let Err(err) = check_error(gpu, "create_program") {
            gpu.delete_program(program);
            return Err(err);
        }
        Ok(program)
    }
}

impl Resource for Shader {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn load(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        let (vertex, fragment) = self.sources(ctx)?;
        let program = self.compile(&mut *ctx.gpu, &vertex, &fragment)?;
        self.program = Some(program);
        log::debug!("Shader '{}' linked as {program:?}", self.name());
        Ok(())
    }

    fn unload(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        if let Some(program) = self.program.take() {
            ctx.gpu.delete_program(program);
        }
        Ok(())
    }
}
