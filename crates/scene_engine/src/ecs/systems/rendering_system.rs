//! # Rendering System
//!
//! Draws every visible entity that has a transform, a mesh and a shader, using
//! the first camera found in the world. An optional texture is bound to unit 0.

use crate::ecs::components::{
    CameraComponent, MeshComponent, ShaderComponent, TextureComponent, TransformComponent, Visible,
};
use crate::ecs::{System, SystemResult, SystemRoles, World};
use crate::render::api::GraphicsApi;

/// Uniform receiving the model matrix
pub const MODEL_UNIFORM: &str = "u_model";
/// Uniform receiving the camera's projection * view matrix
pub const VIEW_PROJECTION_UNIFORM: &str = "u_view_projection";
/// Sampler uniform for the entity texture
pub const TEXTURE_UNIFORM: &str = "u_texture";

/// System responsible for issuing draw calls
#[derive(Debug)]
pub struct RenderingSystem {
    drawn_last_frame: usize,
    enabled: bool,
}

impl RenderingSystem {
    /// Create a new rendering system
    pub fn new() -> Self {
        Self {
            drawn_last_frame: 0,
            enabled: true,
        }
    }

    /// Enable or disable the rendering system
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Entities drawn in the most recent render pass
    pub fn drawn_last_frame(&self) -> usize {
        self.drawn_last_frame
    }
}

impl Default for RenderingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RenderingSystem {
    fn name(&self) -> &'static str {
        "RenderingSystem"
    }

    fn roles(&self) -> SystemRoles {
        SystemRoles::RENDER
    }

    fn render(&mut self, world: &mut World, gpu: &mut dyn GraphicsApi, _delta_time: f32) -> SystemResult {
        self.drawn_last_frame = 0;
        if !self.enabled {
            return Ok(());
        }

        let world: &World = world;
        let Some((_, (camera,))) = world.query::<(CameraComponent,)>().single() else {
            log::trace!("RenderingSystem: no camera in world, nothing drawn");
            return Ok(());
        };
        let view_projection = camera.view_projection_matrix();

        let drawable = world.query::<(TransformComponent, MeshComponent, ShaderComponent, Visible)>();
        for (entity, (transform, mesh, shader, _)) in drawable.iter() {
            let shader = shader.0.borrow();
            shader.bind(gpu)?;
            shader.set_mat4(gpu, VIEW_PROJECTION_UNIFORM, &view_projection)?;
            shader.set_mat4(gpu, MODEL_UNIFORM, &transform.to_matrix())?;

            if let Some(texture) = world.get_component::<TextureComponent>(entity) {
                texture.0.borrow().bind(gpu, 0)?;
                shader.set_int(gpu, TEXTURE_UNIFORM, 0)?;
            }

            mesh.0.borrow().draw(gpu)?;
            self.drawn_last_frame += 1;
        }
        log::trace!("RenderingSystem: {} entities drawn", self.drawn_last_frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{dispose, initialize, shared};
    use crate::render::{Mesh, MeshData, Shader, Texture, TextureData};
    use crate::testing::TestServices;

    #[test]
    fn test_draws_only_visible_entities_with_camera() {
        let mut services = TestServices::new();
        let shader = shared(Shader::from_source("flat", "void main() {}", "void main() {}"));
        let mesh = shared(Mesh::new("cube", MeshData::cube()));
        let texture = shared(Texture::from_pixels("white", TextureData::solid([255; 4])));
        initialize(&*shader, &mut services.context()).unwrap();
        initialize(&*mesh, &mut services.context()).unwrap();
        initialize(&*texture, &mut services.context()).unwrap();

        let mut world = World::new();
        world.add_system(RenderingSystem::new());
        for visible in [true, true, false] {
            let e = world.create_entity();
            world.add_component(e, TransformComponent::identity());
            world.add_component(e, MeshComponent(mesh.clone()));
            world.add_component(e, ShaderComponent(shader.clone()));
            world.add_component(e, TextureComponent(texture.clone()));
            if visible {
                world.add_component(e, Visible);
            }
        }

        // No camera yet: nothing drawn.
        world.render(&mut services.device, 0.016).unwrap();
        assert_eq!(services.device.stats().draw_calls, 0);

        let camera = world.create_entity();
        world.add_component(camera, CameraComponent::default());
        world.render(&mut services.device, 0.016).unwrap();
        assert_eq!(services.device.stats().draw_calls, 2);
        // view-projection, model and sampler per entity
        assert_eq!(services.device.stats().uniform_writes, 6);

        dispose(&*mesh, &mut services.context()).unwrap();
        dispose(&*texture, &mut services.context()).unwrap();
        dispose(&*shader, &mut services.context()).unwrap();
        assert_eq!(services.device.live_handle_count(), 0);
    }

    #[test]
    fn test_unloaded_shader_aborts_pass() {
        let mut services = TestServices::new();
        let shader = shared(Shader::from_source("idle", "void main() {}", "void main() {}"));
        let mesh = shared(Mesh::new("tri", MeshData::triangle()));

        let mut world = World::new();
        world.add_system(RenderingSystem::new());
        let camera = world.create_entity();
        world.add_component(camera, CameraComponent::default());
        let e = world.create_entity();
        world.add_component(e, TransformComponent::identity());
        world.add_component(e, MeshComponent(mesh));
        world.add_component(e, ShaderComponent(shader));
        world.add_component(e, Visible);

        assert!(world.render(&mut services.device, 0.016).is_err());
    }
}
