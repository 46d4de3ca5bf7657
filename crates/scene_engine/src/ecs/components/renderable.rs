//! Handles to the GPU resources an entity is drawn with
//!
//! The components share the scene's registered resources; they never own
//! GPU handles themselves, so the scene's registries stay the only place
//! anything is released.

use crate::assets::Shared;
use crate::ecs::Component;
use crate::render::{Mesh, Shader, Texture};

/// Geometry an entity is drawn with
#[derive(Debug, Clone)]
pub struct MeshComponent(pub Shared<Mesh>);

/// Program an entity is drawn with
#[derive(Debug, Clone)]
pub struct ShaderComponent(pub Shared<Shader>);

/// Texture bound to unit 0 while drawing the entity
#[derive(Debug, Clone)]
pub struct TextureComponent(pub Shared<Texture>);

impl Component for MeshComponent {}
impl Component for ShaderComponent {}
impl Component for TextureComponent {}
