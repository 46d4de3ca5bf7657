//! ECS Components module

pub mod camera;
pub mod movement;
pub mod renderable;
pub mod tags;
pub mod transform;

pub use camera::CameraComponent;
pub use movement::SpinComponent;
pub use renderable::{MeshComponent, ShaderComponent, TextureComponent};
pub use tags::{Toggleable, Visible};
pub use transform::TransformComponent;
