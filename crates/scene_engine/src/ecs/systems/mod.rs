//! ECS Systems module

pub mod rendering_system;
pub mod spin_system;
pub mod visibility_toggle;

pub use rendering_system::RenderingSystem;
pub use spin_system::SpinSystem;
pub use visibility_toggle::VisibilityToggleSystem;
