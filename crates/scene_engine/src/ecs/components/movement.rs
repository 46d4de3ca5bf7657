//! Continuous rotation for entities that spin in place

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Spin around an axis at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct SpinComponent {
    /// Rotation axis (need not be normalized)
    pub axis: Vec3,
    /// Angular speed in radians per second
    pub speed: f32,
}

impl Component for SpinComponent {}

impl SpinComponent {
    /// Spin around `axis` at `speed` radians per second
    pub fn new(axis: Vec3, speed: f32) -> Self {
        Self { axis, speed }
    }
}

impl Default for SpinComponent {
    fn default() -> Self {
        Self::new(Vec3::y(), 1.0)
    }
}
