//! Camera component
//!
//! Perspective camera with Y-up orientation. The scene keeps its aspect ratio
//! in step with the framebuffer on resize.

use crate::ecs::Component;
use crate::foundation::math::{deg_to_rad, Mat4, Point3, Vec3};

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    /// Eye position
    pub position: Vec3,
    /// Point looked at
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Width over height
    pub aspect: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Component for CameraComponent {}

impl CameraComponent {
    /// Create a new perspective camera looking at the origin
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            fov: deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Builder pattern: Set the look-at target
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Update the aspect ratio from a framebuffer size. Zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::trace!("Ignoring {width}x{height} viewport for camera aspect");
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(self.position), &Point3::from(self.target), &self.up)
    }

    /// View-to-clip matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Combined projection * view
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 2.0, 6.0), 45.0, 16.0 / 9.0, 0.1, 100.0)
    }
}
