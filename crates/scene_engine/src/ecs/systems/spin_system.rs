//! Applies [`SpinComponent`] rotation each update

use crate::ecs::components::{SpinComponent, TransformComponent};
use crate::ecs::{System, SystemResult, SystemRoles, World};
use crate::input::InputState;

/// Rotates spinning entities by `speed * delta_time` per update
#[derive(Debug, Default)]
pub struct SpinSystem;

impl System for SpinSystem {
    fn name(&self) -> &'static str {
        "SpinSystem"
    }

    fn roles(&self) -> SystemRoles {
        SystemRoles::UPDATE
    }

    fn update(&mut self, world: &mut World, _input: &InputState, delta_time: f32) -> SystemResult {
        for (_, (transform, spin)) in world.query_mut::<(TransformComponent, SpinComponent)>() {
            transform.rotate(spin.axis, spin.speed * delta_time);
        }
        Ok(())
    }
}
