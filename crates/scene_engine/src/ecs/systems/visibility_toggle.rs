//! Key-driven visibility toggling

use crate::ecs::components::{Toggleable, Visible};
use crate::ecs::{Entity, System, SystemResult, SystemRoles, World};
use crate::input::{InputState, KeyCode};

/// Adds or removes [`Visible`] on every [`Toggleable`] entity when a key is pressed
#[derive(Debug)]
pub struct VisibilityToggleSystem {
    key: KeyCode,
    visible: bool,
}

impl VisibilityToggleSystem {
    /// Toggle on `key`; toggleable entities start out visible
    pub fn new(key: KeyCode) -> Self {
        Self { key, visible: true }
    }

    /// Whether toggleable entities are currently shown
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl System for VisibilityToggleSystem {
    fn name(&self) -> &'static str {
        "VisibilityToggleSystem"
    }

    fn roles(&self) -> SystemRoles {
        SystemRoles::UPDATE
    }

    fn update(&mut self, world: &mut World, input: &InputState, _delta_time: f32) -> SystemResult {
        if !input.is_key_pressed(self.key) {
            return Ok(());
        }
        self.visible = !self.visible;

        let targets: Vec<Entity> = world.query::<(Toggleable,)>().iter().map(|(e, _)| e).collect();
        let visible = self.visible;
        log::debug!("Toggling {} entities to visible={visible}", targets.len());
        world.defer(move |world| {
            for entity in targets {
                if visible {
                    world.add_component(entity, Visible);
                } else {
                    world.remove_component::<Visible>(entity);
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_flips_visible_tags() {
        let mut world = World::new();
        let toggled = world.create_entity();
        world.add_component(toggled, Toggleable);
        world.add_component(toggled, Visible);
        let fixed = world.create_entity();
        world.add_component(fixed, Visible);
        world.add_system(VisibilityToggleSystem::new(KeyCode::V));

        let mut input = InputState::new();
        world.update(&input, 0.016).unwrap();
        assert!(world.has_component::<Visible>(toggled));

        input.handle_key_input(KeyCode::V, true);
        world.update(&input, 0.016).unwrap();
        assert!(!world.has_component::<Visible>(toggled));
        assert!(world.has_component::<Visible>(fixed));

        input.begin_frame();
        input.handle_key_input(KeyCode::V, false);
        input.handle_key_input(KeyCode::V, true);
        world.update(&input, 0.016).unwrap();
        assert!(world.has_component::<Visible>(toggled));
    }
}
