//! ECS World implementation

use std::any::TypeId;
use std::collections::HashMap;

use slotmap::SlotMap;

use super::component::{downcast, downcast_mut, AnyStorage, Component, ComponentStorage};
use super::query::{Query, QueryData, QueryDataMut};
use super::system::{System, SystemPhase, SystemResult};
use super::Entity;
use crate::input::InputState;
use crate::render::api::GraphicsApi;

type Command = Box<dyn FnOnce(&mut World)>;

/// ECS World containing all entities, components and systems of one scene
pub struct World {
    entities: SlotMap<Entity, ()>,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
    systems: Vec<Box<dyn System>>,
    phases: [Vec<usize>; 3],
    pending_systems: Vec<Box<dyn System>>,
    commands: Vec<Command>,
    running: Option<SystemPhase>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            storages: HashMap::new(),
            systems: Vec::new(),
            phases: [Vec::new(), Vec::new(), Vec::new()],
            pending_systems: Vec::new(),
            commands: Vec::new(),
            running: None,
        }
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Destroy an entity and every component attached to it
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    /// Whether the entity exists
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in stable slot order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Attach a component, replacing (and returning) any previous one of the same type
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        if !self.is_alive(entity) {
            log::warn!(
                "add_component::<{}> on dead entity {entity:?} ignored",
                std::any::type_name::<T>()
            );
            return None;
        }
        self.storage_mut_or_insert::<T>().insert(entity, component)
    }

    /// Detach a component
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Component of an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Mutable component of an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Whether the entity holds a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|s| s.contains(entity))
    }

    /// Number of stored components across all types
    pub fn component_count(&self) -> usize {
        self.storages.values().map(|s| s.len()).sum()
    }

    /// Rows of every entity holding all components in `Q`
    pub fn query<Q: QueryData>(&self) -> Query<'_, Q> {
        Query::new(self)
    }

    /// Mutable rows of every entity holding all components in `Q`
    pub fn query_mut<Q: QueryDataMut>(&mut self) -> Vec<(Entity, Q::ItemMut<'_>)> {
        Q::fetch_all(self)
    }

    /// Register a system into every phase its roles name.
    ///
    /// Called while a phase is running, the system is queued and registered
    /// once the phase ends.
    pub fn add_system(&mut self, system: impl System + 'static) {
        self.add_boxed_system(Box::new(system));
    }

    /// Boxed variant of [`add_system`](Self::add_system)
    pub fn add_boxed_system(&mut self, system: Box<dyn System>) {
        if self.running.is_some() {
            log::debug!("Queueing system '{}' until the running phase ends", system.name());
            self.pending_systems.push(system);
            return;
        }
        let roles = system.roles();
        if roles.is_empty() {
            log::warn!("System '{}' has no roles and will never run", system.name());
        }
        let index = self.systems.len();
        for phase in SystemPhase::ALL {
            if roles.contains(phase.role()) {
                self.phases[phase as usize].push(index);
            }
        }
        log::debug!("Registered system '{}' with roles {roles:?}", system.name());
        self.systems.push(system);
    }

    /// Number of systems registered in a phase
    pub fn system_count(&self, phase: SystemPhase) -> usize {
        self.phases[phase as usize].len()
    }

    /// Names of the systems in a phase, in run order
    pub fn system_names(&self, phase: SystemPhase) -> Vec<&'static str> {
        self.phases[phase as usize]
            .iter()
            .map(|&i| self.systems[i].name())
            .collect()
    }

    /// Queue a structural change to run at the next phase boundary, or now if
    /// no phase is running
    pub fn defer(&mut self, command: impl FnOnce(&mut World) + 'static) {
        if self.running.is_some() {
            self.commands.push(Box::new(command));
        } else {
            command(self);
        }
    }

    /// Run the update phase
    pub fn update(&mut self, input: &InputState, delta_time: f32) -> SystemResult {
        self.run_phase(SystemPhase::Update, |system, world| system.update(world, input, delta_time))
    }

    /// Run the render phase
    pub fn render(&mut self, gpu: &mut dyn GraphicsApi, delta_time: f32) -> SystemResult {
        self.run_phase(SystemPhase::Render, |system, world| {
            system.render(world, &mut *gpu, delta_time)
        })
    }

    /// Run the resize phase
    pub fn resize(&mut self, width: u32, height: u32) -> SystemResult {
        self.run_phase(SystemPhase::Resize, |system, world| system.resize(world, width, height))
    }

    /// Remove every entity and component; systems stay registered
    pub fn clear_entities(&mut self) {
        self.entities.clear();
        self.storages.clear();
    }

    /// Remove every entity, component, system and queued command
    pub fn clear(&mut self) {
        if self.running.is_some() {
            self.commands.push(Box::new(World::clear));
            return;
        }
        self.clear_entities();
        self.systems.clear();
        self.phases.iter_mut().for_each(Vec::clear);
        self.pending_systems.clear();
        self.commands.clear();
    }

    fn run_phase(
        &mut self,
        phase: SystemPhase,
        mut run: impl FnMut(&mut dyn System, &mut World) -> SystemResult,
    ) -> SystemResult {
        if let Some(active) = self.running {
            log::warn!("{phase:?} phase requested while {active:?} is running, skipped");
            return Ok(());
        }

        let mut systems = std::mem::take(&mut self.systems);
        let order = self.phases[phase as usize].clone();
        self.running = Some(phase);

        let mut result = Ok(());
        for index in order {
            let system = &mut systems[index];
            log::trace!("{phase:?}: {}", system.name());
            if let Err(err) = run(system.as_mut(), self) {
                log::error!("System '{}' failed during {phase:?}: {err}", system.name());
                result = Err(err);
                break;
            }
        }

        self.running = None;
        self.systems = systems;
        self.apply_deferred();
        result
    }

    fn apply_deferred(&mut self) {
        for system in std::mem::take(&mut self.pending_systems) {
            self.add_boxed_system(system);
        }
        // Commands may queue more commands; drain until stable.
        while !self.commands.is_empty() {
            for command in std::mem::take(&mut self.commands) {
                command(self);
            }
        }
    }

    pub(crate) fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| downcast::<T>(&**s))
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| downcast_mut::<T>(&mut **s))
    }

    fn storage_mut_or_insert<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));
        match downcast_mut::<T>(&mut **storage) {
            Some(storage) => storage,
            None => unreachable!("storage registered under the TypeId of another type"),
        }
    }

    /// Entities plus one mutable storage per requested type, in request order.
    /// A type listed twice only gets its first slot filled.
    pub(crate) fn storages_mut(&mut self, types: &[TypeId]) -> (Vec<Entity>, Vec<Option<&mut Box<dyn AnyStorage>>>) {
        let entities = self.entities.keys().collect();
        let mut slots: Vec<Option<&mut Box<dyn AnyStorage>>> = types.iter().map(|_| None).collect();
        for (type_id, storage) in &mut self.storages {
            if let Some(i) = types.iter().position(|t| t == type_id) {
                slots[i] = Some(storage);
            }
        }
        (entities, slots)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("component_types", &self.storages.len())
            .field("systems", &self.systems.len())
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{SystemError, SystemRoles};
    use crate::render::headless::HeadlessDevice;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, Clone, PartialEq)]
    struct Name(&'static str);
    impl Component for Name {}

    type Calls = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        label: &'static str,
        roles: SystemRoles,
        calls: Calls,
        fail_update: bool,
    }

    impl Recorder {
        fn new(label: &'static str, roles: SystemRoles, calls: &Calls) -> Self {
            Self {
                label,
                roles,
                calls: Rc::clone(calls),
                fail_update: false,
            }
        }
    }

    impl System for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        fn roles(&self) -> SystemRoles {
            self.roles
        }

        fn update(&mut self, _world: &mut World, _input: &InputState, _dt: f32) -> SystemResult {
            self.calls.borrow_mut().push(format!("update:{}", self.label));
            if self.fail_update {
                return Err(SystemError::Failed {
                    system: self.label.to_string(),
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn render(&mut self, _world: &mut World, _gpu: &mut dyn GraphicsApi, _dt: f32) -> SystemResult {
            self.calls.borrow_mut().push(format!("render:{}", self.label));
            Ok(())
        }

        fn resize(&mut self, _world: &mut World, width: u32, height: u32) -> SystemResult {
            self.calls.borrow_mut().push(format!("resize:{}:{width}x{height}", self.label));
            Ok(())
        }
    }

    #[test]
    fn test_second_component_replaces_first() {
        let mut world = World::new();
        let e = world.create_entity();
        assert!(world.add_component(e, Health(10)).is_none());
        assert_eq!(world.add_component(e, Health(3)), Some(Health(10)));
        assert_eq!(world.get_component::<Health>(e), Some(&Health(3)));
        assert_eq!(world.query::<(Health,)>().count(), 1);
    }

    #[test]
    fn test_transform_mesh_scenario() {
        let mut world = World::new();
        let e1 = world.create_entity();
        world.add_component(e1, Health(1));
        world.add_component(e1, Name("e1"));
        let e2 = world.create_entity();
        world.add_component(e2, Health(2));

        let rows: Vec<_> = world.query::<(Health, Name)>().iter().collect();
        assert_eq!(rows, vec![(e1, (&Health(1), &Name("e1")))]);
    }

    #[test]
    fn test_destroyed_ids_are_never_reissued_while_live() {
        let mut world = World::new();
        let a = world.create_entity();
        world.add_component(a, Health(1));
        assert!(world.destroy_entity(a));
        assert!(!world.destroy_entity(a));
        assert!(!world.has_component::<Health>(a));

        let b = world.create_entity();
        assert_ne!(a, b);
        assert!(!world.is_alive(a));
        assert!(world.get_component::<Health>(b).is_none());
        assert!(world.add_component(a, Health(5)).is_none());
        assert_eq!(world.component_count(), 0);
    }

    #[test]
    fn test_phases_only_run_their_systems() {
        let calls: Calls = Rc::default();
        let mut world = World::new();
        world.add_system(Recorder::new("mover", SystemRoles::UPDATE, &calls));
        world.add_system(Recorder::new("drawer", SystemRoles::RENDER, &calls));

        world.update(&InputState::new(), 0.016).unwrap();
        assert_eq!(*calls.borrow(), vec!["update:mover"]);

        calls.borrow_mut().clear();
        world.render(&mut HeadlessDevice::new(), 0.016).unwrap();
        assert_eq!(*calls.borrow(), vec!["render:drawer"]);
    }

    #[test]
    fn test_multi_role_system_joins_every_phase_in_order() {
        let calls: Calls = Rc::default();
        let mut world = World::new();
        world.add_system(Recorder::new("first", SystemRoles::UPDATE, &calls));
        world.add_system(Recorder::new("all", SystemRoles::all(), &calls));
        world.add_system(Recorder::new("last", SystemRoles::UPDATE | SystemRoles::RESIZE, &calls));

        assert_eq!(world.system_names(SystemPhase::Update), vec!["first", "all", "last"]);
        assert_eq!(world.system_count(SystemPhase::Render), 1);

        world.resize(800, 600).unwrap();
        assert_eq!(*calls.borrow(), vec!["resize:all:800x600", "resize:last:800x600"]);
    }

    #[test]
    fn test_failing_system_aborts_rest_of_phase() {
        let calls: Calls = Rc::default();
        let mut world = World::new();
        let mut broken = Recorder::new("broken", SystemRoles::UPDATE, &calls);
        broken.fail_update = true;
        world.add_system(broken);
        world.add_system(Recorder::new("after", SystemRoles::UPDATE, &calls));

        assert!(world.update(&InputState::new(), 0.0).is_err());
        assert_eq!(*calls.borrow(), vec!["update:broken"]);

        // Systems are restored after the aborted phase.
        assert_eq!(world.system_count(SystemPhase::Update), 2);
    }

    struct Spawner;

    impl System for Spawner {
        fn roles(&self) -> SystemRoles {
            SystemRoles::UPDATE
        }

        fn update(&mut self, world: &mut World, _input: &InputState, _dt: f32) -> SystemResult {
            let before = world.query::<(Name,)>().count();
            world.defer(|world| {
                let e = world.create_entity();
                world.add_component(e, Name("spawned"));
            });
            // Not visible until the phase ends.
            assert_eq!(world.query::<(Name,)>().count(), before);
            Ok(())
        }
    }

    #[test]
    fn test_deferred_commands_apply_at_phase_boundary() {
        let mut world = World::new();
        world.add_system(Spawner);

        world.update(&InputState::new(), 0.0).unwrap();
        assert_eq!(world.query::<(Name,)>().count(), 1);
        world.update(&InputState::new(), 0.0).unwrap();
        assert_eq!(world.query::<(Name,)>().count(), 2);
    }

    struct Registrar {
        calls: Calls,
        done: bool,
    }

    impl System for Registrar {
        fn roles(&self) -> SystemRoles {
            SystemRoles::UPDATE
        }

        fn update(&mut self, world: &mut World, _input: &InputState, _dt: f32) -> SystemResult {
            if !self.done {
                self.done = true;
                world.add_system(Recorder::new("late", SystemRoles::UPDATE, &self.calls));
            }
            Ok(())
        }
    }

    #[test]
    fn test_system_added_during_phase_runs_next_frame() {
        let calls: Calls = Rc::default();
        let mut world = World::new();
        world.add_system(Registrar {
            calls: Rc::clone(&calls),
            done: false,
        });

        world.update(&InputState::new(), 0.0).unwrap();
        assert!(calls.borrow().is_empty());
        assert_eq!(world.system_count(SystemPhase::Update), 2);

        world.update(&InputState::new(), 0.0).unwrap();
        assert_eq!(*calls.borrow(), vec!["update:late"]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let calls: Calls = Rc::default();
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Health(1));
        world.add_system(Recorder::new("any", SystemRoles::all(), &calls));

        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.component_count(), 0);
        for phase in SystemPhase::ALL {
            assert_eq!(world.system_count(phase), 0);
        }
    }
}
