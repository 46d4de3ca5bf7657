//! Component marker trait and per-type storage

use std::any::Any;

use slotmap::SecondaryMap;

use super::Entity;

/// Marker trait for data that can be attached to an entity
pub trait Component: 'static {}

/// Dense-by-entity storage for one component type
pub struct ComponentStorage<T: Component> {
    components: SecondaryMap<Entity, T>,
}

impl<T: Component> ComponentStorage<T> {
    /// Empty storage
    pub fn new() -> Self {
        Self {
            components: SecondaryMap::new(),
        }
    }

    /// Store a component, returning the one it replaced
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.components.insert(entity, component)
    }

    /// Remove an entity's component
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.components.remove(entity)
    }

    /// Component of an entity
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.components.get(entity)
    }

    /// Mutable component of an entity
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(entity)
    }

    /// Whether the entity has this component
    pub fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(entity)
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component is stored
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All `(entity, component)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter()
    }

    /// All `(entity, component)` pairs, mutable
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.components.iter_mut()
    }
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a storage, for operations that do not know `T`
pub(crate) trait AnyStorage: Any {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Downcast helpers used by the world and queries
pub(crate) fn downcast<T: Component>(storage: &dyn AnyStorage) -> Option<&ComponentStorage<T>> {
    storage.as_any().downcast_ref()
}

pub(crate) fn downcast_mut<T: Component>(storage: &mut dyn AnyStorage) -> Option<&mut ComponentStorage<T>> {
    storage.as_any_mut().downcast_mut()
}
