//! Typed component queries
//!
//! A query names a tuple of component types, e.g.
//! `world.query::<(TransformComponent, MeshComponent)>()`, and yields one row
//! per entity that holds every one of them. Storages are resolved once per
//! query; rows are produced lazily by walking the world's entities in their
//! stable slot order.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{downcast_mut, Component, ComponentStorage};
use super::{Entity, World};

/// Read-only query shape, implemented for tuples of 1 to 6 components
pub trait QueryData: 'static {
    /// Resolved storages, one per requested type
    type Storages<'w>: Copy;
    /// One row of component references
    type Item<'w>;

    /// Look up every storage; `None` when any requested type has never been stored
    fn fetch_storages(world: &World) -> Option<Self::Storages<'_>>;

    /// Row for `entity`, or `None` if it lacks any requested component
    fn fetch(storages: Self::Storages<'_>, entity: Entity) -> Option<Self::Item<'_>>;
}

/// Mutable query shape, implemented for tuples of 1 to 6 distinct components
pub trait QueryDataMut: 'static {
    /// One row of mutable component references
    type ItemMut<'w>;

    /// Every matching row. Repeating a type in the tuple matches nothing.
    fn fetch_all(world: &mut World) -> Vec<(Entity, Self::ItemMut<'_>)>;
}

macro_rules! impl_query_data {
    ($(($name:ident, $storage:ident)),+) => {
        impl<$($name: Component),+> QueryData for ($($name,)+) {
            type Storages<'w> = ($(&'w ComponentStorage<$name>,)+);
            type Item<'w> = ($(&'w $name,)+);

            fn fetch_storages(world: &World) -> Option<Self::Storages<'_>> {
                Some(($(world.storage::<$name>()?,)+))
            }

            fn fetch(storages: Self::Storages<'_>, entity: Entity) -> Option<Self::Item<'_>> {
                let ($($storage,)+) = storages;
                Some(($($storage.get(entity)?,)+))
            }
        }
    };
}

macro_rules! impl_query_data_mut {
    ($(($name:ident, $rows:ident, $index:tt)),+) => {
        impl<$($name: Component),+> QueryDataMut for ($($name,)+) {
            type ItemMut<'w> = ($(&'w mut $name,)+);

            fn fetch_all(world: &mut World) -> Vec<(Entity, Self::ItemMut<'_>)> {
                let types = [$(TypeId::of::<$name>()),+];
                let (entities, mut slots) = world.storages_mut(&types);
                $(
                    let Some($rows) = slots[$index].take().and_then(|s| downcast_mut::<$name>(&mut **s)) else {
                        return Vec::new();
                    };
                    let mut $rows: HashMap<Entity, &mut $name> = $rows.iter_mut().collect();
                )+
                entities
                    .into_iter()
                    .filter_map(|entity| Some((entity, ($($rows.remove(&entity)?,)+))))
                    .collect()
            }
        }
    };
}

impl_query_data!((A, a));
impl_query_data!((A, a), (B, b));
impl_query_data!((A, a), (B, b), (C, c));
impl_query_data!((A, a), (B, b), (C, c), (D, d));
impl_query_data!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_query_data!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));

impl_query_data_mut!((A, a, 0));
impl_query_data_mut!((A, a, 0), (B, b, 1));
impl_query_data_mut!((A, a, 0), (B, b, 1), (C, c, 2));
impl_query_data_mut!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3));
impl_query_data_mut!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4));
impl_query_data_mut!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5));

/// Restartable read-only query over a world
pub struct Query<'w, Q: QueryData> {
    world: &'w World,
    storages: Option<Q::Storages<'w>>,
}

impl<'w, Q: QueryData> Query<'w, Q> {
    pub(crate) fn new(world: &'w World) -> Self {
        Self {
            world,
            storages: Q::fetch_storages(world),
        }
    }

    /// Matching rows. Each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, Q::Item<'w>)> + 'w {
        let storages = self.storages;
        self.world.entities().filter_map(move |entity| {
            let item = Q::fetch(storages?, entity)?;
            Some((entity, item))
        })
    }

    /// Row for one entity
    pub fn get(&self, entity: Entity) -> Option<Q::Item<'w>> {
        Q::fetch(self.storages?, entity)
    }

    /// First matching row, for shapes expected to match a single entity
    pub fn single(&self) -> Option<(Entity, Q::Item<'w>)> {
        self.iter().next()
    }

    /// Number of matching entities
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Whether nothing matches
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<Q: QueryData> Clone for Query<'_, Q> {
    fn clone(&self) -> Self {
        Self {
            world: self.world,
            storages: self.storages,
        }
    }
}
