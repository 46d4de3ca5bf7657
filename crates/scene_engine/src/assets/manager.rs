//! Named registry of resources
//!
//! A [`Manager`] keeps resources of one kind in insertion order, indexed by
//! name, with at most one of them selected as "current". Bulk lifecycle calls
//! go through the [`resource`](super::resource) walkers, so an item shared with
//! another registry is still loaded and released exactly once.

use std::collections::HashMap;
use std::rc::Rc;

use super::resource::{self, shared, Resource, ResourceContext, ResourceError, Shared};

/// Insertion-ordered, name-keyed collection of resources
pub struct Manager<T: Resource> {
    label: String,
    items: Vec<Shared<T>>,
    index: HashMap<String, usize>,
    current: Option<usize>,
}

impl<T: Resource> Manager<T> {
    /// Empty registry; `label` only shows up in logs
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
            index: HashMap::new(),
            current: None,
        }
    }

    /// Registry label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register an item under its own name.
    ///
    /// The first registration of a name wins: a later item with the same name
    /// is dropped and `false` is returned.
    pub fn add(&mut self, item: Shared<T>) -> bool {
        let name = item.borrow().name().to_string();
        if self.index.contains_key(&name) {
            log::debug!("{}: '{name}' already registered, ignoring duplicate", self.label);
            return false;
        }
        self.index.insert(name, self.items.len());
        self.items.push(item);
        true
    }

    /// Wrap and register a value, returning the item that ends up registered
    /// under its name (the earlier one if the name was taken)
    pub fn insert(&mut self, item: T) -> Shared<T> {
        let name = item.name().to_string();
        if let Some(existing) = self.get(&name) {
            log::debug!("{}: '{name}' already registered, ignoring duplicate", self.label);
            return existing;
        }
        let item = shared(item);
        self.add(Rc::clone(&item));
        item
    }

    /// Register several items in order
    pub fn add_many(&mut self, items: impl IntoIterator<Item = Shared<T>>) {
        for item in items {
            self.add(item);
        }
    }

    /// Look up an item by name
    pub fn get(&self, name: &str) -> Option<Shared<T>> {
        self.index.get(name).map(|&i| Rc::clone(&self.items[i]))
    }

    /// Whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Items in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Shared<T>> {
        self.items.iter()
    }

    /// Apply `action` to every item in insertion order
    pub fn for_each(&self, mut action: impl FnMut(&Shared<T>)) {
        for item in &self.items {
            action(item);
        }
    }

    /// Like [`for_each`](Self::for_each), stopping at the first error
    pub fn try_for_each<E>(&self, mut action: impl FnMut(&Shared<T>) -> Result<(), E>) -> Result<(), E> {
        self.items.iter().try_for_each(|item| action(item))
    }

    /// Lazy projection of every item in insertion order.
    ///
    /// The iterator is `Clone`, so a caller can walk it more than once.
    pub fn select<'a, R, F>(&'a self, selector: F) -> impl Iterator<Item = R> + Clone + 'a
    where
        F: Fn(&Shared<T>) -> R + Clone + 'a,
    {
        self.items.iter().map(selector)
    }

    /// Names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.select(|item| item.borrow().name().to_string()).collect()
    }

    /// Select the current item by name. An unknown name clears the selection.
    pub fn set_current(&mut self, name: &str) -> bool {
        self.current = self.index.get(name).copied();
        if self.current.is_none() {
            log::debug!("{}: no item named '{name}', current selection cleared", self.label);
        }
        self.current.is_some()
    }

    /// Clear the current selection
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Currently selected item
    pub fn current(&self) -> Option<Shared<T>> {
        self.current.map(|i| Rc::clone(&self.items[i]))
    }

    /// Name of the currently selected item
    pub fn current_name(&self) -> Option<String> {
        self.current.map(|i| self.items[i].borrow().name().to_string())
    }

    /// Initialize every item in order, stopping at the first failure
    pub fn initialize_all(&self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        log::debug!("{}: initializing {} items", self.label, self.items.len());
        self.try_for_each(|item| resource::initialize(&**item, ctx))
    }

    /// Dispose every item, then empty the registry.
    ///
    /// All items are disposed even if one fails; the first error is returned.
    pub fn dispose(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        log::debug!("{}: disposing {} items", self.label, self.items.len());
        let mut first_error = None;
        for item in &self.items {
            if let Err(err) = resource::dispose(&**item, ctx) {
                first_error.get_or_insert(err);
            }
        }
        self.items.clear();
        self.index.clear();
        self.current = None;
        first_error.map_or(Ok(()), Err)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T: Resource> IntoIterator for &'a Manager<T> {
    type Item = &'a Shared<T>;
    type IntoIter = std::slice::Iter<'a, Shared<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Resource> std::fmt::Debug for Manager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("label", &self.label)
            .field("len", &self.items.len())
            .field("current", &self.current)
            .finish()
    }
}
