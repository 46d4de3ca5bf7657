//! Resource lifecycle and dependency walking
//!
//! A resource is anything that acquires scarce handles when it loads and gives
//! them back when it unloads: compiled programs, textures, vertex buffers, whole
//! scenes. Concrete kinds implement [`Resource`] on their own and embed a
//! [`Lifecycle`] for the shared bookkeeping; the free functions [`initialize`]
//! and [`dispose`] walk the dependency graph.
//!
//! Ordering contract:
//! - `initialize` marks the resource loaded, initializes every dependency in
//!   insertion order, then runs the resource's own `load` hook. Dependencies
//!   therefore finish loading before their dependent.
//! - `dispose` marks the resource unloaded, runs its `unload` hook, then disposes
//!   dependencies. Dependents therefore release before what they depend on.
//!
//! Both are no-ops when the resource is already in the target state, which also
//! makes cyclic graphs terminate ("first visitor wins").

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

use super::asset_service::{AssetError, AssetService};
use crate::render::api::{GraphicsApi, RenderError};

/// Shared, interior-mutable handle to a resource
pub type Shared<T> = Rc<RefCell<T>>;

/// Type-erased shared resource, as stored in dependency lists
pub type SharedResource = Rc<RefCell<dyn Resource>>;

/// Wrap a value into a [`Shared`] handle
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Resource lifecycle errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Graphics backend rejected an operation
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Source data could not be loaded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// A load or unload hook failed for a resource-specific reason
    #[error("Resource '{resource}' failed: {reason}")]
    Failed {
        /// Resource name
        resource: String,
        /// Failure description
        reason: String,
    },

    /// The resource was already mutably borrowed by someone else
    #[error("Resource is busy and cannot be borrowed")]
    Busy,
}

/// Services handed to every load and unload hook
pub struct ResourceContext<'a> {
    /// Graphics API owning the context the handles live in
    pub gpu: &'a mut dyn GraphicsApi,
    /// Asset service for source files
    pub assets: &'a mut AssetService,
}

impl<'a> ResourceContext<'a> {
    /// Bundle the services for a lifecycle pass
    pub fn new(gpu: &'a mut dyn GraphicsApi, assets: &'a mut AssetService) -> Self {
        Self { gpu, assets }
    }
}

/// Lifecycle bookkeeping embedded in every resource
pub struct Lifecycle {
    name: String,
    loaded: bool,
    faulted: bool,
    dependencies: Vec<Weak<RefCell<dyn Resource>>>,
}

impl Lifecycle {
    /// Fresh, unloaded lifecycle
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loaded: false,
            faulted: false,
            dependencies: Vec::new(),
        }
    }

    /// Resource name, unique within its owning registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the resource is currently marked loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the last load hook failed.
    ///
    /// A faulted resource stays marked loaded, so repeated `initialize` calls do
    /// not retry it; `dispose` still runs its unload hook.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Register a prerequisite. Returns false when it was already registered.
    ///
    /// The list only holds weak references: the dependency's lifetime belongs to
    /// whoever registered it, usually a [`Manager`](super::Manager).
    pub fn add_dependency(&mut self, dependency: SharedResource) -> bool {
        let target = Rc::as_ptr(&dependency).cast::<()>();
        if self.dependencies.iter().any(|existing| {
            existing
                .upgrade()
                .is_some_and(|rc| Rc::as_ptr(&rc).cast::<()>() == target)
        }) {
            return false;
        }
        self.dependencies.push(Rc::downgrade(&dependency));
        true
    }

    /// Number of registered dependencies, live or not
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    fn live_dependencies(&self) -> Vec<SharedResource> {
        self.dependencies
            .iter()
            .filter_map(|weak| {
                let upgraded = weak.upgrade();
                if upgraded.is_none() {
                    log::warn!("Resource '{}' has a dependency that was already dropped", self.name);
                }
                upgraded
            })
            .collect()
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if self.loaded && !std::thread::panicking() {
            log::warn!(
                "Resource '{}' dropped while loaded; its handles were never released",
                self.name
            );
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("name", &self.name)
            .field("loaded", &self.loaded)
            .field("faulted", &self.faulted)
            .field("dependencies", &self.dependencies.len())
            .finish()
    }
}

/// Capability interface for anything with an acquire/release lifecycle
pub trait Resource {
    /// Embedded lifecycle state
    fn lifecycle(&self) -> &Lifecycle;

    /// Mutable lifecycle state
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Acquire underlying handles. Dependencies are already loaded.
    fn load(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError>;

    /// Release underlying handles. Dependencies are still loaded.
    fn unload(&mut self, ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError>;

    /// Resource name
    fn name(&self) -> &str {
        self.lifecycle().name()
    }

    /// Whether the resource is marked loaded
    fn is_loaded(&self) -> bool {
        self.lifecycle().is_loaded()
    }

    /// Register a prerequisite, see [`Lifecycle::add_dependency`]
    fn add_dependency(&mut self, dependency: SharedResource) -> bool {
        self.lifecycle_mut().add_dependency(dependency)
    }
}

/// Load `resource` and, before it, every dependency that is not loaded yet.
///
/// The loaded flag is set before anything else runs, so a failing hook leaves
/// the resource marked loaded (and faulted). The error is returned as-is.
pub fn initialize<R: Resource + ?Sized>(
    resource: &RefCell<R>,
    ctx: &mut ResourceContext<'_>,
) -> Result<(), ResourceError> {
    let dependencies = {
        let Ok(mut guard) = resource.try_borrow_mut() else {
            log::error!("initialize on a resource that is already borrowed");
            return Err(ResourceError::Busy);
        };
        if guard.is_loaded() {
            return Ok(());
        }
        let lifecycle = guard.lifecycle_mut();
        lifecycle.loaded = true;
        lifecycle.faulted = false;
        lifecycle.live_dependencies()
    };

    for dependency in &dependencies {
        if let Err(err) = initialize(&**dependency, ctx) {
            let mut guard = resource.try_borrow_mut().map_err(|_| ResourceError::Busy)?;
            guard.lifecycle_mut().faulted = true;
            log::error!("Resource '{}' not loaded: a dependency failed", guard.name());
            return Err(err);
        }
    }

    let mut guard = resource.try_borrow_mut().map_err(|_| ResourceError::Busy)?;
    let name = guard.name().to_string();
    log::debug!("Loading resource '{name}'");
    if let Err(err) = guard.load(ctx) {
        guard.lifecycle_mut().faulted = true;
        log::error!("Resource '{name}' failed to load: {err}");
        return Err(err);
    }
    Ok(())
}

/// Unload `resource`, then every dependency that is still loaded.
///
/// Dependencies are released even if the unload hook fails; the first error
/// encountered is returned after the walk completes.
pub fn dispose<R: Resource + ?Sized>(
    resource: &RefCell<R>,
    ctx: &mut ResourceContext<'_>,
) -> Result<(), ResourceError> {
    let (dependencies, result) = {
        let Ok(mut guard) = resource.try_borrow_mut() else {
            log::error!("dispose on a resource that is already borrowed");
            return Err(ResourceError::Busy);
        };
        if !guard.is_loaded() {
            return Ok(());
        }
        guard.lifecycle_mut().loaded = false;
        let dependencies = guard.lifecycle().live_dependencies();

        log::debug!("Unloading resource '{}'", guard.name());
        let result = guard.unload(ctx);
        if let Err(err) = &result {
            log::error!("Resource '{}' failed to unload: {err}", guard.name());
        }
        guard.lifecycle_mut().faulted = false;
        (dependencies, result)
    };

    let mut first_error = result.err();
    for dependency in &dependencies {
        if let Err(err) = dispose(&**dependency, ctx) {
            first_error.get_or_insert(err);
        }
    }

    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{event_log, Probe, TestServices};

    #[test]
    fn test_initialize_runs_load_once() {
        let log = event_log();
        let probe = shared(Probe::new("a", &log));
        let mut services = TestServices::new();

        for _ in 0..3 {
            initialize(&*probe, &mut services.context()).unwrap();
        }

        assert_eq!(*log.borrow(), vec!["load:a"]);
        assert!(probe.borrow().is_loaded());
    }

    #[test]
    fn test_dispose_runs_unload_once() {
        let log = event_log();
        let probe = shared(Probe::new("a", &log));
        let mut services = TestServices::new();

        initialize(&*probe, &mut services.context()).unwrap();
        for _ in 0..3 {
            dispose(&*probe, &mut services.context()).unwrap();
        }

        assert_eq!(*log.borrow(), vec!["load:a", "unload:a"]);
        assert_eq!(services.device.live_handle_count(), 0);
    }

    #[test]
    fn test_dispose_before_initialize_is_noop() {
        let log = event_log();
        let probe = shared(Probe::new("a", &log));
        let mut services = TestServices::new();

        dispose(&*probe, &mut services.context()).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_chain_load_and_unload_order() {
        let log = event_log();
        let a = shared(Probe::new("A", &log));
        let b = shared(Probe::new("B", &log));
        let c = shared(Probe::new("C", &log));
        a.borrow_mut().add_dependency(b.clone());
        b.borrow_mut().add_dependency(c.clone());
        let mut services = TestServices::new();

        initialize(&*a, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["load:C", "load:B", "load:A"]);

        log.borrow_mut().clear();
        dispose(&*a, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["unload:A", "unload:B", "unload:C"]);
        assert_eq!(services.device.live_handle_count(), 0);
    }

    #[test]
    fn test_duplicate_dependency_ignored() {
        let log = event_log();
        let a = shared(Probe::new("A", &log));
        let b = shared(Probe::new("B", &log));

        assert!(a.borrow_mut().add_dependency(b.clone()));
        assert!(!a.borrow_mut().add_dependency(b.clone()));
        assert_eq!(a.borrow().lifecycle().dependency_count(), 1);
    }

    #[test]
    fn test_dependencies_load_in_first_add_order() {
        let log = event_log();
        let root = shared(Probe::new("root", &log));
        let x = shared(Probe::new("x", &log));
        let y = shared(Probe::new("y", &log));
        root.borrow_mut().add_dependency(y.clone());
        root.borrow_mut().add_dependency(x.clone());
        root.borrow_mut().add_dependency(y.clone());
        let mut services = TestServices::new();

        initialize(&*root, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["load:y", "load:x", "load:root"]);
    }

    #[test]
    fn test_shared_dependency_released_once() {
        let log = event_log();
        let left = shared(Probe::new("left", &log));
        let right = shared(Probe::new("right", &log));
        let common = shared(Probe::new("common", &log));
        left.borrow_mut().add_dependency(common.clone());
        right.borrow_mut().add_dependency(common.clone());
        let mut services = TestServices::new();

        initialize(&*left, &mut services.context()).unwrap();
        initialize(&*right, &mut services.context()).unwrap();
        dispose(&*left, &mut services.context()).unwrap();
        dispose(&*right, &mut services.context()).unwrap();

        let unloads = log.borrow().iter().filter(|e| *e == "unload:common").count();
        assert_eq!(unloads, 1);
        assert_eq!(services.device.live_handle_count(), 0);
    }

    #[test]
    fn test_cycle_terminates() {
        let log = event_log();
        let a = shared(Probe::new("A", &log));
        let b = shared(Probe::new("B", &log));
        a.borrow_mut().add_dependency(b.clone());
        b.borrow_mut().add_dependency(a.clone());
        let mut services = TestServices::new();

        initialize(&*a, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["load:B", "load:A"]);

        log.borrow_mut().clear();
        dispose(&*a, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["unload:A", "unload:B"]);
    }

    #[test]
    fn test_failed_load_stays_loaded_and_faulted() {
        let log = event_log();
        let broken = shared(Probe::new("broken", &log).failing_load());
        let mut services = TestServices::new();

        let err = initialize(&*broken, &mut services.context()).unwrap_err();
        assert!(matches!(err, ResourceError::Failed { ref resource, .. } if resource == "broken"));
        assert!(broken.borrow().is_loaded());
        assert!(broken.borrow().lifecycle().is_faulted());

        // No retry while it stays loaded.
        initialize(&*broken, &mut services.context()).unwrap();
        assert_eq!(log.borrow().iter().filter(|e| *e == "load:broken").count(), 1);

        dispose(&*broken, &mut services.context()).unwrap();
        assert!(!broken.borrow().lifecycle().is_faulted());
    }

    #[test]
    fn test_failed_dependency_skips_dependent_hook() {
        let log = event_log();
        let top = shared(Probe::new("top", &log));
        let bottom = shared(Probe::new("bottom", &log).failing_load());
        top.borrow_mut().add_dependency(bottom.clone());
        let mut services = TestServices::new();

        assert!(initialize(&*top, &mut services.context()).is_err());
        assert_eq!(*log.borrow(), vec!["load:bottom"]);
        assert!(top.borrow().is_loaded());
        assert!(top.borrow().lifecycle().is_faulted());
        assert!(bottom.borrow().lifecycle().is_faulted());
    }

    #[test]
    fn test_borrowed_resource_reports_busy() {
        let log = event_log();
        let probe = shared(Probe::new("held", &log));
        let mut services = TestServices::new();

        {
            let _held = probe.borrow();
            assert!(matches!(
                initialize(&*probe, &mut services.context()),
                Err(ResourceError::Busy)
            ));
        }
        assert!(!probe.borrow().is_loaded());
        assert!(log.borrow().is_empty());

        initialize(&*probe, &mut services.context()).unwrap();
        {
            let _held = probe.borrow();
            assert!(matches!(
                dispose(&*probe, &mut services.context()),
                Err(ResourceError::Busy)
            ));
        }
        assert!(probe.borrow().is_loaded());
        dispose(&*probe, &mut services.context()).unwrap();
        assert_eq!(services.device.live_handle_count(), 0);
    }

    #[test]
    fn test_failed_unload_still_releases_dependencies() {
        let log = event_log();
        let top = shared(Probe::new("top", &log).failing_unload());
        let bottom = shared(Probe::new("bottom", &log));
        top.borrow_mut().add_dependency(bottom.clone());
        let mut services = TestServices::new();

        initialize(&*top, &mut services.context()).unwrap();
        assert!(dispose(&*top, &mut services.context()).is_err());
        assert!(!bottom.borrow().is_loaded());
        assert!(log.borrow().contains(&"unload:bottom".to_string()));
    }

    #[test]
    fn test_reinitialize_matches_first_load() {
        let log = event_log();
        let a = shared(Probe::new("A", &log));
        let b = shared(Probe::new("B", &log));
        a.borrow_mut().add_dependency(b.clone());
        let mut services = TestServices::new();

        initialize(&*a, &mut services.context()).unwrap();
        let first_live = services.device.live_handle_count();
        dispose(&*a, &mut services.context()).unwrap();
        log.borrow_mut().clear();

        initialize(&*a, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["load:B", "load:A"]);
        assert_eq!(services.device.live_handle_count(), first_live);
        assert!(a.borrow().is_loaded() && b.borrow().is_loaded());

        dispose(&*a, &mut services.context()).unwrap();
    }

    #[test]
    fn test_dropped_dependency_is_skipped() {
        let log = event_log();
        let a = shared(Probe::new("A", &log));
        {
            let gone = shared(Probe::new("gone", &log));
            a.borrow_mut().add_dependency(gone.clone());
        }
        let mut services = TestServices::new();

        initialize(&*a, &mut services.context()).unwrap();
        assert_eq!(*log.borrow(), vec!["load:A"]);
        dispose(&*a, &mut services.context()).unwrap();
    }
}
