//! Resources, registries and asset sources

pub mod asset_service;
pub mod manager;
pub mod resource;

pub use asset_service::{AssetError, AssetLoader, AssetService, FsAssetLoader, MemoryAssetLoader};
pub use manager::Manager;
pub use resource::{
    dispose, initialize, shared, Lifecycle, Resource, ResourceContext, ResourceError, Shared, SharedResource,
};
