//! Entity-Component-System implementation
//!
//! Each scene owns one [`World`]: entities, their components, and the systems
//! run in the update, render and resize phases.

pub mod component;
pub mod components;
pub mod entity;
pub mod query;
pub mod system;
pub mod systems;
pub mod world;

pub use component::{Component, ComponentStorage};
pub use entity::Entity;
pub use query::{Query, QueryData, QueryDataMut};
pub use system::{System, SystemError, SystemPhase, SystemResult, SystemRoles};
pub use world::World;
