//! # Core Engine Module
//!
//! Shared settings types used by the engine façade and the window backends.
//!
//! ## Organization
//!
//! - **Config**: render, asset and headless-run settings with validation

pub mod config;

pub use config::{AssetSettings, EngineConfig, HeadlessSettings, RenderSettings};
pub use crate::config::{Config, ConfigError};
