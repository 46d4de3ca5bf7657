//! Marker components

use crate::ecs::Component;

/// Entity is drawn by the rendering system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visible;

/// Entity's visibility flips when the toggle key is pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggleable;

impl Component for Visible {}
impl Component for Toggleable {}
