//! Interaction: pointer input mapped to camera actions, and orbit controls.
//!
//! # Invariants
//! - Controls consume [`CameraAction`]s, never window events.
//! - [`OrbitControls::update`] runs once per frame, before the view is used.

pub mod action;
pub mod orbit;

pub use action::{CameraAction, PointerButton, PointerTracker};
pub use orbit::{OrbitConfig, OrbitControls};
