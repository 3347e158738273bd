//! Rendering Adapter: renderer-agnostic interface plus shader material bindings.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Each material's uniforms are the only input its shader program reads
//!   besides geometry, camera and time.
//! - Resolution uniforms of all materials change together.

mod material;
mod overlay;
mod renderer;

pub use material::{
    ColorSlot, MAX_REPETITIONS, MIN_REPETITIONS, MaterialSet, MaterialSpec, RepetitionSlot, ShaderProgram, SpiderMaterial,
    SpiderUniforms,
};
pub use overlay::OverlayMaterial;
pub use renderer::{DebugTextRenderer, Frame, RenderView, Renderer};
