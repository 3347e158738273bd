//! wgpu render backend for the spider scene.
//!
//! Draws each spider mesh with its halftone material and every other mesh in
//! its own base color, then the loading overlay on top.
//!
//! # Invariants
//! - The renderer never mutates the scene or the materials.
//! - Uniform buffers are rewritten from the material set every frame, so
//!   panel edits and resizes show up on the next draw.
//! - Colors are uploaded in linear light; the surface is expected to be sRGB.

mod draws;
mod gpu;
mod shaders;
mod uniforms;

pub use gpu::{WgpuRenderer, sample_count};
pub use shaders::{OVERLAY_SHADER, SPIDER_SHADER, fragment_entry};
pub use uniforms::MaterialUniform;
