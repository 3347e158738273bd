//! Shared types for spiderscene crates.

mod color;
mod types;
mod viewport;

pub use color::{ColorError, Rgb};
pub use types::{MaterialId, NodeId, Transform};
pub use viewport::{MAX_PIXEL_RATIO, Viewport};
