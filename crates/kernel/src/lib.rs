//! Stage Kernel: the application context and its lifecycle.
//!
//! # Invariants
//! - One control flow owns the [`Stage`]; loader workers never touch it.
//! - Phases move `Loading → Revealing → Interactive` and never back.
//! - The tweak panel exists only once the stage is interactive.
//! - All timing is driven by the caller's clock, so tests simulate time.

pub mod config;
pub mod lifecycle;
pub mod stage;

pub use config::{ConfigError, SceneConfig, SpiderConfig};
pub use lifecycle::{Lifecycle, Phase, RevealTimings, Transition};
pub use stage::Stage;
