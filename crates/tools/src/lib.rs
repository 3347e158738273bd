//! Developer Tooling: the runtime tweak panel.
//!
//! The panel is a declarative description of controls bound to material
//! uniforms. Drawing it is left to the app's UI layer.

mod panel;

pub use panel::{
    Binding, BindingKind, NumericRange, PanelError, REPETITION_RANGE, TweakFolder, TweakPanel,
};
