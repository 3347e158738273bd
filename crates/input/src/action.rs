use glam::Vec2;

/// A camera action produced from raw pointer input.
///
/// The orbit controls consume actions, never window events, so the desktop
/// app and headless callers drive the camera the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    /// Rotate around the target by a pointer delta in logical pixels.
    Orbit { dx: f32, dy: f32 },
    /// Move the target in the view plane by a pointer delta in logical pixels.
    Pan { dx: f32, dy: f32 },
    /// Dolly by scroll steps; positive moves closer.
    Zoom(f32),
    /// Input that maps to nothing.
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// Turns button and cursor events into [`CameraAction`]s.
///
/// Primary drag orbits, secondary drag pans. Movement without a held button
/// maps to [`CameraAction::Noop`].
#[derive(Debug, Default)]
pub struct PointerTracker {
    primary: bool,
    secondary: bool,
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        match button {
            PointerButton::Primary => self.primary = pressed,
            PointerButton::Secondary => self.secondary = pressed,
            PointerButton::Other => {}
        }
    }

    /// Cursor moved to `position` (logical pixels).
    pub fn moved(&mut self, position: Vec2) -> CameraAction {
        let previous = self.last.replace(position);
        let Some(previous) = previous else {
            return CameraAction::Noop;
        };
        let delta = position - previous;
        if self.primary {
            CameraAction::Orbit {
                dx: delta.x,
                dy: delta.y,
            }
        } else if self.secondary {
            CameraAction::Pan {
                dx: delta.x,
                dy: delta.y,
            }
        } else {
            CameraAction::Noop
        }
    }

    /// Cursor left the surface; the next move starts a fresh drag.
    pub fn left(&mut self) {
        self.last = None;
    }

    pub fn scroll(&self, steps: f32) -> CameraAction {
        if steps == 0.0 {
            CameraAction::Noop
        } else {
            CameraAction::Zoom(steps)
        }
    }

    /// A drag started on the scene owns the pointer until its button is
    /// released, even while the cursor is over UI that would consume events.
    pub fn is_dragging(&self) -> bool {
        self.primary || self.secondary
    }
}
