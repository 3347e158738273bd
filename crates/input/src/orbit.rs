use glam::Vec3;
use serde::{Deserialize, Serialize};
use spiderscene_common::Viewport;
use spiderscene_render::RenderView;
use std::f32::consts::PI;

use crate::action::CameraAction;

/// Keeps the camera off the poles, where the up vector degenerates.
const POLAR_EPSILON: f32 = 1e-4;
/// Dolly factor per scroll step at zoom speed 1.
const ZOOM_STEP: f32 = 0.95;

/// Camera and orbit behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    /// `None` leaves the distance unbounded.
    pub max_distance: Option<f32>,
    /// Fraction of the pending motion applied per update. `None` applies
    /// motion immediately.
    pub damping: Option<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.0, 1.0, 6.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            min_distance: 0.0,
            max_distance: None,
            damping: None,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Orbit camera: rotates around a target, dollies, pans.
///
/// Actions accumulate between frames; [`update`](Self::update) applies them
/// and must run exactly once per rendered frame.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: OrbitConfig,
    target: Vec3,
    radius: f32,
    /// Angle around +Y, measured from +Z.
    azimuth: f32,
    /// Angle down from +Y.
    polar: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_pan: Vec3,
    pending_scale: f32,
    aspect: f32,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig, viewport: &Viewport) -> Self {
        let offset = config.position - config.target;
        let radius = offset.length();
        let azimuth = offset.x.atan2(offset.z);
        let polar = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };
        Self {
            target: config.target,
            radius,
            azimuth,
            polar,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
            aspect: viewport.aspect(),
            viewport_height: viewport.height.max(1.0),
            config,
        }
    }

    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect();
        self.viewport_height = viewport.height.max(1.0);
        tracing::debug!(aspect = self.aspect, "camera viewport changed");
    }

    pub fn apply(&mut self, action: CameraAction) {
        match action {
            CameraAction::Orbit { dx, dy } => {
                let per_pixel = 2.0 * PI / self.viewport_height * self.config.rotate_speed;
                self.pending_azimuth -= dx * per_pixel;
                self.pending_polar -= dy * per_pixel;
            }
            CameraAction::Pan { dx, dy } => {
                let fov = self.config.fov_degrees.to_radians();
                let per_pixel = 2.0 * self.radius * (fov / 2.0).tan() / self.viewport_height
                    * self.config.pan_speed;
                let (right, up) = self.basis();
                self.pending_pan += (-right * dx + up * dy) * per_pixel;
            }
            CameraAction::Zoom(steps) => {
                self.pending_scale *= ZOOM_STEP.powf(self.config.zoom_speed * steps);
            }
            CameraAction::Noop => {}
        }
    }

    /// Apply pending motion and return the view for this frame.
    pub fn update(&mut self) -> RenderView {
        let factor = self.config.damping.map_or(1.0, |d| d.clamp(0.0, 1.0));

        self.azimuth += self.pending_azimuth * factor;
        self.polar = (self.polar + self.pending_polar * factor)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.target += self.pending_pan * factor;
        let wanted = self.radius * self.pending_scale;
        self.radius = wanted.clamp(
            self.config.min_distance,
            self.config
                .max_distance
                .unwrap_or(f32::INFINITY)
                .max(self.config.min_distance),
        );
        if self.radius != wanted {
            tracing::debug!(wanted, distance = self.radius, "zoom clamped to distance limits");
        }

        self.pending_scale = 1.0;
        if factor >= 1.0 {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            self.pending_pan = Vec3::ZERO;
        } else {
            self.pending_azimuth *= 1.0 - factor;
            self.pending_polar *= 1.0 - factor;
            self.pending_pan *= 1.0 - factor;
        }

        self.view()
    }

    /// Current view without applying pending motion.
    pub fn view(&self) -> RenderView {
        RenderView {
            eye: self.eye(),
            target: self.target,
            fov_degrees: self.config.fov_degrees,
            aspect: self.aspect,
            near: self.config.near,
            far: self.config.far,
        }
    }

    fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    /// Camera right and up vectors in world space.
    fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(config: OrbitConfig) -> OrbitControls {
        OrbitControls::new(config, &Viewport::new(800.0, 600.0, 1.0))
    }

    #[test]
    fn starts_at_configured_position() {
        let c = controls(OrbitConfig::default());
        assert!(c.eye().abs_diff_eq(Vec3::new(4.0, 1.0, 6.0), 1e-4));
        let vp = c.view().view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn update_without_input_keeps_view() {
        let mut c = controls(OrbitConfig::default());
        let before = c.view();
        let after = c.update();
        assert!(before.eye.abs_diff_eq(after.eye, 1e-5));
        assert_eq!(after.target, Vec3::ZERO);
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let mut c = controls(OrbitConfig::default());
        let distance = c.radius;
        c.apply(CameraAction::Orbit { dx: 120.0, dy: 40.0 });
        let view = c.update();
        assert!((view.eye.distance(view.target) - distance).abs() < 1e-3);
        assert!(!view.eye.abs_diff_eq(Vec3::new(4.0, 1.0, 6.0), 1e-3));
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut c = controls(OrbitConfig::default());
        c.apply(CameraAction::Orbit { dx: 0.0, dy: 100_000.0 });
        let view = c.update();
        assert!(view.eye.is_finite());
        assert!(view.eye.y > 0.0);
        assert!(!view.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn zoom_in_reduces_distance_within_bounds() {
        let mut c = controls(OrbitConfig {
            min_distance: 2.0,
            ..OrbitConfig::default()
        });
        let start = c.radius;
        c.apply(CameraAction::Zoom(1.0));
        c.update();
        assert!(c.radius < start);

        c.apply(CameraAction::Zoom(500.0));
        c.update();
        assert_eq!(c.radius, 2.0);
    }

    #[test]
    fn pan_moves_target() {
        let mut c = controls(OrbitConfig::default());
        c.apply(CameraAction::Pan { dx: 50.0, dy: 0.0 });
        let view = c.update();
        assert_ne!(view.target, Vec3::ZERO);
    }

    #[test]
    fn damping_spreads_motion_over_frames() {
        let mut damped = controls(OrbitConfig {
            damping: Some(0.25),
            ..OrbitConfig::default()
        });
        let start = damped.eye();
        damped.apply(CameraAction::Orbit { dx: 100.0, dy: 0.0 });
        let first = damped.update().eye;
        let second = damped.update().eye;
        assert!(!first.abs_diff_eq(start, 1e-5));
        assert!(!second.abs_diff_eq(first, 1e-5));
    }

    #[test]
    fn noop_changes_nothing() {
        let mut c = controls(OrbitConfig::default());
        c.apply(CameraAction::Noop);
        assert!(c.update().eye.abs_diff_eq(Vec3::new(4.0, 1.0, 6.0), 1e-4));
    }

    #[test]
    fn viewport_updates_aspect() {
        let mut c = controls(OrbitConfig::default());
        c.set_viewport(&Viewport::new(1000.0, 500.0, 1.0));
        assert_eq!(c.view().aspect, 2.0);
    }
}
