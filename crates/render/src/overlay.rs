/// Full-viewport quad that hides the scene until assets are in.
///
/// Alpha starts at 1 and only ever decreases.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMaterial {
    alpha: f32,
}

impl Default for OverlayMaterial {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl OverlayMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Lower alpha towards `target`. Requests to raise it are ignored.
    /// Returns whether the value changed.
    pub fn fade_to(&mut self, target: f32) -> bool {
        let target = target.clamp(0.0, 1.0);
        if target < self.alpha {
            self.alpha = target;
            true
        } else {
            false
        }
    }

    pub fn is_clear(&self) -> bool {
        self.alpha <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_opaque() {
        let overlay = OverlayMaterial::new();
        assert_eq!(overlay.alpha(), 1.0);
        assert!(!overlay.is_clear());
    }

    #[test]
    fn never_increases() {
        let mut overlay = OverlayMaterial::new();
        assert!(overlay.fade_to(0.4));
        assert!(!overlay.fade_to(0.9));
        assert_eq!(overlay.alpha(), 0.4);
    }

    #[test]
    fn clamps_below_zero() {
        let mut overlay = OverlayMaterial::new();
        overlay.fade_to(-3.0);
        assert_eq!(overlay.alpha(), 0.0);
        assert!(overlay.is_clear());
        assert!(!overlay.fade_to(0.0));
    }
}
