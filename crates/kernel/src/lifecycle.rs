use serde::{Deserialize, Serialize};

/// Application phase. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    /// Assets are in flight; the overlay is opaque.
    Loading,
    /// Everything loaded; the overlay is fading and the panel is not built yet.
    Revealing,
    /// Panel built, render loop in steady state.
    Interactive,
}

/// Phase change reported by [`Lifecycle`]. Each fires once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Revealed { at: f64 },
    Interactive { at: f64 },
}

/// Delays of the reveal sequence, in seconds after load completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTimings {
    /// When the loading indicator is hidden.
    pub indicator_delay: f64,
    /// When the overlay starts fading.
    pub fade_delay: f64,
    pub fade_duration: f64,
    /// Time between the end of the fade and the panel being built.
    pub panel_delay: f64,
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self {
            indicator_delay: 1.0,
            fade_delay: 0.5,
            fade_duration: 1.5,
            panel_delay: 3.0,
        }
    }
}

impl RevealTimings {
    pub fn fade_end(&self) -> f64 {
        self.fade_delay + self.fade_duration.max(0.0)
    }

    pub fn panel_at(&self) -> f64 {
        self.fade_end() + self.panel_delay.max(0.0)
    }
}

/// `Loading → Revealing → Interactive`, driven by the caller's clock.
///
/// Times are seconds on whatever clock the caller uses; only differences
/// matter.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
    timings: RevealTimings,
    loaded_at: Option<f64>,
    interactive_at: Option<f64>,
}

impl Lifecycle {
    pub fn new(timings: RevealTimings) -> Self {
        Self {
            phase: Phase::Loading,
            timings,
            loaded_at: None,
            interactive_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timings(&self) -> &RevealTimings {
        &self.timings
    }

    pub fn loaded_at(&self) -> Option<f64> {
        self.loaded_at
    }

    pub fn interactive_at(&self) -> Option<f64> {
        self.interactive_at
    }

    /// Record load completion. Only the first call has an effect.
    pub fn mark_loaded(&mut self, now: f64) -> Option<Transition> {
        if self.phase != Phase::Loading {
            return None;
        }
        self.phase = Phase::Revealing;
        self.loaded_at = Some(now);
        tracing::info!(at = now, "assets loaded, revealing");
        Some(Transition::Revealed { at: now })
    }

    /// Move to `Interactive` once the panel delay has passed.
    pub fn advance(&mut self, now: f64) -> Option<Transition> {
        let loaded_at = self.loaded_at?;
        if self.phase != Phase::Revealing || now - loaded_at < self.timings.panel_at() {
            return None;
        }
        self.phase = Phase::Interactive;
        self.interactive_at = Some(now);
        tracing::info!(at = now, "interactive");
        Some(Transition::Interactive { at: now })
    }

    /// Overlay opacity at `now`: 1 until the fade starts, then eased to 0.
    pub fn overlay_alpha(&self, now: f64) -> f32 {
        let Some(loaded_at) = self.loaded_at else {
            return 1.0;
        };
        let since_fade = now - loaded_at - self.timings.fade_delay;
        if since_fade <= 0.0 {
            return 1.0;
        }
        if self.timings.fade_duration <= 0.0 {
            return 0.0;
        }
        let t = (since_fade / self.timings.fade_duration).clamp(0.0, 1.0);
        (1.0 - ease_out(t)) as f32
    }

    /// Whether the loading indicator should be on screen.
    pub fn indicator_visible(&self, now: f64) -> bool {
        match self.loaded_at {
            None => true,
            Some(loaded_at) => now - loaded_at < self.timings.indicator_delay,
        }
    }
}

/// Quadratic ease-out.
fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t) * (1.0 - t)
}
