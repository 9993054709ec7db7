use std::f32::consts::TAU;
use std::time::Duration;

/// Tallest point of the breath (8% taller).
pub const MAX_STRETCH: f32 = 1.08;
/// Lowest point of the breath (2% shorter).
pub const MIN_STRETCH: f32 = 0.98;
/// Phase advance per idle tick.
const PHASE_STEP: f32 = 0.05;
/// Idle tick interval the phase step is tuned for (~60 fps).
pub const IDLE_TICK: Duration = Duration::from_millis(16);
/// Bottom share of the sprite that never stretches (paws stay planted).
pub const FIXED_BOTTOM: f32 = 0.25;

/// Sine-driven idle stretch.
#[derive(Debug, Clone, Copy)]
pub struct Breath {
    phase: f32,
    stretch: f32,
}

impl Default for Breath {
    fn default() -> Self {
        Self {
            phase: 0.0,
            stretch: stretch_at(0.0),
        }
    }
}

impl Breath {
    /// Advance by `dt`, scaled so one [`IDLE_TICK`] equals one phase step.
    pub fn advance(&mut self, dt: Duration) {
        let ticks = dt.as_secs_f32() / IDLE_TICK.as_secs_f32();
        self.phase = (self.phase + PHASE_STEP * ticks).rem_euclid(TAU);
        self.stretch = stretch_at(self.phase);
    }

    pub fn stretch(&self) -> f32 {
        self.stretch
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

fn stretch_at(phase: f32) -> f32 {
    let wave = (phase.sin() + 1.0) / 2.0;
    MIN_STRETCH + wave * (MAX_STRETCH - MIN_STRETCH)
}

/// Vertical layout of a stretched sprite of height `h`, in sprite space
/// (y grows downward, 0 = top of the unstretched image).
///
/// The top part is scaled by `stretch` and grows upward from the split line;
/// the bottom part keeps its size and position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchLayout {
    /// Source split as a fraction of the image height (texture v).
    pub split_v: f32,
    /// Where the stretched top starts; negative when it pokes above the frame.
    pub top_y: f32,
    /// Split line; the stretched top ends here and the fixed bottom begins.
    pub split_y: f32,
    /// Bottom edge, always `h`.
    pub bottom_y: f32,
}

impl StretchLayout {
    pub fn new(h: f32, stretch: f32) -> Self {
        let fixed_bottom = (h * FIXED_BOTTOM).floor();
        let stretchable = h - fixed_bottom;
        let stretched_top = (stretchable * stretch).floor();
        Self {
            split_v: if h > 0.0 { stretchable / h } else { 0.0 },
            top_y: stretchable - stretched_top,
            split_y: stretchable,
            bottom_y: h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_stays_in_bounds() {
        let mut breath = Breath::default();
        for _ in 0..1000 {
            breath.advance(IDLE_TICK);
            let s = breath.stretch();
            assert!((MIN_STRETCH - 1e-4..=MAX_STRETCH + 1e-4).contains(&s), "{s}");
        }
    }

    #[test]
    fn one_tick_is_one_phase_step() {
        let mut breath = Breath::default();
        breath.advance(IDLE_TICK);
        assert!((breath.phase() - PHASE_STEP).abs() < 1e-5);
        breath.advance(IDLE_TICK * 2);
        assert!((breath.phase() - PHASE_STEP * 3.0).abs() < 1e-5);
    }

    #[test]
    fn phase_wraps() {
        let mut breath = Breath::default();
        breath.advance(Duration::from_secs(60));
        assert!((0.0..TAU).contains(&breath.phase()));
    }

    #[test]
    fn rest_phase_is_midpoint() {
        let breath = Breath::default();
        let mid = (MIN_STRETCH + MAX_STRETCH) / 2.0;
        assert!((breath.stretch() - mid).abs() < 1e-5);
    }

    #[test]
    fn layout_keeps_bottom_quarter_fixed() {
        let layout = StretchLayout::new(200.0, 1.08);
        assert_eq!(layout.split_y, 150.0);
        assert_eq!(layout.bottom_y, 200.0);
        assert_eq!(layout.top_y, 150.0 - 162.0);
        assert!((layout.split_v - 0.75).abs() < 1e-6);

        let shrunk = StretchLayout::new(200.0, 0.98);
        assert_eq!(shrunk.top_y, 3.0);
    }
}
