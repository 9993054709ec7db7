//! Easing curves used by the popup, combo and footer animations.
//!
//! All take a progress value in `0.0..=1.0` (clamped) and return the eased
//! value. `out_back` overshoots past 1.0 before settling.

pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

pub fn out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Overshoot constant matching the common 10% back-out.
const BACK_OVERSHOOT: f32 = 1.70158;

pub fn out_back(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    let c = BACK_OVERSHOOT;
    1.0 + (c + 1.0) * t * t * t + c * t * t
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn endpoints_are_fixed() {
        for f in [linear, out_quad, out_back] {
            assert!(f(0.0).abs() < EPS);
            assert!((f(1.0) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn out_quad_front_loads_motion() {
        assert!((out_quad(0.5) - 0.75).abs() < EPS);
        assert!(out_quad(0.25) > 0.25);
    }

    #[test]
    fn out_back_overshoots() {
        let peak = (1..100)
            .map(|i| out_back(i as f32 / 100.0))
            .fold(0.0f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(out_quad(-3.0), 0.0);
        assert!((out_quad(7.0) - 1.0).abs() < EPS);
        assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
    }
}
