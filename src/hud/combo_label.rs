use std::f32::consts::PI;
use std::time::Duration;

use glam::Vec2;
use instant::Instant;

use crate::combo::{self, ComboTier};
use crate::easing;

const POP_DURATION: Duration = Duration::from_millis(150);
const POP_SCALE: f32 = 1.2;
const POP_BOUNCE: f32 = 5.0;

const FADE_DURATION: Duration = Duration::from_millis(300);
const FADE_SCALE: f32 = 0.8;

const OVERLOAD_TICK: Duration = Duration::from_millis(33);
const OVERLOAD_STEP: f32 = 0.08;
const SHAKE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Hidden,
    Popping { since: Instant },
    Shown,
    Fading { since: Instant, from_scale: f32 },
}

/// Ping-pong clock behind the overload pulse.
#[derive(Debug, Clone, Copy)]
struct Overload {
    t: f32,
    dir: f32,
    last_step: Instant,
    shake: Vec2,
}

impl Overload {
    fn new(now: Instant) -> Self {
        Self {
            t: 0.0,
            dir: 1.0,
            last_step: now,
            shake: Vec2::ZERO,
        }
    }

    fn step(&mut self, rng: &mut fastrand::Rng) {
        self.t += OVERLOAD_STEP * self.dir;
        if self.t >= 1.0 {
            self.t = 1.0;
            self.dir = -1.0;
        } else if self.t <= 0.0 {
            self.t = 0.0;
            self.dir = 1.0;
        }
        let wave = self.wave();
        self.shake = if wave > 0.8 || wave < 0.2 {
            let s = rng.i32(-SHAKE..=SHAKE) as f32;
            Vec2::splat(s)
        } else {
            Vec2::ZERO
        };
    }

    fn wave(&self) -> f32 {
        ((self.t * PI).sin() + 1.0) / 2.0
    }

    fn scale(&self) -> f32 {
        0.9 + 0.3 * self.wave()
    }

    fn offset(&self) -> Vec2 {
        let wobble = Vec2::new(
            ((self.t * 3.0 * PI).sin() * 8.0).trunc(),
            ((self.t * 2.0 * PI).cos() * 5.0).trunc(),
        );
        wobble + self.shake
    }

    fn intensity(&self) -> f32 {
        0.6 + 0.9 * self.wave()
    }
}

/// What to draw for the combo counter this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFrame {
    pub count: u32,
    pub font_size: f32,
    pub rgb: [u8; 3],
    pub opacity: f32,
    /// Multiplier on the label's natural size, about its centre.
    pub scale: f32,
    /// Offset from the resting anchor in pixels.
    pub offset: Vec2,
}

/// The "+N" combo counter: pop on every arrival, pulse while overloaded,
/// fade when the streak times out.
#[derive(Debug)]
pub struct ComboLabel {
    count: u32,
    phase: Phase,
    overload: Option<Overload>,
}

impl Default for ComboLabel {
    fn default() -> Self {
        Self {
            count: 0,
            phase: Phase::Hidden,
            overload: None,
        }
    }
}

impl ComboLabel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.phase != Phase::Hidden
    }

    /// Show `count` with the pop animation. Ignored for counts below one.
    pub fn pop(&mut self, count: u32, now: Instant) {
        if count == 0 {
            self.hide();
            return;
        }
        self.count = count;
        self.phase = Phase::Popping { since: now };
        if combo::is_overload(count) {
            if self.overload.is_none() {
                self.overload = Some(Overload::new(now));
            }
        } else {
            self.overload = None;
        }
    }

    /// Start the timeout fade from whatever scale is currently shown.
    pub fn fade(&mut self, now: Instant) {
        if matches!(self.phase, Phase::Hidden | Phase::Fading { .. }) {
            return;
        }
        let from_scale = self.overload.map_or(1.0, |o| o.scale());
        self.overload = None;
        self.phase = Phase::Fading {
            since: now,
            from_scale,
        };
    }

    pub fn hide(&mut self) {
        self.phase = Phase::Hidden;
        self.overload = None;
        self.count = 0;
    }

    /// Advance timers. Call once per frame.
    pub fn tick(&mut self, now: Instant, rng: &mut fastrand::Rng) {
        match self.phase {
            Phase::Popping { since } if now.saturating_duration_since(since) >= POP_DURATION => {
                self.phase = Phase::Shown;
            }
            Phase::Fading { since, .. } if now.saturating_duration_since(since) >= FADE_DURATION => {
                self.hide();
            }
            _ => {}
        }

        if let Some(overload) = &mut self.overload {
            while now.saturating_duration_since(overload.last_step) >= OVERLOAD_TICK {
                overload.last_step += OVERLOAD_TICK;
                overload.step(rng);
            }
        }
    }

    pub fn frame(&self, now: Instant) -> Option<LabelFrame> {
        let tier = ComboTier::for_count(self.count);
        let mut frame = LabelFrame {
            count: self.count,
            font_size: combo::font_size(self.count) as f32,
            rgb: tier.rgb(),
            opacity: 1.0,
            scale: 1.0,
            offset: Vec2::ZERO,
        };

        if let Some(overload) = &self.overload {
            frame.scale = overload.scale();
            frame.offset = overload.offset();
            let k = overload.intensity();
            frame.rgb = frame.rgb.map(|c| (c as f32 * k).min(255.0) as u8);
        }

        match self.phase {
            Phase::Hidden => return None,
            Phase::Popping { since } => {
                let t = progress(now, since, POP_DURATION);
                let e = easing::out_back(t);
                frame.scale *= easing::lerp(POP_SCALE, 1.0, e);
                frame.offset.y += easing::lerp(POP_BOUNCE, 0.0, e);
            }
            Phase::Shown => {}
            Phase::Fading { since, from_scale } => {
                let e = easing::out_quad(progress(now, since, FADE_DURATION));
                frame.opacity = 1.0 - e;
                frame.scale = easing::lerp(from_scale, from_scale * FADE_SCALE, e);
            }
        }
        Some(frame)
    }
}

fn progress(now: Instant, since: Instant, duration: Duration) -> f32 {
    now.saturating_duration_since(since).as_secs_f32() / duration.as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn pop_starts_large_and_settles() {
        let t0 = Instant::now();
        let mut rng = fastrand::Rng::with_seed(0);
        let mut label = ComboLabel::new();
        assert!(label.frame(t0).is_none());

        label.pop(5, t0);
        let first = label.frame(t0).unwrap();
        assert!((first.scale - POP_SCALE).abs() < 1e-4);
        assert!((first.offset.y - POP_BOUNCE).abs() < 1e-4);
        assert_eq!(first.rgb, [255, 255, 100]);

        label.tick(t0 + ms(150), &mut rng);
        let settled = label.frame(t0 + ms(150)).unwrap();
        assert_eq!(settled.scale, 1.0);
        assert_eq!(settled.offset, Vec2::ZERO);
    }

    #[test]
    fn fade_shrinks_and_hides() {
        let t0 = Instant::now();
        let mut rng = fastrand::Rng::with_seed(0);
        let mut label = ComboLabel::new();
        label.pop(12, t0);
        label.tick(t0 + ms(200), &mut rng);
        label.fade(t0 + ms(800));

        let mid = label.frame(t0 + ms(950)).unwrap();
        assert!(mid.opacity > 0.0 && mid.opacity < 1.0);
        assert!(mid.scale < 1.0 && mid.scale > FADE_SCALE);

        label.tick(t0 + ms(1100), &mut rng);
        assert!(!label.is_visible());
        assert!(label.frame(t0 + ms(1100)).is_none());
    }

    #[test]
    fn font_and_colour_follow_count() {
        let t0 = Instant::now();
        let mut label = ComboLabel::new();
        label.pop(45, t0);
        let f = label.frame(t0).unwrap();
        assert_eq!(f.font_size, 20.0);
        assert_eq!(f.rgb, [255, 150, 50]);
    }

    #[test]
    fn overload_pulses_within_bounds() {
        let t0 = Instant::now();
        let mut rng = fastrand::Rng::with_seed(42);
        let mut label = ComboLabel::new();
        label.pop(60, t0);
        label.tick(t0 + ms(200), &mut rng);

        let mut now = t0 + ms(200);
        for _ in 0..100 {
            now += OVERLOAD_TICK;
            label.tick(now, &mut rng);
            let f = label.frame(now).unwrap();
            assert!((0.9 - 1e-4..=1.2 + 1e-4).contains(&f.scale), "{}", f.scale);
            assert!(f.offset.x.abs() <= 10.0 && f.offset.y.abs() <= 7.0);
            // Red channel saturates; the dim channels brighten with the pulse.
            assert_eq!(f.rgb[0], 255);
            assert!(f.rgb[1] >= 50);
        }
    }

    #[test]
    fn overload_stops_below_threshold() {
        let t0 = Instant::now();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut label = ComboLabel::new();
        label.pop(60, t0);
        label.tick(t0 + ms(500), &mut rng);
        label.pop(1, t0 + ms(2000));
        label.tick(t0 + ms(2200), &mut rng);
        let f = label.frame(t0 + ms(2200)).unwrap();
        assert_eq!(f.scale, 1.0);
        assert_eq!(f.rgb, [255, 255, 100]);
    }
}
