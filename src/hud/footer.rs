use std::time::Duration;

use instant::Instant;

use crate::easing;

pub const FOOTER_HEIGHT: f32 = 35.0;
const FADE_DURATION: Duration = Duration::from_millis(300);
/// Grace period after the pointer leaves before the footer fades out.
const LEAVE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    since: Instant,
}

/// Hover-driven opacity of the footer bar.
#[derive(Debug)]
pub struct FooterFade {
    /// `hidden_footer = false` pins the footer fully visible.
    auto_hide: bool,
    hovering: bool,
    leave_at: Option<Instant>,
    fade: Option<Fade>,
    opacity: f32,
}

impl FooterFade {
    pub fn new(auto_hide: bool) -> Self {
        Self {
            auto_hide,
            hovering: false,
            leave_at: None,
            fade: None,
            opacity: if auto_hide { 0.0 } else { 1.0 },
        }
    }

    pub fn set_auto_hide(&mut self, auto_hide: bool, now: Instant) {
        self.auto_hide = auto_hide;
        if !auto_hide {
            self.fade = None;
            self.opacity = 1.0;
        } else if !self.hovering {
            self.start(0.0, now);
        }
    }

    /// Report the pointer entering or leaving the window.
    pub fn set_hover(&mut self, hovering: bool, now: Instant) {
        if hovering == self.hovering {
            return;
        }
        self.hovering = hovering;
        if hovering {
            self.leave_at = None;
            self.start(1.0, now);
        } else {
            self.leave_at = Some(now + LEAVE_DELAY);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if !self.auto_hide {
            self.opacity = 1.0;
            return;
        }
        if let Some(at) = self.leave_at {
            if now >= at {
                self.leave_at = None;
                if !self.hovering {
                    self.start(0.0, now);
                }
            }
        }
        if let Some(fade) = self.fade {
            let t = now.saturating_duration_since(fade.since).as_secs_f32()
                / FADE_DURATION.as_secs_f32();
            self.opacity = easing::lerp(fade.from, fade.to, easing::linear(t));
            if t >= 1.0 {
                self.fade = None;
            }
        }
    }

    fn start(&mut self, to: f32, now: Instant) {
        if !self.auto_hide {
            return;
        }
        self.fade = Some(Fade {
            from: self.opacity,
            to,
            since: now,
        });
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Still changing, so the frame loop should keep redrawing.
    pub fn is_animating(&self) -> bool {
        self.fade.is_some() || self.leave_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn hover_fades_in() {
        let t0 = Instant::now();
        let mut footer = FooterFade::new(true);
        assert!(!footer.is_visible());

        footer.set_hover(true, t0);
        footer.tick(t0 + ms(150));
        assert!((footer.opacity() - 0.5).abs() < 1e-3);
        footer.tick(t0 + ms(300));
        assert_eq!(footer.opacity(), 1.0);
        assert!(!footer.is_animating());
    }

    #[test]
    fn leave_waits_before_fading() {
        let t0 = Instant::now();
        let mut footer = FooterFade::new(true);
        footer.set_hover(true, t0);
        footer.tick(t0 + ms(300));

        footer.set_hover(false, t0 + ms(1000));
        footer.tick(t0 + ms(1150));
        assert_eq!(footer.opacity(), 1.0);

        footer.tick(t0 + ms(1200));
        footer.tick(t0 + ms(1500));
        assert_eq!(footer.opacity(), 0.0);
    }

    #[test]
    fn quick_return_cancels_fade_out() {
        let t0 = Instant::now();
        let mut footer = FooterFade::new(true);
        footer.set_hover(true, t0);
        footer.tick(t0 + ms(300));
        footer.set_hover(false, t0 + ms(400));
        footer.set_hover(true, t0 + ms(500));
        footer.tick(t0 + ms(1000));
        assert_eq!(footer.opacity(), 1.0);
    }

    #[test]
    fn pinned_footer_is_always_visible() {
        let t0 = Instant::now();
        let mut footer = FooterFade::new(false);
        footer.set_hover(false, t0);
        footer.tick(t0 + ms(5000));
        assert_eq!(footer.opacity(), 1.0);

        footer.set_auto_hide(true, t0 + ms(5000));
        footer.tick(t0 + ms(5300));
        assert_eq!(footer.opacity(), 0.0);
    }
}
