use std::collections::VecDeque;
use std::time::Duration;

use instant::Instant;

use crate::achievements::Definition;

/// How long one toast stays up, fade included.
pub const TOAST_DURATION: Duration = Duration::from_millis(3000);
const TOAST_FADE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone)]
pub struct Toast {
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    shown_at: Option<Instant>,
}

/// Queue of banners (unlocked achievements, failed actions), shown one at a
/// time.
#[derive(Debug, Default)]
pub struct Toasts {
    queue: VecDeque<Toast>,
}

impl Toasts {
    pub fn push(&mut self, def: &'static Definition) {
        self.notice(def.icon, def.name, def.description);
    }

    pub fn notice(
        &mut self,
        icon: &'static str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.queue.push_back(Toast {
            icon,
            title: title.into(),
            description: description.into(),
            shown_at: None,
        });
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(front) = self.queue.front_mut() {
            let shown = *front.shown_at.get_or_insert(now);
            if now.saturating_duration_since(shown) >= TOAST_DURATION {
                self.queue.pop_front();
                if let Some(next) = self.queue.front_mut() {
                    next.shown_at = Some(now);
                }
            }
        }
    }

    /// The toast on screen and its opacity.
    pub fn current(&self, now: Instant) -> Option<(&Toast, f32)> {
        let toast = self.queue.front()?;
        let age = toast
            .shown_at
            .map_or(Duration::ZERO, |at| now.saturating_duration_since(at));
        let left = TOAST_DURATION.saturating_sub(age);
        let fade = TOAST_FADE.as_secs_f32();
        let alpha = (age.as_secs_f32() / fade)
            .min(left.as_secs_f32() / fade)
            .min(1.0);
        Some((toast, alpha))
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::DEFINITIONS;

    #[test]
    fn toasts_show_one_after_another() {
        let t0 = Instant::now();
        let mut toasts = Toasts::default();
        toasts.push(&DEFINITIONS[0]);
        toasts.push(&DEFINITIONS[1]);

        toasts.tick(t0);
        assert_eq!(toasts.current(t0).unwrap().0.title, DEFINITIONS[0].name);
        assert_eq!(toasts.current(t0 + TOAST_FADE).unwrap().1, 1.0);

        let near_end = t0 + TOAST_DURATION - TOAST_FADE / 2;
        let (_, alpha) = toasts.current(near_end).unwrap();
        assert!((alpha - 0.5).abs() < 1e-3);

        toasts.tick(t0 + TOAST_DURATION);
        assert_eq!(
            toasts.current(t0 + TOAST_DURATION).unwrap().0.title,
            DEFINITIONS[1].name
        );

        toasts.tick(t0 + TOAST_DURATION * 2);
        assert!(toasts.is_empty());
    }

    #[test]
    fn toasts_fade_in_and_out() {
        let t0 = Instant::now();
        let mut toasts = Toasts::default();
        toasts.notice("⚠", "Heads up", "something happened");
        toasts.tick(t0);

        assert_eq!(toasts.current(t0).unwrap().1, 0.0);
        let (_, rising) = toasts.current(t0 + TOAST_FADE / 2).unwrap();
        assert!((rising - 0.5).abs() < 1e-3);
        assert_eq!(toasts.current(t0 + TOAST_DURATION / 2).unwrap().1, 1.0);
        let (_, falling) = toasts.current(t0 + TOAST_DURATION - TOAST_FADE / 4).unwrap();
        assert!((falling - 0.25).abs() < 1e-3);
    }
}
