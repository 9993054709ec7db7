pub mod animation;
pub mod sprite;

use std::time::Duration;

use instant::Instant;

use animation::Breath;

/// How long a paw stays down after the last slap.
pub const SLAP_HOLD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pose {
    Idle,
    Left,
    Right,
}

impl Pose {
    pub const ALL: [Pose; 3] = [Pose::Idle, Pose::Left, Pose::Right];

    /// Key used in skin metadata.
    pub fn key(self) -> &'static str {
        match self {
            Pose::Idle => "idle",
            Pose::Left => "left",
            Pose::Right => "right",
        }
    }

    /// Image name in the built-in `img/` folder and the default skin layout.
    pub fn default_file(self) -> &'static str {
        match self {
            Pose::Idle => "cat-rest.png",
            Pose::Left => "cat-left.png",
            Pose::Right => "cat-right.png",
        }
    }
}

/// Pose and breathing state of the cat.
#[derive(Debug)]
pub struct Cat {
    pose: Pose,
    /// Which paw the next slap uses.
    next_left: bool,
    /// Pending return to idle. Each slap replaces it.
    reset_at: Option<Instant>,
    breath: Breath,
    paused: bool,
}

impl Default for Cat {
    fn default() -> Self {
        Self {
            pose: Pose::Idle,
            next_left: true,
            reset_at: None,
            breath: Breath::default(),
            paused: false,
        }
    }
}

impl Cat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn stretch(&self) -> f32 {
        self.breath.stretch()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Swap to the other paw and hold it for [`SLAP_HOLD`].
    pub fn slap(&mut self, now: Instant) -> Pose {
        self.pose = if self.next_left { Pose::Left } else { Pose::Right };
        self.next_left = !self.next_left;
        self.reset_at = Some(now + SLAP_HOLD);
        self.pose
    }

    /// Advance breathing by `dt` and drop back to idle once the hold expires.
    pub fn tick(&mut self, now: Instant, dt: Duration) {
        if self.reset_at.is_some_and(|at| now >= at) {
            self.pose = Pose::Idle;
            self.reset_at = None;
        }
        if !self.paused {
            self.breath.advance(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slaps_alternate_paws() {
        let t0 = Instant::now();
        let mut cat = Cat::new();
        assert_eq!(cat.slap(t0), Pose::Left);
        assert_eq!(cat.slap(t0), Pose::Right);
        assert_eq!(cat.slap(t0), Pose::Left);
    }

    #[test]
    fn pose_resets_after_hold() {
        let t0 = Instant::now();
        let mut cat = Cat::new();
        cat.slap(t0);
        cat.tick(t0 + Duration::from_millis(50), Duration::ZERO);
        assert_eq!(cat.pose(), Pose::Left);

        // A second slap pushes the reset out.
        cat.slap(t0 + Duration::from_millis(60));
        cat.tick(t0 + Duration::from_millis(120), Duration::ZERO);
        assert_eq!(cat.pose(), Pose::Right);

        cat.tick(t0 + Duration::from_millis(160), Duration::ZERO);
        assert_eq!(cat.pose(), Pose::Idle);
    }

    #[test]
    fn paused_cat_holds_its_breath() {
        let t0 = Instant::now();
        let mut cat = Cat::new();
        cat.set_paused(true);
        let before = cat.stretch();
        cat.tick(t0, Duration::from_millis(500));
        assert_eq!(cat.stretch(), before);

        cat.set_paused(false);
        cat.tick(t0, Duration::from_millis(500));
        assert_ne!(cat.stretch(), before);
    }
}
