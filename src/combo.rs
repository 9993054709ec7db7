use std::time::Duration;

use instant::Instant;

/// Time window for chaining slaps into a combo; also how long an idle combo
/// stays on screen before it fades.
pub const COMBO_TIMEOUT: Duration = Duration::from_millis(800);

pub const THRESHOLD_ORANGE: u32 = 30;
pub const THRESHOLD_RED: u32 = 60;

const MIN_FONT_SIZE: u32 = 14;
const MAX_FONT_SIZE: u32 = 20;
const FONT_SIZE_DIVISOR: u32 = 3;

/// Reaching this combo quickly earns "speed demon".
pub const SPEED_DEMON_COMBO: u32 = 10;
pub const SPEED_DEMON_WINDOW: Duration = Duration::from_secs(2);
/// Holding this combo long enough earns "marathon session".
pub const MARATHON_COMBO: u32 = 100;
pub const MARATHON_DURATION: Duration = Duration::from_secs(30);

/// Colour band of the combo counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboTier {
    Yellow,
    Orange,
    /// Overload.
    Red,
}

impl ComboTier {
    pub fn for_count(count: u32) -> Self {
        if count < THRESHOLD_ORANGE {
            ComboTier::Yellow
        } else if count < THRESHOLD_RED {
            ComboTier::Orange
        } else {
            ComboTier::Red
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            ComboTier::Yellow => [255, 255, 100],
            ComboTier::Orange => [255, 150, 50],
            ComboTier::Red => [255, 50, 50],
        }
    }
}

pub fn is_overload(count: u32) -> bool {
    count >= THRESHOLD_RED
}

pub fn font_size(count: u32) -> u32 {
    (MIN_FONT_SIZE + count / FONT_SIZE_DIVISOR).min(MAX_FONT_SIZE)
}

/// Streak counter for slaps landing within [`COMBO_TIMEOUT`] of each other.
#[derive(Debug, Default)]
pub struct ComboTracker {
    count: u32,
    last_slap: Option<Instant>,
    started: Option<Instant>,
    /// When the current streak first reached [`MARATHON_COMBO`].
    marathon_since: Option<Instant>,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn tier(&self) -> ComboTier {
        ComboTier::for_count(self.count)
    }

    /// Register a slap at `now`. Returns the new combo count.
    pub fn register(&mut self, now: Instant) -> u32 {
        let chained = self
            .last_slap
            .is_some_and(|last| now.saturating_duration_since(last) < COMBO_TIMEOUT);

        if chained && self.count > 0 {
            self.count += 1;
        } else {
            self.count = 1;
            self.started = Some(now);
            self.marathon_since = None;
        }
        self.last_slap = Some(now);

        if self.count >= MARATHON_COMBO && self.marathon_since.is_none() {
            self.marathon_since = Some(now);
        }
        self.count
    }

    /// Reset the streak once the timeout has passed with no input. Returns
    /// true exactly once per expired streak.
    pub fn expire(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_slap else {
            return false;
        };
        if self.count == 0 || now.saturating_duration_since(last) < COMBO_TIMEOUT {
            return false;
        }
        self.count = 0;
        self.started = None;
        self.marathon_since = None;
        true
    }

    /// Time left before the current streak expires.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        let last = self.last_slap?;
        Some(COMBO_TIMEOUT.saturating_sub(now.saturating_duration_since(last)))
    }

    /// True when this streak hit [`SPEED_DEMON_COMBO`] within
    /// [`SPEED_DEMON_WINDOW`] of its first slap.
    pub fn is_speed_demon(&self, now: Instant) -> bool {
        match self.started {
            Some(start) => {
                self.count >= SPEED_DEMON_COMBO
                    && now.saturating_duration_since(start) <= SPEED_DEMON_WINDOW
            }
            None => false,
        }
    }

    /// True when the streak has stayed at or above [`MARATHON_COMBO`] for
    /// [`MARATHON_DURATION`].
    pub fn is_marathon(&self, now: Instant) -> bool {
        self.marathon_since
            .is_some_and(|since| now.saturating_duration_since(since) >= MARATHON_DURATION)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn slaps_within_window_chain() {
        let t0 = Instant::now();
        let mut combo = ComboTracker::new();
        assert_eq!(combo.register(t0), 1);
        assert_eq!(combo.register(t0 + ms(500)), 2);
        assert_eq!(combo.register(t0 + ms(1200)), 3);
    }

    #[test]
    fn slow_slap_restarts_at_one() {
        let t0 = Instant::now();
        let mut combo = ComboTracker::new();
        combo.register(t0);
        combo.register(t0 + ms(100));
        assert_eq!(combo.register(t0 + ms(100) + COMBO_TIMEOUT), 1);
    }

    #[test]
    fn combo_resets_after_timeout() {
        let t0 = Instant::now();
        let mut combo = ComboTracker::new();
        combo.register(t0);
        combo.register(t0 + ms(200));

        assert!(!combo.expire(t0 + ms(900)));
        assert_eq!(combo.count(), 2);

        assert!(combo.expire(t0 + ms(1000)));
        assert_eq!(combo.count(), 0);
        assert!(!combo.expire(t0 + ms(2000)), "expires only once");
        assert_eq!(combo.remaining(t0 + ms(2000)), None);
    }

    #[test]
    fn remaining_counts_down() {
        let t0 = Instant::now();
        let mut combo = ComboTracker::new();
        combo.register(t0);
        assert_eq!(combo.remaining(t0 + ms(300)), Some(ms(500)));
        assert_eq!(combo.remaining(t0 + ms(5000)), Some(Duration::ZERO));
    }

    #[test]
    fn tiers_change_exactly_at_thresholds() {
        assert_eq!(ComboTier::for_count(1), ComboTier::Yellow);
        assert_eq!(ComboTier::for_count(29), ComboTier::Yellow);
        assert_eq!(ComboTier::for_count(30), ComboTier::Orange);
        assert_eq!(ComboTier::for_count(59), ComboTier::Orange);
        assert_eq!(ComboTier::for_count(60), ComboTier::Red);
        assert!(!is_overload(59));
        assert!(is_overload(60));
        assert_eq!(ComboTier::Orange.rgb(), [255, 150, 50]);
    }

    #[test]
    fn font_grows_then_caps() {
        assert_eq!(font_size(1), 14);
        assert_eq!(font_size(3), 15);
        assert_eq!(font_size(17), 19);
        assert_eq!(font_size(18), 20);
        assert_eq!(font_size(500), 20);
    }

    #[test]
    fn speed_demon_needs_ten_in_two_seconds() {
        let t0 = Instant::now();
        let mut fast = ComboTracker::new();
        for i in 0..10 {
            fast.register(t0 + ms(i * 150));
        }
        assert!(fast.is_speed_demon(t0 + ms(1350)));

        let mut slow = ComboTracker::new();
        for i in 0..10 {
            slow.register(t0 + ms(i * 700));
        }
        assert!(!slow.is_speed_demon(t0 + ms(6300)));
    }

    #[test]
    fn marathon_tracks_time_above_hundred() {
        let t0 = Instant::now();
        let mut combo = ComboTracker::new();
        let mut t = t0;
        for _ in 0..100 {
            combo.register(t);
            t += ms(100);
        }
        let reached = t - ms(100);
        assert!(!combo.is_marathon(reached + ms(29_000)));
        assert!(combo.is_marathon(reached + MARATHON_DURATION));

        combo.reset();
        assert!(!combo.is_marathon(reached + MARATHON_DURATION));
    }
}
