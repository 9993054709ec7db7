//! The pet's game state: what a slap does and how time moves things along.
//!
//! Everything here is independent of the window and GPU so it can be driven
//! from tests with synthetic timestamps.

use std::time::Duration;

use chrono::Local;
use glam::Vec2;
use instant::Instant;

use crate::achievements::{Achievements, Definition};
use crate::cat::{Cat, Pose};
use crate::combo::ComboTracker;
use crate::config::{Config, Settings};
use crate::ecs::components::{Label, Opacity, Position};
use crate::ecs::systems::popups;
use crate::hud::combo_label::{ComboLabel, LabelFrame};
use crate::hud::toast::Toasts;
use crate::input::InputSource;
use crate::platform;
use crate::sound::SoundManager;
use crate::startup;

/// A combo sound plays on every n-th slap of a streak.
const COMBO_SOUND_EVERY: u32 = 10;
/// Longest step fed to the breathing animation after a stall.
const MAX_DT: Duration = Duration::from_millis(100);

/// One "+1" ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupFrame {
    pub pos: Vec2,
    pub opacity: f32,
    pub text: &'static str,
}

/// What changed when new settings were applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsDelta {
    pub skin: bool,
    pub footer: bool,
}

pub struct Pet {
    config: Config,
    cat: Cat,
    combo: ComboTracker,
    label: ComboLabel,
    popups: hecs::World,
    finished: Vec<hecs::Entity>,
    rng: fastrand::Rng,
    achievements: Achievements,
    toasts: Toasts,
    sound: SoundManager,
    cat_size: Vec2,
    /// Where merging popups fly to. The UI keeps it on the combo label.
    label_anchor: Vec2,
    last_tick: Instant,
}

impl Pet {
    pub fn new(config: Config, achievements: Achievements, sound: SoundManager) -> Self {
        Self {
            config,
            cat: Cat::new(),
            combo: ComboTracker::new(),
            label: ComboLabel::new(),
            popups: hecs::World::new(),
            finished: Vec::new(),
            rng: fastrand::Rng::new(),
            achievements,
            toasts: Toasts::default(),
            sound,
            cat_size: Vec2::splat(100.0),
            label_anchor: Vec2::new(40.0, 10.0),
            last_tick: Instant::now(),
        }
    }

    /// Count this start and run the achievements that only depend on it.
    pub fn on_launch(&mut self) {
        let launches = self.config.record_launch();
        log::info!("Launch #{launches}");
        let mut unlocked = self.achievements.check_launch_count(launches);
        unlocked.extend(
            self.achievements
                .check_time_based(Local::now().naive_local()),
        );
        self.announce(unlocked);
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn cat(&self) -> &Cat {
        &self.cat
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn slaps(&self) -> u64 {
        self.config.settings.slaps
    }

    pub fn is_paused(&self) -> bool {
        self.cat.is_paused()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.cat.set_paused(paused);
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    pub fn set_cat_size(&mut self, size: Vec2) {
        self.cat_size = size;
    }

    pub fn set_label_anchor(&mut self, anchor: Vec2) {
        self.label_anchor = anchor;
    }

    /// React to one input. Returns false when the pet is paused.
    pub fn slap(&mut self, source: InputSource, now: Instant) -> bool {
        if self.cat.is_paused() {
            return false;
        }
        log::trace!("Slap from {source:?}");

        let pose = self.cat.slap(now);
        self.sound.play_slap(pose == Pose::Right);

        if !self.config.settings.at_slap_cap() {
            let slaps = self.config.settings.slaps.saturating_add(1);
            if let Err(e) = self.config.update_slap_count(slaps) {
                log::error!("Error saving slap count: {e}");
            }
        }

        let combo = self.combo.register(now);
        if combo % COMBO_SOUND_EVERY == 0 {
            self.sound.play_combo(combo);
        }

        if self.config.settings.floating_points {
            let merge_into = (combo > 1).then_some(self.label_anchor);
            popups::spawn(
                &mut self.popups,
                &mut self.rng,
                self.cat_size,
                merge_into,
                now,
            );
        } else if combo > 1 {
            self.label.pop(combo, now);
        }

        let mut unlocked = self.achievements.check_slap_count(self.slaps());
        unlocked.extend(self.achievements.check_combo(combo));
        unlocked.extend(self.achievements.check_speed_demon(&self.combo, now));
        unlocked.extend(self.achievements.check_marathon(&self.combo, now));
        unlocked.extend(
            self.achievements
                .check_time_based(Local::now().naive_local()),
        );
        self.announce(unlocked);
        true
    }

    /// Advance every animation to `now`.
    pub fn tick(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_tick).min(MAX_DT);
        self.last_tick = now;

        self.cat.tick(now, dt);

        if self.combo.expire(now) {
            self.label.fade(now);
        }

        let arrivals = popups::update(&mut self.popups, now, &mut self.finished);
        if arrivals > 0 && self.combo.count() > 1 {
            self.label.pop(self.combo.count(), now);
        }

        self.label.tick(now, &mut self.rng);
        self.toasts.tick(now);
    }

    pub fn label_frame(&self, now: Instant) -> Option<LabelFrame> {
        self.label.frame(now)
    }

    pub fn popups(&self) -> Vec<PopupFrame> {
        self.popups
            .query::<(&Position, &Opacity, &Label)>()
            .iter()
            .map(|(_, (pos, opacity, label))| PopupFrame {
                pos: pos.0,
                opacity: opacity.0,
                text: label.0,
            })
            .collect()
    }

    /// True while something on screen is still moving.
    pub fn is_animating(&self) -> bool {
        self.popups.len() > 0 || self.label.is_visible() || !self.toasts.is_empty()
    }

    /// Zero the persistent slap counter and drop the current streak.
    pub fn reset_count(&mut self) {
        if let Err(e) = self.config.update_slap_count(0) {
            log::error!("Error saving slap count: {e}");
        }
        self.combo.reset();
        self.label.hide();
        popups::clear(&mut self.popups);
        log::info!("Slap counter reset");
    }

    /// Store and persist new settings, re-applying the ones with side
    /// effects outside the UI.
    pub fn apply_settings(&mut self, mut new: Settings) -> SettingsDelta {
        let old = &self.config.settings;
        // The counter may have moved while the panel was open.
        new.slaps = old.slaps;
        new.launches = old.launches;

        let delta = SettingsDelta {
            skin: new.skin != old.skin,
            footer: new.hidden_footer != old.hidden_footer || new.footer_alpha != old.footer_alpha,
        };
        if new.startup_with_windows != old.startup_with_windows {
            startup::apply(new.startup_with_windows);
        }
        if new.sound_enabled != old.sound_enabled {
            self.sound.set_enabled(new.sound_enabled);
        }
        if new.sound_volume != old.sound_volume {
            self.sound.set_volume(new.sound_volume);
        }
        if !new.floating_points {
            popups::clear(&mut self.popups);
        }

        self.config.settings = new;
        if let Err(e) = self.config.save() {
            log::error!("Error saving config: {e}");
        }
        delta
    }

    fn announce(&mut self, unlocked: Vec<&'static Definition>) {
        if unlocked.is_empty() {
            return;
        }
        for def in unlocked {
            self.toasts.push(def);
        }
        self.sound.play_achievement();
    }

    /// Open `bongo.ini` in the default editor. A failure shows a toast.
    pub fn open_config(&mut self) {
        if let Err(e) = platform::open_in_editor(self.config.path()) {
            log::error!("{e}");
            self.toasts
                .notice("⚠", "Could not open config file", e.to_string());
        }
    }

    pub fn shutdown(&mut self) {
        self.sound.stop_all();
        if let Err(e) = self.config.save() {
            log::error!("Error saving config: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combo::COMBO_TIMEOUT;
    use crate::ecs::systems::popups::POPUP_DURATION;

    fn pet_in(dir: &tempfile::TempDir) -> Pet {
        let config = Config::load(dir.path().join("bongo.ini"));
        let achievements = Achievements::load(dir.path().join("achievements.json"));
        Pet::new(config, achievements, SoundManager::silent())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn slaps_are_counted_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let t0 = Instant::now();
        {
            let mut pet = pet_in(&dir);
            assert!(pet.slap(InputSource::Keyboard, t0));
            assert!(pet.slap(InputSource::Mouse, t0 + ms(100)));
            assert_eq!(pet.slaps(), 2);
            assert_eq!(pet.combo().count(), 2);
        }
        let pet = pet_in(&dir);
        assert_eq!(pet.slaps(), 2);
        assert!(pet.achievements().is_unlocked("first_slap"));
    }

    #[test]
    fn paused_pet_ignores_slaps() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        pet.set_paused(true);
        assert!(!pet.slap(InputSource::Controller, Instant::now()));
        assert_eq!(pet.slaps(), 0);
        assert_eq!(pet.cat().pose(), Pose::Idle);
    }

    #[test]
    fn counter_stops_at_cap_but_cat_still_slaps() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        let mut settings = pet.settings().clone();
        settings.max_slaps = 2;
        pet.apply_settings(settings);

        let t0 = Instant::now();
        for i in 0..4 {
            pet.slap(InputSource::Keyboard, t0 + ms(i * 10));
        }
        assert_eq!(pet.slaps(), 2);
        assert_ne!(pet.cat().pose(), Pose::Idle);
        assert_eq!(pet.combo().count(), 4);
    }

    #[test]
    fn merging_popup_pops_the_combo_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        let t0 = Instant::now();
        pet.tick(t0);

        pet.slap(InputSource::Keyboard, t0);
        pet.slap(InputSource::Keyboard, t0 + ms(100));
        assert_eq!(pet.popups().len(), 2);
        assert!(pet.label_frame(t0 + ms(100)).is_none());

        let arrived = t0 + ms(100) + POPUP_DURATION;
        pet.tick(arrived);
        assert!(pet.popups().is_empty());
        assert_eq!(pet.label_frame(arrived).unwrap().count, 2);
        assert_eq!(pet.cat().pose(), Pose::Idle);

        // Streak times out and the label fades.
        let expired = t0 + ms(100) + COMBO_TIMEOUT;
        pet.tick(expired);
        assert_eq!(pet.combo().count(), 0);
        assert!(pet.label_frame(expired).is_some());
        pet.tick(expired + ms(300));
        assert!(pet.label_frame(expired + ms(300)).is_none());
    }

    #[test]
    fn without_floating_points_label_pops_directly() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        let mut settings = pet.settings().clone();
        settings.floating_points = false;
        pet.apply_settings(settings);

        let t0 = Instant::now();
        pet.slap(InputSource::Keyboard, t0);
        assert!(pet.label_frame(t0).is_none());
        pet.slap(InputSource::Keyboard, t0 + ms(50));
        assert!(pet.popups().is_empty());
        assert_eq!(pet.label_frame(t0 + ms(50)).unwrap().count, 2);
    }

    #[test]
    fn reset_clears_counter_and_streak() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        let t0 = Instant::now();
        pet.slap(InputSource::Keyboard, t0);
        pet.slap(InputSource::Keyboard, t0 + ms(10));
        pet.reset_count();
        assert_eq!(pet.slaps(), 0);
        assert_eq!(pet.combo().count(), 0);
        assert!(pet.popups().is_empty());
    }

    #[test]
    fn apply_settings_keeps_live_counters() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        let stale = pet.settings().clone();
        pet.slap(InputSource::Keyboard, Instant::now());

        let mut edited = stale;
        edited.skin = "space".into();
        edited.footer_alpha = 80;
        let delta = pet.apply_settings(edited);
        assert_eq!(delta, SettingsDelta { skin: true, footer: true });
        assert_eq!(pet.slaps(), 1);
        assert_eq!(pet.settings().footer_alpha, 80);
    }

    #[test]
    fn launches_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        pet.on_launch();
        pet.on_launch();
        assert_eq!(pet.settings().launches, 2);
        assert!(!pet.achievements().is_unlocked("dedication"));
    }

    #[test]
    fn failed_config_open_shows_a_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut pet = pet_in(&dir);
        std::fs::remove_file(dir.path().join("bongo.ini")).unwrap();

        pet.open_config();
        let t0 = Instant::now();
        pet.tick(t0);
        let (toast, _) = pet.toasts().current(t0).unwrap();
        assert_eq!(toast.title, "Could not open config file");
        assert!(toast.description.contains("bongo.ini"));
    }
}
