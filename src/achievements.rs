use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::combo::{ComboTracker, THRESHOLD_RED};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Slaps,
    Combos,
    Special,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Slaps => "Slaps",
            Category::Combos => "Combos",
            Category::Special => "Special",
        }
    }
}

/// Static description of one achievement.
#[derive(Debug)]
pub struct Definition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: Category,
    /// Name and description stay masked until unlocked.
    pub hidden: bool,
    /// Slap or combo threshold; unused for most special entries.
    pub requirement: u64,
}

const fn def(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: Category,
    hidden: bool,
    requirement: u64,
) -> Definition {
    Definition {
        id,
        name,
        description,
        icon,
        category,
        hidden,
        requirement,
    }
}

use Category::{Combos, Slaps, Special};

pub static DEFINITIONS: &[Definition] = &[
    def("first_slap", "First Slap!", "Perform your first slap", "👋", Slaps, false, 1),
    def("slaps_100", "Century Club", "Reach 100 slaps", "💯", Slaps, false, 100),
    def("slaps_500", "Dedicated Drummer", "Reach 500 slaps", "🥁", Slaps, false, 500),
    def("slaps_1000", "Thousand Taps", "Reach 1,000 slaps", "🎯", Slaps, false, 1_000),
    def("slaps_5000", "Rhythm Master", "Reach 5,000 slaps", "🎵", Slaps, false, 5_000),
    def("slaps_10000", "Ten Thousand Touches", "Reach 10,000 slaps", "⭐", Slaps, false, 10_000),
    def("slaps_25000", "Quarter Century", "Reach 25,000 slaps", "🎖", Slaps, false, 25_000),
    def("slaps_50000", "Fifty Thousand Fury", "Reach 50,000 slaps", "👑", Slaps, false, 50_000),
    def("slaps_100000", "One Hundred Thousand Legend", "Reach 100,000 slaps", "🏆", Slaps, false, 100_000),
    def("combo_10", "Getting Started", "Achieve a 10x combo", "🔟", Combos, false, 10),
    def("combo_25", "Combo Novice", "Achieve a 25x combo", "🔥", Combos, false, 25),
    def("combo_50", "Combo Expert", "Achieve a 50x combo", "⚡", Combos, false, 50),
    def("combo_100", "Combo Master", "Achieve a 100x combo", "💥", Combos, false, 100),
    def("combo_200", "Unstoppable", "Achieve a 200x combo", "🌟", Combos, false, 200),
    def("combo_300", "Triple Century", "Achieve a 300x combo", "🚀", Combos, false, 300),
    def("combo_500", "Five Hundred Frenzy", "Achieve a 500x combo", "🔮", Combos, false, 500),
    def("combo_1000", "Legendary Combo", "Achieve a 1000x combo", "💎", Combos, false, 1_000),
    def("night_owl", "Night Owl", "Slap between midnight and 3 AM", "🦉", Special, true, 0),
    def("early_bird", "Early Bird", "Slap between 5 AM and 7 AM", "🐦", Special, true, 0),
    def("overload_survivor", "Overload Survivor", "Achieve the overload effect (60+ combo)", "💫", Special, false, THRESHOLD_RED as u64),
    def("weekend_warrior", "Weekend Warrior", "Slap on Saturday or Sunday", "🎮", Special, true, 0),
    def("dedication", "Dedicated", "Open Bongo Cat 10 times", "📅", Special, false, 10),
    def("persistence", "Persistence", "Open Bongo Cat 50 times", "🎯", Special, false, 50),
    def("devotion", "True Devotion", "Open Bongo Cat 100 times", "💖", Special, false, 100),
    def("speed_demon", "Speed Demon", "Reach 10 combo in under 2 seconds", "⚡", Special, true, 10),
    def("marathon_session", "Marathon Session", "Keep a 100+ combo for over 30 seconds", "🏃", Special, true, 100),
];

const LAUNCH_ACHIEVEMENTS: &[&str] = &["dedication", "persistence", "devotion"];

/// One entry of `achievements.json`.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(default)]
    unlocked: bool,
    #[serde(default)]
    unlock_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Achievement {
    pub def: &'static Definition,
    pub unlocked: bool,
    /// Local ISO-8601 timestamp of the unlock.
    pub unlock_time: Option<String>,
}

impl Achievement {
    /// Title as shown in the achievements panel.
    pub fn display_name(&self) -> &'static str {
        if self.def.hidden && !self.unlocked {
            "???"
        } else {
            self.def.name
        }
    }

    pub fn display_description(&self) -> &'static str {
        if self.def.hidden && !self.unlocked {
            "Hidden achievement"
        } else {
            self.def.description
        }
    }
}

/// Unlock state for every achievement, persisted as JSON.
pub struct Achievements {
    path: PathBuf,
    entries: Vec<Achievement>,
}

impl Achievements {
    /// Load progress from `path`. A missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut achievements = Self {
            entries: DEFINITIONS
                .iter()
                .map(|def| Achievement {
                    def,
                    unlocked: false,
                    unlock_time: None,
                })
                .collect(),
            path,
        };

        if achievements.path.exists() {
            match achievements.read_records() {
                Ok(records) => achievements.apply(records),
                Err(e) => log::error!("Error loading achievements: {e}"),
            }
        }
        log::info!("Loaded {} unlocked achievements", achievements.unlocked_count());
        achievements
    }

    fn read_records(&self) -> Result<BTreeMap<String, Record>> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn apply(&mut self, records: BTreeMap<String, Record>) {
        for (id, record) in records {
            if let Some(entry) = self.entries.iter_mut().find(|a| a.def.id == id) {
                entry.unlocked = record.unlocked;
                entry.unlock_time = record.unlock_time;
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let records: BTreeMap<&str, Record> = self
            .entries
            .iter()
            .filter(|a| a.unlocked)
            .map(|a| {
                (
                    a.def.id,
                    Record {
                        unlocked: true,
                        unlock_time: a.unlock_time.clone(),
                    },
                )
            })
            .collect();

        let json = serde_json::to_string_pretty(&records).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|e| Error::io(&self.path, e))
    }

    pub fn all(&self) -> &[Achievement] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.entries.iter().find(|a| a.def.id == id)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.get(id).is_some_and(|a| a.unlocked)
    }

    pub fn unlocked_count(&self) -> usize {
        self.entries.iter().filter(|a| a.unlocked).count()
    }

    pub fn progress_percent(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.unlocked_count() as f32 / self.entries.len() as f32 * 100.0
    }

    /// Unlock `id` now. Returns the definition when it was newly unlocked.
    pub fn unlock(&mut self, id: &str) -> Option<&'static Definition> {
        self.unlock_at(id, Local::now().naive_local())
    }

    fn unlock_at(&mut self, id: &str, now: NaiveDateTime) -> Option<&'static Definition> {
        let entry = self.entries.iter_mut().find(|a| a.def.id == id)?;
        if entry.unlocked {
            return None;
        }
        entry.unlocked = true;
        entry.unlock_time = Some(now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
        let def = entry.def;

        log::info!("Achievement unlocked: {}", def.name);
        if let Err(e) = self.save() {
            log::error!("Error saving achievements: {e}");
        }
        Some(def)
    }

    fn unlock_where(
        &mut self,
        now: NaiveDateTime,
        pred: impl Fn(&Definition) -> bool,
    ) -> Vec<&'static Definition> {
        let ids: Vec<&'static str> = self
            .entries
            .iter()
            .filter(|a| !a.unlocked && pred(a.def))
            .map(|a| a.def.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.unlock_at(id, now))
            .collect()
    }

    pub fn check_slap_count(&mut self, slaps: u64) -> Vec<&'static Definition> {
        let now = Local::now().naive_local();
        self.unlock_where(now, |d| d.category == Slaps && slaps >= d.requirement)
    }

    /// Combo thresholds, plus "overload survivor" once the overload tier is
    /// reached.
    pub fn check_combo(&mut self, combo: u32) -> Vec<&'static Definition> {
        let now = Local::now().naive_local();
        let combo = combo as u64;
        self.unlock_where(now, |d| {
            (d.category == Combos || d.id == "overload_survivor") && combo >= d.requirement
        })
    }

    /// Night owl (00:00-03:00), early bird (05:00-07:00) and weekend warrior.
    pub fn check_time_based(&mut self, now: NaiveDateTime) -> Vec<&'static Definition> {
        let hour = now.hour();
        let weekend = matches!(now.weekday(), Weekday::Sat | Weekday::Sun);

        let mut unlocked = Vec::new();
        if hour < 3 {
            unlocked.extend(self.unlock_at("night_owl", now));
        }
        if (5..7).contains(&hour) {
            unlocked.extend(self.unlock_at("early_bird", now));
        }
        if weekend {
            unlocked.extend(self.unlock_at("weekend_warrior", now));
        }
        unlocked
    }

    pub fn check_launch_count(&mut self, launches: u64) -> Vec<&'static Definition> {
        let now = Local::now().naive_local();
        self.unlock_where(now, |d| {
            LAUNCH_ACHIEVEMENTS.contains(&d.id) && launches >= d.requirement
        })
    }

    pub fn check_speed_demon(
        &mut self,
        combo: &ComboTracker,
        now: Instant,
    ) -> Option<&'static Definition> {
        if combo.is_speed_demon(now) {
            self.unlock("speed_demon")
        } else {
            None
        }
    }

    pub fn check_marathon(
        &mut self,
        combo: &ComboTracker,
        now: Instant,
    ) -> Option<&'static Definition> {
        if combo.is_marathon(now) {
            self.unlock("marathon_session")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    fn store() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("achievements.json");
        (dir, path)
    }

    #[test]
    fn definitions_are_unique() {
        assert_eq!(DEFINITIONS.len(), 26);
        for (i, a) in DEFINITIONS.iter().enumerate() {
            assert!(
                DEFINITIONS[i + 1..].iter().all(|b| b.id != a.id),
                "duplicate id {}",
                a.id
            );
        }
    }

    #[test]
    fn unlock_is_idempotent() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);
        assert!(a.unlock("first_slap").is_some());
        assert!(a.unlock("first_slap").is_none());
        assert!(a.unlock("no_such_thing").is_none());
        assert_eq!(a.unlocked_count(), 1);
    }

    #[test]
    fn progress_persists_between_loads() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);
        a.check_slap_count(150);
        assert!(a.is_unlocked("first_slap"));
        assert!(a.is_unlocked("slaps_100"));
        assert!(!a.is_unlocked("slaps_500"));

        let reloaded = Achievements::load(&path);
        assert_eq!(reloaded.unlocked_count(), 2);
        assert!(reloaded.get("slaps_100").unwrap().unlock_time.is_some());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2, "only unlocked entries are written");
        assert_eq!(obj["first_slap"]["unlocked"], serde_json::Value::Bool(true));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let (_dir, path) = store();
        fs::write(&path, "{ not json").unwrap();
        let a = Achievements::load(&path);
        assert_eq!(a.unlocked_count(), 0);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (_dir, path) = store();
        fs::write(
            &path,
            r#"{"combo_10": {"unlocked": true, "unlock_time": "2024-01-01T10:00:00"},
                "retired": {"unlocked": true}}"#,
        )
        .unwrap();
        let a = Achievements::load(&path);
        assert_eq!(a.unlocked_count(), 1);
        assert!(a.is_unlocked("combo_10"));
    }

    #[test]
    fn combo_sixty_unlocks_overload_survivor() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);
        let ids: Vec<_> = a.check_combo(59).iter().map(|d| d.id).collect();
        assert_eq!(ids, ["combo_10", "combo_25", "combo_50"]);
        assert!(!a.is_unlocked("overload_survivor"));

        a.check_combo(60);
        assert!(a.is_unlocked("overload_survivor"));
        assert!(!a.is_unlocked("combo_100"));
    }

    #[test]
    fn time_windows() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);

        // 2024-01-03 is a Wednesday.
        assert!(a.check_time_based(at(2024, 1, 3, 12)).is_empty());
        assert!(a.check_time_based(at(2024, 1, 3, 3)).is_empty());

        let ids: Vec<_> = a.check_time_based(at(2024, 1, 3, 2)).iter().map(|d| d.id).collect();
        assert_eq!(ids, ["night_owl"]);

        a.check_time_based(at(2024, 1, 3, 6));
        assert!(a.is_unlocked("early_bird"));

        a.check_time_based(at(2024, 1, 6, 12));
        assert!(a.is_unlocked("weekend_warrior"));
    }

    #[test]
    fn launch_thresholds() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);
        assert!(a.check_launch_count(9).is_empty());
        assert_eq!(a.check_launch_count(50).len(), 2);
        assert!(!a.is_unlocked("devotion"));
        assert!(a.check_launch_count(50).is_empty());
    }

    #[test]
    fn hidden_names_are_masked_until_unlocked() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);
        assert_eq!(a.get("night_owl").unwrap().display_name(), "???");
        a.unlock("night_owl");
        assert_eq!(a.get("night_owl").unwrap().display_name(), "Night Owl");
    }

    #[test]
    fn progress_percent_counts_unlocked() {
        let (_dir, path) = store();
        let mut a = Achievements::load(&path);
        assert_eq!(a.progress_percent(), 0.0);
        a.check_combo(1_000);
        let expected = 9.0 / 26.0 * 100.0;
        assert!((a.progress_percent() - expected).abs() < 1e-3);
    }
}
