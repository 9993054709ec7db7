use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{Error, Result};

const SECTION: &str = "Settings";

/// Every key the app understands, with the default written for a fresh file.
const DEFAULTS: &[(&str, &str)] = &[
    ("slaps", "0"),
    ("hidden_footer", "true"),
    ("footer_alpha", "50"),
    ("always_show_points", "false"),
    ("floating_points", "true"),
    ("startup_with_windows", "false"),
    ("max_slaps", "0"),
    ("invert_cat", "false"),
    ("skin", "default"),
    ("sound_enabled", "true"),
    ("sound_volume", "50"),
    ("launches", "0"),
];

/// Typed view over `bongo.ini`.
///
/// Values are coerced on load: unknown booleans read as `false`, bad integers
/// fall back to the key's default, percentages are clamped to 0..=100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub slaps: u64,
    pub hidden_footer: bool,
    /// Footer background opacity in percent.
    pub footer_alpha: u8,
    pub always_show_points: bool,
    pub floating_points: bool,
    pub startup_with_windows: bool,
    /// Slap counter cap. 0 means no limit.
    pub max_slaps: u64,
    pub invert_cat: bool,
    pub skin: String,
    pub sound_enabled: bool,
    /// Master volume in percent.
    pub sound_volume: u8,
    pub launches: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            slaps: 0,
            hidden_footer: true,
            footer_alpha: 50,
            always_show_points: false,
            floating_points: true,
            startup_with_windows: false,
            max_slaps: 0,
            invert_cat: false,
            skin: "default".to_string(),
            sound_enabled: true,
            sound_volume: 50,
            launches: 0,
        }
    }
}

impl Settings {
    fn from_ini(ini: &Ini) -> Self {
        let d = Settings::default();
        let raw = |key: &str| ini.get_from(Some(SECTION), key);

        let skin = raw("skin")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(d.skin);

        Self {
            slaps: parse_count(raw("slaps"), d.slaps),
            hidden_footer: parse_bool(raw("hidden_footer"), d.hidden_footer),
            footer_alpha: parse_percent(raw("footer_alpha"), d.footer_alpha),
            always_show_points: parse_bool(raw("always_show_points"), d.always_show_points),
            floating_points: parse_bool(raw("floating_points"), d.floating_points),
            startup_with_windows: parse_bool(raw("startup_with_windows"), d.startup_with_windows),
            max_slaps: parse_count(raw("max_slaps"), d.max_slaps),
            invert_cat: parse_bool(raw("invert_cat"), d.invert_cat),
            skin,
            sound_enabled: parse_bool(raw("sound_enabled"), d.sound_enabled),
            sound_volume: parse_percent(raw("sound_volume"), d.sound_volume),
            launches: parse_count(raw("launches"), d.launches),
        }
    }

    fn write_into(&self, ini: &mut Ini) {
        ini.with_section(Some(SECTION))
            .set("slaps", self.slaps.to_string())
            .set("hidden_footer", self.hidden_footer.to_string())
            .set("footer_alpha", self.footer_alpha.to_string())
            .set("always_show_points", self.always_show_points.to_string())
            .set("floating_points", self.floating_points.to_string())
            .set("startup_with_windows", self.startup_with_windows.to_string())
            .set("max_slaps", self.max_slaps.to_string())
            .set("invert_cat", self.invert_cat.to_string())
            .set("skin", self.skin.as_str())
            .set("sound_enabled", self.sound_enabled.to_string())
            .set("sound_volume", self.sound_volume.to_string())
            .set("launches", self.launches.to_string());
    }

    /// Whether the slap counter has hit its configured cap.
    pub fn at_slap_cap(&self) -> bool {
        self.max_slaps > 0 && self.slaps >= self.max_slaps
    }

    /// Footer background alpha on the 0..=255 scale.
    pub fn footer_alpha_u8(&self) -> u8 {
        ((self.footer_alpha as u32 * 255 + 50) / 100).min(255) as u8
    }
}

/// `true`, `1`, `yes` and `on` (any case) are true; anything else present is
/// false. A missing key yields the default.
fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw {
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        None => default,
    }
}

/// Non-negative counter. Negative numbers clamp to zero, garbage falls back.
fn parse_count(raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(v)) => v.max(0) as u64,
        _ => default,
    }
}

fn parse_percent(raw: Option<&str>, default: u8) -> u8 {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(v)) => v.clamp(0, 100) as u8,
        _ => default,
    }
}

/// The settings plus the backing INI document.
///
/// Unknown keys and sections in the file are preserved on save.
pub struct Config {
    path: PathBuf,
    doc: Ini,
    pub settings: Settings,
}

impl Config {
    /// Load `path`, creating it with defaults when missing. Missing keys are
    /// merged in and the merged file is written back. A broken file is logged
    /// and replaced by defaults in memory.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let doc = if path.exists() {
            match read_ini(&path) {
                Ok(mut doc) => {
                    merge_defaults(&mut doc);
                    doc
                }
                Err(e) => {
                    log::error!("Error reading config file: {e}");
                    default_doc()
                }
            }
        } else {
            log::info!("Creating default config at {}", path.display());
            default_doc()
        };

        let settings = Settings::from_ini(&doc);
        let config = Self {
            path,
            doc,
            settings,
        };
        if let Err(e) = config.write() {
            log::error!("Error writing config file: {e}");
        }
        config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist every setting.
    pub fn save(&mut self) -> Result<()> {
        self.settings.write_into(&mut self.doc);
        self.write()?;
        log::debug!("Configuration saved");
        Ok(())
    }

    /// Record a new slap total without touching the other keys in the file.
    ///
    /// Called on every slap, so the rest of the settings are left as they
    /// were last saved.
    pub fn update_slap_count(&mut self, count: u64) -> Result<()> {
        self.settings.slaps = count;
        self.doc
            .with_section(Some(SECTION))
            .set("slaps", count.to_string());
        self.write()
    }

    /// Bump the launch counter and persist it. Returns the new total.
    pub fn record_launch(&mut self) -> u64 {
        self.settings.launches = self.settings.launches.saturating_add(1);
        self.doc
            .with_section(Some(SECTION))
            .set("launches", self.settings.launches.to_string());
        if let Err(e) = self.write() {
            log::error!("Error updating launch count: {e}");
        }
        self.settings.launches
    }

    fn write(&self) -> Result<()> {
        self.doc
            .write_to_file(&self.path)
            .map_err(|e| Error::io(&self.path, e))
    }
}

fn read_ini(path: &Path) -> Result<Ini> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ini::load_from_str(&text).map_err(|source| Error::Ini {
        path: path.to_path_buf(),
        source,
    })
}

fn default_doc() -> Ini {
    let mut doc = Ini::new();
    merge_defaults(&mut doc);
    doc
}

fn merge_defaults(doc: &mut Ini) {
    for &(key, value) in DEFAULTS {
        if doc.get_from(Some(SECTION), key).is_none() {
            doc.with_section(Some(SECTION)).set(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bongo.ini");
        (dir, path)
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let (_dir, path) = temp_config();
        let config = Config::load(&path);

        assert_eq!(config.settings, Settings::default());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[Settings]"));
        assert!(text.contains("footer_alpha=50"));
        assert!(text.contains("sound_volume=50"));
    }

    #[test]
    fn saved_values_round_trip() {
        let (_dir, path) = temp_config();
        let mut config = Config::load(&path);
        config.settings.hidden_footer = false;
        config.settings.footer_alpha = 85;
        config.settings.always_show_points = true;
        config.settings.max_slaps = 1000;
        config.settings.invert_cat = true;
        config.settings.skin = "neon".into();
        config.settings.sound_volume = 7;
        config.save().unwrap();

        let reloaded = Config::load(&path);
        assert_eq!(reloaded.settings, config.settings);
    }

    #[test]
    fn slap_count_update_keeps_other_keys() {
        let (_dir, path) = temp_config();
        fs::write(&path, "[Settings]\nslaps=0\nhidden_footer=false\n").unwrap();

        let mut config = Config::load(&path);
        config.update_slap_count(100).unwrap();

        let reloaded = Config::load(&path);
        assert_eq!(reloaded.settings.slaps, 100);
        assert!(!reloaded.settings.hidden_footer);
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let (_dir, path) = temp_config();
        fs::write(
            &path,
            "[Settings]\nslaps=invalid\nfooter_alpha=lots\nmax_slaps=-5\nsound_volume=900\nskin=\n",
        )
        .unwrap();

        let s = Config::load(&path).settings;
        assert_eq!(s.slaps, 0);
        assert_eq!(s.footer_alpha, 50);
        assert_eq!(s.max_slaps, 0);
        assert_eq!(s.sound_volume, 100);
        assert_eq!(s.skin, "default");
    }

    #[test]
    fn missing_keys_are_merged_and_written_back() {
        let (_dir, path) = temp_config();
        fs::write(&path, "[Settings]\nslaps=42\n").unwrap();

        let config = Config::load(&path);
        assert_eq!(config.settings.slaps, 42);
        assert!(config.settings.floating_points);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("invert_cat=false"));
        assert!(text.contains("slaps=42"));
    }

    #[test]
    fn unreadable_file_uses_defaults() {
        let (_dir, path) = temp_config();
        fs::create_dir(&path).unwrap();

        let config = Config::load(&path);
        assert_eq!(config.settings.footer_alpha, 50);
        assert!(config.settings.hidden_footer);
    }

    #[test]
    fn boolean_spellings() {
        for v in ["true", "True", "TRUE", "1", "yes", "YES", "on", "ON"] {
            assert!(parse_bool(Some(v), false), "{v}");
        }
        for v in ["false", "False", "0", "no", "NO", "off", "OFF", "maybe"] {
            assert!(!parse_bool(Some(v), true), "{v}");
        }
        assert!(parse_bool(None, true));
    }

    #[test]
    fn launch_counter_persists() {
        let (_dir, path) = temp_config();
        let mut config = Config::load(&path);
        assert_eq!(config.record_launch(), 1);
        assert_eq!(config.record_launch(), 2);
        assert_eq!(Config::load(&path).settings.launches, 2);
    }

    #[test]
    fn slap_cap() {
        let mut s = Settings::default();
        s.slaps = 10;
        assert!(!s.at_slap_cap());
        s.max_slaps = 10;
        assert!(s.at_slap_cap());
        s.max_slaps = 11;
        assert!(!s.at_slap_cap());
    }

    #[test]
    fn footer_alpha_scale() {
        let mut s = Settings::default();
        s.footer_alpha = 100;
        assert_eq!(s.footer_alpha_u8(), 255);
        s.footer_alpha = 0;
        assert_eq!(s.footer_alpha_u8(), 0);
        s.footer_alpha = 50;
        assert_eq!(s.footer_alpha_u8(), 128);
    }
}
