use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Folder name under the platform config dir (`%APPDATA%`, `~/.config`, ...).
const APP_DIR: &str = "BongoCat";

pub const CONFIG_FILE: &str = "bongo.ini";
pub const LOG_FILE: &str = "bongo.log";
pub const ACHIEVEMENTS_FILE: &str = "achievements.json";

/// Where per-user state lives, and where bundled assets are read from.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl Paths {
    /// Resolve the per-user config dir (created if missing) and the asset
    /// root.
    pub fn discover() -> Result<Self> {
        let config_dir = dirs::config_dir().ok_or(Error::NoConfigDir)?.join(APP_DIR);
        fs::create_dir_all(&config_dir).map_err(|e| Error::io(&config_dir, e))?;

        Ok(Self {
            config_dir,
            assets_dir: assets_root(),
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.config_dir.join(LOG_FILE)
    }

    pub fn achievements_file(&self) -> PathBuf {
        self.config_dir.join(ACHIEVEMENTS_FILE)
    }

    /// Resolve a bundled asset such as `img/cat-rest.png`.
    pub fn asset(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets_dir.join(relative)
    }

    pub fn skins_dir(&self) -> PathBuf {
        self.asset("skins")
    }

    pub fn sounds_dir(&self) -> PathBuf {
        self.asset("sounds").join("default")
    }
}

/// Assets ship next to the executable in release bundles; during development
/// they sit in the working directory.
fn assets_root() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    match beside_exe {
        Some(dir) if dir.join("img").is_dir() => dir,
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_files_live_in_config_dir() {
        let paths = Paths {
            config_dir: PathBuf::from("/cfg/BongoCat"),
            assets_dir: PathBuf::from("/opt/bongo"),
        };
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/BongoCat/bongo.ini"));
        assert_eq!(
            paths.achievements_file(),
            PathBuf::from("/cfg/BongoCat/achievements.json")
        );
        assert!(paths.log_file().ends_with("bongo.log"));
    }

    #[test]
    fn assets_resolve_under_asset_root() {
        let paths = Paths {
            config_dir: PathBuf::from("/cfg"),
            assets_dir: PathBuf::from("/opt/bongo"),
        };
        assert_eq!(
            paths.asset("img/cat-rest.png"),
            PathBuf::from("/opt/bongo/img/cat-rest.png")
        );
        assert_eq!(paths.sounds_dir(), PathBuf::from("/opt/bongo/sounds/default"));
        assert_eq!(paths.skins_dir(), PathBuf::from("/opt/bongo/skins"));
    }
}
