use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cat::Pose;
use crate::error::{Error, Result};

pub const DEFAULT_SKIN: &str = "default";
pub const DEFAULT_ROTATION: i32 = -13;
const METADATA_FILE: &str = "skin.json";

/// `skin.json` as written by skin authors. Every field is optional.
#[derive(Debug, Deserialize)]
struct Metadata {
    name: Option<String>,
    author: Option<String>,
    version: Option<String>,
    description: Option<String>,
    images: Option<BTreeMap<String, String>>,
    rotation_degrees: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinInfo {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    pub dir: PathBuf,
    /// Pose key (`idle`, `left`, `right`) to file name inside `dir`.
    pub images: BTreeMap<String, String>,
    pub rotation_degrees: i32,
}

impl SkinInfo {
    fn from_metadata(id: &str, dir: PathBuf, meta: Metadata) -> Self {
        let images = meta.images.unwrap_or_else(|| {
            Pose::ALL
                .iter()
                .map(|p| (p.key().to_string(), p.default_file().to_string()))
                .collect()
        });
        Self {
            name: meta.name.unwrap_or_else(|| id.to_string()),
            author: meta.author.unwrap_or_else(|| "Unknown".to_string()),
            version: meta.version.unwrap_or_else(|| "1.0.0".to_string()),
            description: meta.description.unwrap_or_default(),
            dir,
            images,
            rotation_degrees: meta.rotation_degrees.unwrap_or(DEFAULT_ROTATION),
        }
    }

    /// Every pose has an image entry and the file exists.
    fn validate(&self) -> std::result::Result<(), String> {
        for pose in Pose::ALL {
            let file = self
                .images
                .get(pose.key())
                .ok_or_else(|| format!("missing image key: {}", pose.key()))?;
            let path = self.dir.join(file);
            if !path.is_file() {
                return Err(format!("missing image file: {}", path.display()));
            }
        }
        Ok(())
    }

    pub fn image_path(&self, pose: Pose) -> Option<PathBuf> {
        self.images.get(pose.key()).map(|f| self.dir.join(f))
    }
}

/// Valid skins found under `skins/`, keyed by directory name.
pub struct SkinManager {
    skins: BTreeMap<String, SkinInfo>,
    current: Option<String>,
    /// Built-in images used when no skin is loaded.
    fallback_dir: PathBuf,
}

impl SkinManager {
    pub fn discover(skins_dir: &Path, fallback_dir: PathBuf) -> Self {
        let mut skins = BTreeMap::new();

        match fs::read_dir(skins_dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let dir = entry.path();
                    if !dir.is_dir() {
                        continue;
                    }
                    let id = entry.file_name().to_string_lossy().into_owned();
                    match read_skin(&id, &dir) {
                        Ok(Some(info)) => {
                            log::info!("Loaded skin: {} by {}", info.name, info.author);
                            skins.insert(id, info);
                        }
                        Ok(None) => {}
                        Err(e) => log::error!("Error loading skin {id}: {e}"),
                    }
                }
            }
            Err(_) => log::warn!("Skins directory not found: {}", skins_dir.display()),
        }

        Self {
            skins,
            current: None,
            fallback_dir,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.skins.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&SkinInfo> {
        self.skins.get(id)
    }

    pub fn load_skin(&mut self, id: &str) -> Result<&SkinInfo> {
        let info = self
            .skins
            .get(id)
            .ok_or_else(|| Error::SkinNotFound(id.to_string()))?;
        log::info!("Using skin: {}", info.name);
        self.current = Some(id.to_string());
        Ok(info)
    }

    /// Load `id`, or fall back to the built-in images when it is unknown.
    pub fn load_or_fallback(&mut self, id: &str) {
        if let Err(e) = self.load_skin(id) {
            if id != DEFAULT_SKIN {
                log::warn!("{e}; using built-in images");
            }
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&SkinInfo> {
        self.current.as_deref().and_then(|id| self.skins.get(id))
    }

    pub fn current_skin_id(&self) -> &str {
        self.current.as_deref().unwrap_or(DEFAULT_SKIN)
    }

    /// Image for `pose` from the current skin, or the built-in one.
    pub fn image_path(&self, pose: Pose) -> PathBuf {
        self.current()
            .and_then(|skin| skin.image_path(pose))
            .unwrap_or_else(|| self.fallback_dir.join(pose.default_file()))
    }

    pub fn rotation_degrees(&self) -> i32 {
        self.current()
            .map_or(DEFAULT_ROTATION, |skin| skin.rotation_degrees)
    }
}

/// `Ok(None)` when the directory has no metadata or fails validation.
fn read_skin(id: &str, dir: &Path) -> Result<Option<SkinInfo>> {
    let meta_path = dir.join(METADATA_FILE);
    if !meta_path.exists() {
        log::warn!("Skin metadata not found: {}", meta_path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(&meta_path).map_err(|e| Error::io(&meta_path, e))?;
    let meta: Metadata = serde_json::from_str(&text).map_err(|source| Error::Json {
        path: meta_path.clone(),
        source,
    })?;

    let info = SkinInfo::from_metadata(id, dir.to_path_buf(), meta);
    match info.validate() {
        Ok(()) => Ok(Some(info)),
        Err(reason) => {
            log::warn!("Skin validation failed: {id} ({reason})");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skin(root: &Path, id: &str, json: &str, files: &[&str]) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(METADATA_FILE), json).unwrap();
        for f in files {
            fs::write(dir.join(f), b"png").unwrap();
        }
    }

    const ALL_FILES: &[&str] = &["cat-rest.png", "cat-left.png", "cat-right.png"];

    #[test]
    fn discovers_valid_skins_with_defaults() {
        let root = tempfile::tempdir().unwrap();
        write_skin(root.path(), "plain", "{}", ALL_FILES);
        write_skin(
            root.path(),
            "neon",
            r#"{"name": "Neon", "author": "Ana", "rotation_degrees": 0,
                "images": {"idle": "a.png", "left": "b.png", "right": "c.png"}}"#,
            &["a.png", "b.png", "c.png"],
        );

        let skins = SkinManager::discover(root.path(), PathBuf::from("img"));
        assert_eq!(skins.ids().collect::<Vec<_>>(), ["neon", "plain"]);

        let plain = skins.get("plain").unwrap();
        assert_eq!(plain.name, "plain");
        assert_eq!(plain.author, "Unknown");
        assert_eq!(plain.version, "1.0.0");
        assert_eq!(plain.rotation_degrees, -13);
        assert_eq!(skins.get("neon").unwrap().rotation_degrees, 0);
    }

    #[test]
    fn invalid_skins_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        write_skin(root.path(), "no_right", "{}", &["cat-rest.png", "cat-left.png"]);
        write_skin(
            root.path(),
            "missing_key",
            r#"{"images": {"idle": "cat-rest.png", "left": "cat-left.png"}}"#,
            ALL_FILES,
        );
        write_skin(root.path(), "broken_json", "{ nope", ALL_FILES);
        fs::create_dir_all(root.path().join("no_metadata")).unwrap();

        let skins = SkinManager::discover(root.path(), PathBuf::from("img"));
        assert_eq!(skins.ids().count(), 0);
    }

    #[test]
    fn missing_skins_dir_falls_back_to_builtin() {
        let root = tempfile::tempdir().unwrap();
        let mut skins = SkinManager::discover(&root.path().join("skins"), PathBuf::from("img"));

        assert!(matches!(skins.load_skin("neon"), Err(Error::SkinNotFound(_))));
        skins.load_or_fallback("neon");
        assert_eq!(skins.current_skin_id(), "default");
        assert_eq!(skins.rotation_degrees(), -13);
        assert_eq!(skins.image_path(Pose::Left), PathBuf::from("img/cat-left.png"));
    }

    #[test]
    fn loaded_skin_provides_images() {
        let root = tempfile::tempdir().unwrap();
        write_skin(root.path(), "tabby", r#"{"rotation_degrees": 5}"#, ALL_FILES);

        let mut skins = SkinManager::discover(root.path(), PathBuf::from("img"));
        skins.load_skin("tabby").unwrap();
        assert_eq!(skins.current_skin_id(), "tabby");
        assert_eq!(skins.rotation_degrees(), 5);
        assert_eq!(
            skins.image_path(Pose::Idle),
            root.path().join("tabby").join("cat-rest.png")
        );
    }
}
