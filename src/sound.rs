//! Sound effects for slaps, combo milestones and achievements.
//!
//! Clips are read once into memory and decoded per playback. Every failure
//! here (no device, missing file, undecodable clip) just leaves that sound
//! silent.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::combo::THRESHOLD_ORANGE;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Slap,
    SlapAlt,
    Combo,
    ComboHigh,
    Achievement,
}

impl Clip {
    pub const ALL: [Clip; 5] = [
        Clip::Slap,
        Clip::SlapAlt,
        Clip::Combo,
        Clip::ComboHigh,
        Clip::Achievement,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Clip::Slap => "slap.wav",
            Clip::SlapAlt => "slap_alt.wav",
            Clip::Combo => "combo.wav",
            Clip::ComboHigh => "combo_high.wav",
            Clip::Achievement => "achievement.wav",
        }
    }
}

/// Raw WAV bytes keyed by clip.
#[derive(Default)]
pub struct ClipLibrary {
    clips: HashMap<Clip, Arc<[u8]>>,
}

impl ClipLibrary {
    /// Read every clip present in `dir`. Missing files are skipped.
    pub fn load(dir: &Path) -> Self {
        let mut clips = HashMap::new();
        if !dir.is_dir() {
            log::info!("No sounds directory at {}", dir.display());
            return Self { clips };
        }
        for clip in Clip::ALL {
            let path = dir.join(clip.file_name());
            if !path.exists() {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => {
                    log::info!("Loaded sound: {:?}", clip);
                    clips.insert(clip, Arc::from(bytes));
                }
                Err(e) => log::error!("{}", Error::io(&path, e)),
            }
        }
        Self { clips }
    }

    pub fn contains(&self, clip: Clip) -> bool {
        self.clips.contains_key(&clip)
    }

    pub fn get(&self, clip: Clip) -> Option<Arc<[u8]>> {
        self.clips.get(&clip).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Slap clip to use, falling back to the primary one.
    pub fn slap_clip(&self, alternate: bool) -> Clip {
        if alternate && self.contains(Clip::SlapAlt) {
            Clip::SlapAlt
        } else {
            Clip::Slap
        }
    }

    /// Milestone clip for a combo of `count`; the high variant once the
    /// combo turns orange.
    pub fn combo_clip(&self, count: u32) -> Option<Clip> {
        if count >= THRESHOLD_ORANGE && self.contains(Clip::ComboHigh) {
            Some(Clip::ComboHigh)
        } else if self.contains(Clip::Combo) {
            Some(Clip::Combo)
        } else {
            None
        }
    }
}

struct Output {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

pub struct SoundManager {
    output: Option<Output>,
    library: ClipLibrary,
    playing: Vec<Sink>,
    enabled: bool,
    volume: f32,
}

impl SoundManager {
    /// Open the default output device and load clips from `dir`.
    ///
    /// `volume` is a percentage.
    pub fn new(dir: &Path, enabled: bool, volume: u8) -> Self {
        let output = match open_output() {
            Ok(output) => {
                log::info!("Sound output initialized");
                Some(output)
            }
            Err(e) => {
                log::warn!("{e}; sound effects disabled");
                None
            }
        };
        let library = if output.is_some() {
            ClipLibrary::load(dir)
        } else {
            ClipLibrary::default()
        };

        Self {
            output,
            library,
            playing: Vec::new(),
            enabled,
            volume: volume_scale(volume),
        }
    }

    /// A manager with no device, used when sound is unavailable.
    pub fn silent() -> Self {
        Self {
            output: None,
            library: ClipLibrary::default(),
            playing: Vec::new(),
            enabled: false,
            volume: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.output.is_some()
    }

    pub fn play(&mut self, clip: Clip) {
        if !self.enabled {
            return;
        }
        let (Some(output), Some(bytes)) = (&self.output, self.library.get(clip)) else {
            return;
        };
        match start(&output.handle, bytes, self.volume) {
            Ok(sink) => {
                self.playing.retain(|s| !s.empty());
                self.playing.push(sink);
            }
            Err(e) => log::error!("Failed to play {clip:?}: {e}"),
        }
    }

    pub fn play_slap(&mut self, alternate: bool) {
        self.play(self.library.slap_clip(alternate));
    }

    pub fn play_combo(&mut self, count: u32) {
        if let Some(clip) = self.library.combo_clip(count) {
            self.play(clip);
        }
    }

    pub fn play_achievement(&mut self) {
        self.play(Clip::Achievement);
    }

    /// Master volume as a percentage. Applies to sounds already playing.
    pub fn set_volume(&mut self, percent: u8) {
        self.volume = volume_scale(percent);
        for sink in &self.playing {
            sink.set_volume(self.volume);
        }
        log::info!("Volume set to {:.2}", self.volume);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop_all();
        }
        log::info!("Sounds {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn stop_all(&mut self) {
        for sink in self.playing.drain(..) {
            sink.stop();
        }
    }
}

fn open_output() -> Result<Output> {
    let (stream, handle) =
        OutputStream::try_default().map_err(|e| Error::Audio(e.to_string()))?;
    Ok(Output {
        _stream: stream,
        handle,
    })
}

fn start(handle: &OutputStreamHandle, bytes: Arc<[u8]>, volume: f32) -> Result<Sink> {
    let sink = Sink::try_new(handle).map_err(|e| Error::Audio(e.to_string()))?;
    let source = Decoder::new(Cursor::new(bytes)).map_err(|e| Error::Audio(e.to_string()))?;
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}

fn volume_scale(percent: u8) -> f32 {
    percent.min(100) as f32 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), b"RIFF").unwrap();
        }
        dir
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = dir_with(&["slap.wav", "achievement.wav"]);
        let lib = ClipLibrary::load(dir.path());
        assert_eq!(lib.len(), 2);
        assert!(lib.contains(Clip::Slap));
        assert!(!lib.contains(Clip::Combo));
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ClipLibrary::load(&dir.path().join("nope"));
        assert_eq!(lib.len(), 0);
    }

    #[test]
    fn alternate_slap_falls_back() {
        let only_primary = ClipLibrary::load(dir_with(&["slap.wav"]).path());
        assert_eq!(only_primary.slap_clip(true), Clip::Slap);

        let both = ClipLibrary::load(dir_with(&["slap.wav", "slap_alt.wav"]).path());
        assert_eq!(both.slap_clip(true), Clip::SlapAlt);
        assert_eq!(both.slap_clip(false), Clip::Slap);
    }

    #[test]
    fn combo_clip_switches_at_thirty() {
        let lib = ClipLibrary::load(dir_with(&["combo.wav", "combo_high.wav"]).path());
        assert_eq!(lib.combo_clip(29), Some(Clip::Combo));
        assert_eq!(lib.combo_clip(30), Some(Clip::ComboHigh));

        let low_only = ClipLibrary::load(dir_with(&["combo.wav"]).path());
        assert_eq!(low_only.combo_clip(90), Some(Clip::Combo));

        let none = ClipLibrary::load(dir_with(&[]).path());
        assert_eq!(none.combo_clip(10), None);
    }

    #[test]
    fn silent_manager_ignores_playback() {
        let mut sound = SoundManager::silent();
        sound.set_enabled(true);
        sound.play_slap(false);
        sound.play_combo(40);
        sound.play_achievement();
        sound.set_volume(250);
        assert!(!sound.is_enabled());
        assert_eq!(sound.volume, 1.0);
    }
}
