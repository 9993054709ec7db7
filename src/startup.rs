//! Launch-at-login registration.
//!
//! Windows uses the per-user `Run` registry key, Linux an XDG autostart
//! entry. Elsewhere the setting is stored but has no effect.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const APP_NAME: &str = "BongoCat";

fn current_exe() -> Result<PathBuf> {
    std::env::current_exe().map_err(|e| Error::Autostart(e.to_string()))
}

/// Register or unregister the running executable.
pub fn set_enabled(enabled: bool) -> Result<()> {
    let exe = current_exe()?;
    imp::set_enabled(enabled, &exe)?;
    log::info!(
        "Start with system {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Apply the setting, logging instead of failing.
pub fn apply(enabled: bool) {
    if let Err(e) = set_enabled(enabled) {
        log::error!("Could not update startup registration: {e}");
    }
}

#[cfg(windows)]
mod imp {
    use std::path::Path;

    use windows::core::{w, HSTRING, PCWSTR};
    use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER,
        KEY_SET_VALUE, REG_SZ,
    };

    use super::APP_NAME;
    use crate::error::{Error, Result};

    const RUN_KEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Run");

    pub fn set_enabled(enabled: bool, exe: &Path) -> Result<()> {
        let name = HSTRING::from(APP_NAME);
        unsafe {
            let mut key = HKEY::default();
            RegOpenKeyExW(HKEY_CURRENT_USER, RUN_KEY, 0, KEY_SET_VALUE, &mut key)
                .ok()
                .map_err(|e| Error::Autostart(e.to_string()))?;

            let result = if enabled {
                let command = format!("\"{}\"", exe.display());
                let bytes: Vec<u8> = command
                    .encode_utf16()
                    .chain(std::iter::once(0))
                    .flat_map(u16::to_le_bytes)
                    .collect();
                RegSetValueExW(key, &name, 0, REG_SZ, Some(&bytes)).ok()
            } else {
                let err = RegDeleteValueW(key, &name);
                if err == ERROR_FILE_NOT_FOUND {
                    Ok(())
                } else {
                    err.ok()
                }
            };
            let _ = RegCloseKey(key);
            result.map_err(|e| Error::Autostart(e.to_string()))
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
mod imp {
    use std::path::Path;

    use crate::error::{Error, Result};

    pub fn set_enabled(enabled: bool, exe: &Path) -> Result<()> {
        let dir = dirs::config_dir()
            .ok_or(Error::NoConfigDir)?
            .join("autostart");
        if enabled {
            super::write_entry(&dir, exe)
        } else {
            super::remove_entry(&dir)
        }
    }
}

#[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
mod imp {
    use std::path::Path;

    use crate::error::Result;

    pub fn set_enabled(_enabled: bool, _exe: &Path) -> Result<()> {
        log::warn!("Start with system is unsupported on this platform");
        Ok(())
    }
}

fn desktop_file(dir: &Path) -> PathBuf {
    dir.join(format!("{APP_NAME}.desktop"))
}

fn desktop_entry(exe: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Bongo Cat\n\
         Exec=\"{}\"\n\
         X-GNOME-Autostart-enabled=true\n",
        exe.display()
    )
}

#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
fn write_entry(dir: &Path, exe: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let path = desktop_file(dir);
    std::fs::write(&path, desktop_entry(exe)).map_err(|e| Error::io(&path, e))
}

#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
fn remove_entry(dir: &Path) -> Result<()> {
    let path = desktop_file(dir);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(&path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autostart_entry_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let autostart = dir.path().join("autostart");
        let exe = Path::new("/opt/bongo cat/bongocat");

        write_entry(&autostart, exe).unwrap();
        let text = std::fs::read_to_string(desktop_file(&autostart)).unwrap();
        assert!(text.starts_with("[Desktop Entry]\n"));
        assert!(text.contains("Exec=\"/opt/bongo cat/bongocat\"\n"));

        remove_entry(&autostart).unwrap();
        assert!(!desktop_file(&autostart).exists());
        // Removing twice is fine.
        remove_entry(&autostart).unwrap();
    }
}
