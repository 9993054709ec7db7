//! OS-specific window setup and shell integration.

#[cfg(windows)]
pub mod win32;

use std::io;
use std::path::Path;

use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::window::{Window, WindowAttributes, WindowLevel};

use crate::error::{Error, Result};

pub const WINDOW_TITLE: &str = "Bongo Cat";

/// Attributes for the borderless, always-on-top pet window.
///
/// The window starts hidden; call [`setup_overlay`] and show it once the GPU
/// surface exists.
pub fn window_attributes(size: LogicalSize<f64>) -> WindowAttributes {
    let attrs = Window::default_attributes()
        .with_title(WINDOW_TITLE)
        .with_decorations(false)
        .with_resizable(false)
        .with_visible(false)
        .with_window_level(WindowLevel::AlwaysOnTop)
        .with_inner_size(size);

    // On Windows transparency comes from DirectComposition; `with_transparent`
    // would add WS_EX_LAYERED and fight it.
    #[cfg(not(windows))]
    let attrs = attrs.with_transparent(true);

    attrs
}

pub fn setup_overlay(window: &Window) {
    #[cfg(windows)]
    win32::setup_overlay(window);

    #[cfg(not(windows))]
    {
        let _ = window;
        log::debug!("No extra window styling on this platform");
    }
}

/// Top-left corner that centres a `window` on a monitor.
pub fn centred(
    monitor_pos: PhysicalPosition<i32>,
    monitor_size: PhysicalSize<u32>,
    window: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let offset = |screen: u32, win: u32| (screen as i32 - win as i32) / 2;
    PhysicalPosition::new(
        monitor_pos.x + offset(monitor_size.width, window.width),
        monitor_pos.y + offset(monitor_size.height, window.height),
    )
}

/// Open `path` with the user's default application.
pub fn open_in_editor(path: &Path) -> Result<()> {
    log::info!("Opening {}", path.display());
    let opened = if path.exists() {
        open::that(path)
    } else {
        Err(io::Error::new(io::ErrorKind::NotFound, "file does not exist"))
    };
    opened.map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}
