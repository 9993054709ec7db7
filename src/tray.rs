//! Notification-area icon with the pet's menu.
//!
//! Windows talks to Shell_NotifyIconW directly through a hidden message
//! window. Elsewhere there is no tray and [`TrayIcon::new`] fails, leaving the
//! in-window context menu as the only menu.

#[cfg(windows)]
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use image::imageops::{self, FilterType};
use image::RgbaImage;
#[cfg(windows)]
use windows::core::PCWSTR;
#[cfg(windows)]
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
#[cfg(windows)]
use windows::Win32::Graphics::Gdi::{CreateBitmap, DeleteObject, HGDIOBJ};
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NIIF_INFO, NIM_ADD, NIM_DELETE,
    NIM_MODIFY, NOTIFYICONDATAW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreateIconIndirect, CreatePopupMenu, CreateWindowExW, DefWindowProcW,
    DestroyIcon, DestroyMenu, DestroyWindow, DispatchMessageW, GetCursorPos, LoadIconW,
    PeekMessageW, RegisterClassW, SetForegroundWindow, TrackPopupMenu, TranslateMessage, HICON,
    HMENU, ICONINFO, IDI_APPLICATION, MF_SEPARATOR, MF_STRING, PM_REMOVE, TPM_BOTTOMALIGN,
    TPM_LEFTALIGN, TPM_RETURNCMD, WM_USER, WNDCLASSW, WS_EX_TOOLWINDOW,
};

#[cfg(windows)]
use crate::error::{Error, Result};

pub const TOOLTIP: &str = "Bongo Cat";
pub const TOOLTIP_PAUSED: &str = "Bongo Cat (Paused)";
/// Edge of the square tray icon in pixels.
#[cfg_attr(not(windows), allow(dead_code))]
pub const ICON_SIZE: u32 = 32;

/// Commands produced by the tray and context menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    None,
    ToggleVisible,
    TogglePause,
    OpenSettings,
    ResetCount,
    Quit,
}

impl TrayCommand {
    #[cfg_attr(not(windows), allow(dead_code))]
    fn id(self) -> u16 {
        match self {
            TrayCommand::None => 0,
            TrayCommand::ToggleVisible => 1000,
            TrayCommand::TogglePause => 1001,
            TrayCommand::OpenSettings => 1002,
            TrayCommand::ResetCount => 1003,
            TrayCommand::Quit => 1004,
        }
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    fn from_id(id: u16) -> Self {
        [
            TrayCommand::ToggleVisible,
            TrayCommand::TogglePause,
            TrayCommand::OpenSettings,
            TrayCommand::ResetCount,
            TrayCommand::Quit,
        ]
        .into_iter()
        .find(|c| c.id() == id)
        .unwrap_or(TrayCommand::None)
    }
}

/// One row of the menu. `None` is a separator.
pub type MenuEntry = Option<(TrayCommand, &'static str)>;

/// Menu rows for the current window state. Shared by the tray and the
/// right-click menu.
pub fn menu_entries(visible: bool, paused: bool) -> [MenuEntry; 7] {
    [
        Some((TrayCommand::ToggleVisible, if visible { "Hide" } else { "Show" })),
        Some((TrayCommand::TogglePause, if paused { "Resume" } else { "Pause" })),
        None,
        Some((TrayCommand::OpenSettings, "Settings")),
        Some((TrayCommand::ResetCount, "Reset Count")),
        None,
        Some((TrayCommand::Quit, "Quit")),
    ]
}

/// The menu is built inside the window procedure, which has no access to
/// the icon; it reads the current state from here.
#[cfg(windows)]
static MENU_VISIBLE: AtomicBool = AtomicBool::new(true);
#[cfg(windows)]
static MENU_PAUSED: AtomicBool = AtomicBool::new(false);
#[cfg(windows)]
static PENDING: AtomicU16 = AtomicU16::new(0);

#[cfg(windows)]
const WM_TRAYICON: u32 = WM_USER + 1;
#[cfg(windows)]
const WM_LBUTTONUP: u32 = 0x0202;
#[cfg(windows)]
const WM_RBUTTONUP: u32 = 0x0205;

/// Fit `image` into a transparent `size`x`size` square and return its
/// pixels as top-down BGRA rows, the layout a 32-bit DIB expects.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn icon_bgra(image: &RgbaImage, size: u32) -> Vec<u8> {
    let (w, h) = image.dimensions();
    let scale = size as f32 / w.max(h).max(1) as f32;
    let fit_w = ((w as f32 * scale).round() as u32).clamp(1, size);
    let fit_h = ((h as f32 * scale).round() as u32).clamp(1, size);
    let scaled = imageops::resize(image, fit_w, fit_h, FilterType::Triangle);

    let mut canvas = RgbaImage::new(size, size);
    imageops::overlay(
        &mut canvas,
        &scaled,
        ((size - fit_w) / 2) as i64,
        ((size - fit_h) / 2) as i64,
    );
    canvas
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            [b, g, r, a]
        })
        .collect()
}

/// Copy `text` into a fixed, NUL-terminated UTF-16 field, truncating.
#[cfg_attr(not(windows), allow(dead_code))]
fn wide_field<const N: usize>(text: &str) -> [u16; N] {
    let mut field = [0u16; N];
    for (slot, ch) in field[..N.saturating_sub(1)]
        .iter_mut()
        .zip(text.encode_utf16())
    {
        *slot = ch;
    }
    field
}

pub struct TrayIcon {
    #[cfg(windows)]
    hwnd: HWND,
    #[cfg(windows)]
    nid: NOTIFYICONDATAW,
    /// Icon built from the cat sprite; destroyed with the tray.
    #[cfg(windows)]
    sprite_icon: Option<HICON>,
}

#[cfg(windows)]
impl TrayIcon {
    /// Add the tray icon, drawn from `sprite` when given.
    pub fn new(sprite: Option<&RgbaImage>) -> Result<Self> {
        unsafe {
            let class_name: Vec<u16> = "BongoCatTrayClass\0".encode_utf16().collect();
            let wc = WNDCLASSW {
                lpfnWndProc: Some(tray_wnd_proc),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc);

            let hwnd = CreateWindowExW(
                WS_EX_TOOLWINDOW,
                PCWSTR(class_name.as_ptr()),
                PCWSTR::null(),
                Default::default(),
                0,
                0,
                0,
                0,
                HWND::default(),
                HMENU::default(),
                HINSTANCE::default(),
                None,
            )
            .map_err(|e| Error::Tray(e.to_string()))?;

            let mut nid = NOTIFYICONDATAW {
                cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: hwnd,
                uID: 1,
                uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
                uCallbackMessage: WM_TRAYICON,
                ..Default::default()
            };
            let sprite_icon = sprite.and_then(|img| icon_from_image(img));
            nid.hIcon = match sprite_icon {
                Some(icon) => icon,
                None => LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
            };
            nid.szTip = wide_field(TOOLTIP);

            if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                if let Some(icon) = sprite_icon {
                    let _ = DestroyIcon(icon);
                }
                let _ = DestroyWindow(hwnd);
                return Err(Error::Tray("Shell_NotifyIconW(NIM_ADD) failed".into()));
            }
            log::info!("System tray icon created");

            Ok(Self {
                hwnd,
                nid,
                sprite_icon,
            })
        }
    }

    /// Redraw the icon from a new sprite, e.g. after a skin change.
    pub fn set_icon(&mut self, sprite: &RgbaImage) {
        unsafe {
            let Some(icon) = icon_from_image(sprite) else {
                return;
            };
            self.nid.hIcon = icon;
            let _ = Shell_NotifyIconW(NIM_MODIFY, &self.nid);
            if let Some(old) = self.sprite_icon.replace(icon) {
                let _ = DestroyIcon(old);
            }
        }
    }

    /// Pop a balloon notification from the icon.
    pub fn notify(&mut self, title: &str, body: &str) {
        let nid = balloon(&self.nid, title, body);
        unsafe {
            if !Shell_NotifyIconW(NIM_MODIFY, &nid).as_bool() {
                log::warn!("Tray notification failed");
            }
        }
    }

    /// Drain tray messages and return the last chosen command. Call once per
    /// frame.
    pub fn poll(&mut self) -> TrayCommand {
        unsafe {
            let mut msg = std::mem::zeroed();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        TrayCommand::from_id(PENDING.swap(0, Ordering::AcqRel))
    }

    /// Keep menu labels and the tooltip in sync with the window.
    pub fn set_state(&mut self, visible: bool, paused: bool) {
        MENU_VISIBLE.store(visible, Ordering::Release);
        let was_paused = MENU_PAUSED.swap(paused, Ordering::AcqRel);
        if was_paused != paused {
            self.nid.szTip = wide_field(if paused { TOOLTIP_PAUSED } else { TOOLTIP });
            unsafe {
                let _ = Shell_NotifyIconW(NIM_MODIFY, &self.nid);
            }
        }
    }

    pub fn remove(&mut self) {
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
            let _ = DestroyWindow(self.hwnd);
            if let Some(icon) = self.sprite_icon.take() {
                let _ = DestroyIcon(icon);
            }
        }
    }
}

#[cfg(windows)]
impl Drop for TrayIcon {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Copy of `base` that shows `title`/`body` as an info balloon.
#[cfg(windows)]
fn balloon(base: &NOTIFYICONDATAW, title: &str, body: &str) -> NOTIFYICONDATAW {
    let mut nid = base.clone();
    nid.uFlags |= NIF_INFO;
    nid.dwInfoFlags = NIIF_INFO;
    nid.szInfoTitle = wide_field(title);
    nid.szInfo = wide_field(body);
    nid
}

#[cfg(windows)]
unsafe fn icon_from_image(sprite: &RgbaImage) -> Option<HICON> {
    let side = ICON_SIZE as i32;
    let colour_bits = icon_bgra(sprite, ICON_SIZE);
    // All-zero AND mask: the colour bitmap's alpha decides transparency.
    let mask_bits = vec![0u8; (ICON_SIZE / 8 * ICON_SIZE) as usize];

    let colour = CreateBitmap(side, side, 1, 32, Some(colour_bits.as_ptr().cast()));
    let mask = CreateBitmap(side, side, 1, 1, Some(mask_bits.as_ptr().cast()));
    let info = ICONINFO {
        fIcon: true.into(),
        xHotspot: 0,
        yHotspot: 0,
        hbmMask: mask,
        hbmColor: colour,
    };
    let icon = CreateIconIndirect(&info);
    let _ = DeleteObject(HGDIOBJ(colour.0));
    let _ = DeleteObject(HGDIOBJ(mask.0));

    icon.map_err(|e| log::warn!("Could not build tray icon from sprite: {e}"))
        .ok()
}

#[cfg(windows)]
unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_TRAYICON {
        match (lparam.0 & 0xFFFF) as u32 {
            WM_LBUTTONUP => {
                PENDING.store(TrayCommand::ToggleVisible.id(), Ordering::Release);
                return LRESULT(0);
            }
            WM_RBUTTONUP => {
                let chosen = show_context_menu(hwnd);
                if chosen != 0 {
                    PENDING.store(chosen, Ordering::Release);
                }
                return LRESULT(0);
            }
            _ => {}
        }
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Show the menu at the cursor and block until it closes. Returns the chosen
/// command id, 0 when dismissed.
#[cfg(windows)]
unsafe fn show_context_menu(hwnd: HWND) -> u16 {
    let Ok(hmenu) = CreatePopupMenu() else {
        log::error!("Failed to create tray menu");
        return 0;
    };

    let entries = menu_entries(
        MENU_VISIBLE.load(Ordering::Acquire),
        MENU_PAUSED.load(Ordering::Acquire),
    );
    for entry in entries {
        match entry {
            Some((command, label)) => {
                let wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
                let _ = AppendMenuW(hmenu, MF_STRING, command.id() as usize, PCWSTR(wide.as_ptr()));
            }
            None => {
                let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, PCWSTR::null());
            }
        }
    }

    let mut pt = POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Required so the menu closes when clicking elsewhere.
    let _ = SetForegroundWindow(hwnd);

    let chosen = TrackPopupMenu(
        hmenu,
        TPM_LEFTALIGN | TPM_BOTTOMALIGN | TPM_RETURNCMD,
        pt.x,
        pt.y,
        0,
        hwnd,
        None,
    );
    let _ = DestroyMenu(hmenu);
    chosen.0 as u16
}

#[cfg(not(windows))]
impl TrayIcon {
    pub fn new(_sprite: Option<&RgbaImage>) -> crate::error::Result<Self> {
        Err(crate::error::Error::Tray(
            "no system tray support on this platform".into(),
        ))
    }

    pub fn poll(&mut self) -> TrayCommand {
        TrayCommand::None
    }

    pub fn set_state(&mut self, _visible: bool, _paused: bool) {}

    pub fn set_icon(&mut self, _sprite: &RgbaImage) {}

    pub fn notify(&mut self, _title: &str, _body: &str) {}
}
