use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWINDOWATTRIBUTE};
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowLongPtrW, SetWindowLongPtrW, SetWindowPos, GWL_EXSTYLE, SWP_FRAMECHANGED,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, WS_EX_APPWINDOW, WS_EX_TOOLWINDOW,
};

const WS_EX_LAYERED: isize = 0x0008_0000;
const WS_EX_NOREDIRECTIONBITMAP: isize = 0x0020_0000;

// DWMWINDOWATTRIBUTE values and their settings.
const DWMWA_NCRENDERING_POLICY: i32 = 2;
const DWMNCRP_DISABLED: u32 = 2;
const DWMWA_WINDOW_CORNER_PREFERENCE: i32 = 33;
const DWMWCP_DONOTROUND: u32 = 1;
const DWMWA_BORDER_COLOR: i32 = 34;
const DWMWA_COLOR_NONE: u32 = 0xFFFF_FFFE;
const DWMWA_SYSTEMBACKDROP_TYPE: i32 = 38;
const DWMSBT_NONE: u32 = 1;

/// The Win32 handle behind a winit window, if it has one.
pub fn hwnd(window: &winit::window::Window) -> Option<HWND> {
    let handle = window.window_handle().ok()?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Some(HWND(h.hwnd.get() as *mut core::ffi::c_void)),
        _ => None,
    }
}

unsafe fn set_dwm_u32(hwnd: HWND, attribute: i32, value: u32) {
    let _ = DwmSetWindowAttribute(
        hwnd,
        DWMWINDOWATTRIBUTE(attribute),
        &value as *const u32 as *const core::ffi::c_void,
        std::mem::size_of::<u32>() as u32,
    );
}

/// Restyle the window as a borderless pet: no taskbar button, no GDI
/// redirection surface, no DWM frame, corners or backdrop.
///
/// Unlike a click-through overlay the window keeps hit-testing so it can be
/// dragged and its footer clicked.
pub unsafe fn make_pet_window(hwnd: HWND) {
    let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);

    // Pixels come from the DirectComposition visual wgpu creates, so the
    // layered/redirected surfaces must go.
    let new_style = (style & !WS_EX_LAYERED & !(WS_EX_APPWINDOW.0 as isize))
        | WS_EX_TOOLWINDOW.0 as isize
        | WS_EX_NOREDIRECTIONBITMAP;
    SetWindowLongPtrW(hwnd, GWL_EXSTYLE, new_style);
    log::debug!("Window ex-style 0x{style:08X} -> 0x{new_style:08X}");

    // DWM caches frame info; make it pick up the new styles.
    let _ = SetWindowPos(
        hwnd,
        HWND::default(),
        0,
        0,
        0,
        0,
        SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
    );

    set_dwm_u32(hwnd, DWMWA_NCRENDERING_POLICY, DWMNCRP_DISABLED);
    set_dwm_u32(hwnd, DWMWA_WINDOW_CORNER_PREFERENCE, DWMWCP_DONOTROUND);
    set_dwm_u32(hwnd, DWMWA_BORDER_COLOR, DWMWA_COLOR_NONE);
    set_dwm_u32(hwnd, DWMWA_SYSTEMBACKDROP_TYPE, DWMSBT_NONE);
}

pub fn setup_overlay(window: &winit::window::Window) {
    match hwnd(window) {
        Some(hwnd) => {
            unsafe { make_pet_window(hwnd) };
            log::info!("Win32 pet window styles applied");
        }
        None => log::warn!("No Win32 handle; window styles left as created"),
    }
}
