//! Win32 backend for every platform trait.
//!
//! All calls are synchronous and must come from the thread running the
//! host's message loop.

use std::ffi::c_void;
use std::mem::size_of;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{
    GetLastError, SetLastError, BOOL, COLORREF, ERROR_SUCCESS, HWND, LPARAM, MAX_PATH, POINT,
    RECT, WIN32_ERROR, WPARAM,
};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_CLOAKED};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, RedrawWindow, HDC, HMONITOR, HRGN, MONITORINFO,
    MONITORINFOF_PRIMARY, RDW_INVALIDATE, RDW_UPDATENOW,
};
use windows::Win32::System::StationsAndDesktops::{
    CloseDesktop, OpenInputDesktop, SwitchDesktop, DESKTOP_CONTROL_FLAGS, DESKTOP_SWITCHDESKTOP,
};
use windows::Win32::UI::HiDpi::{SetProcessDpiAwareness, PROCESS_PER_MONITOR_DPI_AWARE};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VIRTUAL_KEY, VK_LBUTTON, VK_MBUTTON, VK_RBUTTON, VK_XBUTTON1, VK_XBUTTON2,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, FindWindowExW, GetClassNameW, GetCursorPos, GetParent, GetShellWindow,
    GetSystemMetrics, GetWindowLongW, GetWindowRect, IsIconic, IsWindowVisible,
    SendMessageTimeoutW, SetLayeredWindowAttributes, SetParent, SetWindowLongW, SetWindowPos,
    ShowWindow, SystemParametersInfoW, GWL_EXSTYLE, GWL_STYLE, LWA_ALPHA, SMTO_NORMAL,
    SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SPIF_SENDCHANGE, SPIF_UPDATEINIFILE,
    SPI_GETDESKWALLPAPER, SPI_SETDESKWALLPAPER, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
    SWP_NOZORDER, SW_HIDE, SW_SHOWNA, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
    WINDOW_LONG_PTR_INDEX,
};

use crate::embed::SurfaceOps;
use crate::error::{LayerError, Result};
use crate::geometry::{MonitorRegion, Rect, WindowHandle};
use crate::hierarchy::WindowTree;
use crate::input::{MouseButton, PointerSource};
use crate::monitors::{DisplaySource, RawMonitor};
use crate::occlusion::{WindowDescriptor, WindowSource};
use crate::session::SessionState;
use crate::teardown::{WallpaperPath, WallpaperStore};

/// The live desktop of the current session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Desktop;

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(call: &'static str) -> LayerError {
    LayerError::os(call, windows::core::Error::from_win32())
}

// ============================================================================
// Enumeration callbacks
// ============================================================================

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let out = &mut *(lparam.0 as *mut Vec<HWND>);
    out.push(hwnd);
    BOOL(1)
}

unsafe extern "system" fn collect_monitor(
    monitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let out = &mut *(lparam.0 as *mut Vec<RawMonitor>);
    let mut info = MONITORINFO {
        cbSize: size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if GetMonitorInfoW(monitor, &mut info).as_bool() {
        let r = info.rcMonitor;
        out.push(RawMonitor {
            left: r.left,
            top: r.top,
            width: r.right - r.left,
            height: r.bottom - r.top,
            is_primary: info.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
    }
    BOOL(1)
}

fn enum_top_level() -> Vec<HWND> {
    let mut windows: Vec<HWND> = Vec::new();
    unsafe {
        if let Err(e) = EnumWindows(
            Some(collect_window),
            LPARAM(&mut windows as *mut Vec<HWND> as isize),
        ) {
            tracing::warn!("EnumWindows failed: {}", e);
        }
    }
    windows
}

unsafe fn is_cloaked(hwnd: HWND) -> bool {
    let mut cloaked: u32 = 0;
    DwmGetWindowAttribute(
        hwnd,
        DWMWA_CLOAKED,
        &mut cloaked as *mut u32 as *mut c_void,
        size_of::<u32>() as u32,
    )
    .map(|_| cloaked != 0)
    .unwrap_or(false)
}

unsafe fn describe(hwnd: HWND) -> WindowDescriptor {
    let mut class = [0u16; 256];
    let len = GetClassNameW(hwnd, &mut class).max(0) as usize;

    let mut rect = RECT::default();
    let rect = GetWindowRect(hwnd, &mut rect)
        .ok()
        .map(|_| Rect::new(rect.left, rect.top, rect.right, rect.bottom));

    WindowDescriptor {
        handle: handle(hwnd),
        class_name: String::from_utf16_lossy(&class[..len]),
        rect,
        visible: IsWindowVisible(hwnd).as_bool(),
        minimized: IsIconic(hwnd).as_bool(),
        cloaked: is_cloaked(hwnd),
    }
}

// ============================================================================
// Platform traits
// ============================================================================

impl DisplaySource for Win32Desktop {
    fn raw_monitors(&self) -> Vec<RawMonitor> {
        let mut monitors: Vec<RawMonitor> = Vec::new();
        unsafe {
            let ok = EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(collect_monitor),
                LPARAM(&mut monitors as *mut Vec<RawMonitor> as isize),
            );
            if !ok.as_bool() {
                tracing::warn!("EnumDisplayMonitors failed");
            }
        }
        monitors
    }

    fn virtual_desktop_size(&self) -> (i32, i32) {
        unsafe {
            (
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        }
    }

    fn enable_per_monitor_dpi(&self) -> Result<()> {
        unsafe { SetProcessDpiAwareness(PROCESS_PER_MONITOR_DPI_AWARE) }
            .map_err(|e| LayerError::os("SetProcessDpiAwareness", e))
    }
}

impl WindowTree for Win32Desktop {
    fn find_window(
        &self,
        parent: Option<WindowHandle>,
        after: Option<WindowHandle>,
        class: &str,
    ) -> Option<WindowHandle> {
        let class = wide(class);
        unsafe {
            FindWindowExW(
                hwnd(parent.unwrap_or_default()),
                hwnd(after.unwrap_or_default()),
                PCWSTR(class.as_ptr()),
                PCWSTR::null(),
            )
        }
        .ok()
        .map(handle)
        .and_then(WindowHandle::non_null)
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        enum_top_level().into_iter().map(handle).collect()
    }

    fn send_message_timeout(
        &self,
        target: WindowHandle,
        message: u32,
        wparam: usize,
        lparam: isize,
        timeout_ms: u32,
    ) -> Result<usize> {
        let mut result: usize = 0;
        let status = unsafe {
            SendMessageTimeoutW(
                hwnd(target),
                message,
                WPARAM(wparam),
                LPARAM(lparam),
                SMTO_NORMAL,
                timeout_ms,
                Some(&mut result as *mut usize),
            )
        };
        if status.0 == 0 {
            return Err(LayerError::Timeout {
                message,
                timeout_ms,
            });
        }
        Ok(result)
    }
}

impl WindowSource for Win32Desktop {
    fn windows(&self) -> Box<dyn Iterator<Item = WindowDescriptor> + '_> {
        // Handles are snapshotted; per-window queries run as the caller iterates.
        Box::new(
            enum_top_level()
                .into_iter()
                .map(|h| unsafe { describe(h) }),
        )
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        handle(unsafe { GetShellWindow() }).non_null()
    }
}

unsafe fn set_long(window: WindowHandle, index: WINDOW_LONG_PTR_INDEX, value: u32) -> Result<()> {
    // Zero is also a valid previous value, so only the last error tells.
    SetLastError(WIN32_ERROR(0));
    if SetWindowLongW(hwnd(window), index, value as i32) == 0 && GetLastError() != ERROR_SUCCESS {
        return Err(last_error("SetWindowLongW"));
    }
    Ok(())
}

impl SurfaceOps for Win32Desktop {
    fn style(&self, window: WindowHandle) -> Result<u32> {
        Ok(unsafe { GetWindowLongW(hwnd(window), GWL_STYLE) } as u32)
    }

    fn set_style(&self, window: WindowHandle, style: u32) -> Result<()> {
        unsafe { set_long(window, GWL_STYLE, style) }
    }

    fn ex_style(&self, window: WindowHandle) -> Result<u32> {
        Ok(unsafe { GetWindowLongW(hwnd(window), GWL_EXSTYLE) } as u32)
    }

    fn set_ex_style(&self, window: WindowHandle, ex_style: u32) -> Result<()> {
        unsafe { set_long(window, GWL_EXSTYLE, ex_style) }
    }

    fn set_opacity(&self, window: WindowHandle, alpha: u8) -> Result<()> {
        unsafe { SetLayeredWindowAttributes(hwnd(window), COLORREF(0), alpha, LWA_ALPHA) }
            .map_err(|e| LayerError::os("SetLayeredWindowAttributes", e))
    }

    fn parent(&self, window: WindowHandle) -> Option<WindowHandle> {
        unsafe { GetParent(hwnd(window)) }
            .ok()
            .map(handle)
            .and_then(WindowHandle::non_null)
    }

    fn set_parent(&self, window: WindowHandle, parent: WindowHandle) -> Result<()> {
        unsafe { SetParent(hwnd(window), hwnd(parent)) }
            .map(|_| ())
            .map_err(|e| LayerError::os("SetParent", e))
    }

    fn place_below(&self, window: WindowHandle, insert_after: WindowHandle) -> Result<()> {
        unsafe {
            SetWindowPos(
                hwnd(window),
                hwnd(insert_after),
                0,
                0,
                0,
                0,
                SWP_NOACTIVATE | SWP_NOMOVE | SWP_NOSIZE,
            )
        }
        .map_err(|e| LayerError::os("SetWindowPos", e))
    }

    fn set_bounds(&self, window: WindowHandle, region: &MonitorRegion) -> Result<()> {
        unsafe {
            SetWindowPos(
                hwnd(window),
                HWND::default(),
                region.left,
                region.top,
                region.width,
                region.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| LayerError::os("SetWindowPos", e))
    }

    fn set_visible(&self, window: WindowHandle, visible: bool) -> Result<()> {
        // The return value is the previous visibility, not a status.
        unsafe {
            let _ = ShowWindow(hwnd(window), if visible { SW_SHOWNA } else { SW_HIDE });
        }
        Ok(())
    }

    fn redraw(&self, window: WindowHandle) -> Result<()> {
        let ok = unsafe {
            RedrawWindow(
                hwnd(window),
                None,
                HRGN::default(),
                RDW_INVALIDATE | RDW_UPDATENOW,
            )
        };
        if ok.as_bool() {
            Ok(())
        } else {
            Err(last_error("RedrawWindow"))
        }
    }
}

impl WallpaperStore for Win32Desktop {
    fn current_wallpaper(&self) -> Result<WallpaperPath> {
        let mut buffer = [0u16; MAX_PATH as usize];
        unsafe {
            SystemParametersInfoW(
                SPI_GETDESKWALLPAPER,
                MAX_PATH,
                Some(buffer.as_mut_ptr() as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        }
        .map_err(|e| LayerError::os("SystemParametersInfoW(SPI_GETDESKWALLPAPER)", e))?;

        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Ok(WallpaperPath(buffer[..len].to_vec()))
    }

    fn apply_wallpaper(&self, path: &WallpaperPath) -> Result<()> {
        let mut terminated = path.0.clone();
        terminated.push(0);
        unsafe {
            SystemParametersInfoW(
                SPI_SETDESKWALLPAPER,
                0,
                Some(terminated.as_mut_ptr() as *mut c_void),
                SPIF_UPDATEINIFILE | SPIF_SENDCHANGE,
            )
        }
        .map_err(|e| LayerError::os("SystemParametersInfoW(SPI_SETDESKWALLPAPER)", e))
    }
}

fn virtual_key(button: MouseButton) -> VIRTUAL_KEY {
    match button {
        MouseButton::Left => VK_LBUTTON,
        MouseButton::Right => VK_RBUTTON,
        MouseButton::Middle => VK_MBUTTON,
        MouseButton::X1 => VK_XBUTTON1,
        MouseButton::X2 => VK_XBUTTON2,
    }
}

impl PointerSource for Win32Desktop {
    fn is_button_down(&self, button: MouseButton) -> bool {
        let state = unsafe { GetAsyncKeyState(virtual_key(button).0 as i32) };
        (state as u16 & 0x8000) != 0
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .ok()
            .map(|_| (point.x, point.y))
    }
}

impl SessionState for Win32Desktop {
    fn is_desktop_locked(&self) -> bool {
        // The input desktop can only be switched to while it is the user's
        // default desktop; the lock screen runs on the secure desktop.
        unsafe {
            match OpenInputDesktop(DESKTOP_CONTROL_FLAGS(0), BOOL(0), DESKTOP_SWITCHDESKTOP) {
                Ok(desktop) => {
                    let switched = SwitchDesktop(desktop).is_ok();
                    let _ = CloseDesktop(desktop);
                    !switched
                }
                Err(_) => true,
            }
        }
    }
}
