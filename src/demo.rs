//! Demo host: a plain Win32 window embedded behind the desktop icons,
//! painted with GDI until the user right-clicks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    CreateSolidBrush, DeleteObject, FillRect, GetDC, ReleaseDC, HDC, HGDIOBJ,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect,
    PeekMessageW, RegisterClassW, TranslateMessage, HMENU, MSG, PM_REMOVE, WINDOW_EX_STYLE,
    WM_CLOSE, WM_ERASEBKGND, WM_QUIT, WNDCLASSW, WS_POPUP,
};

use crate::geometry::{MonitorRegion, WindowHandle};
use crate::input::{MouseButton, MouseState};
use crate::session::should_skip_frame;
use crate::settings::LayerSettings;
use crate::win32::Win32Desktop;
use crate::window_layer::WindowLayer;

const CLASS_NAME: PCWSTR = w!("DesktopLayerDemo");
const FRAME: Duration = Duration::from_millis(16);

const BACKGROUND: COLORREF = COLORREF(0x00F5F5F5);
const BALL: COLORREF = COLORREF(0x003729E6);
const CURSOR: COLORREF = COLORREF(0x00F17900);

static CLOSE_REQUESTED: AtomicBool = AtomicBool::new(false);

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CLOSE => {
            CLOSE_REQUESTED.store(true, Ordering::SeqCst);
            LRESULT(0)
        }
        // Every frame repaints the whole client area.
        WM_ERASEBKGND => LRESULT(1),
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// A square bouncing inside the surface.
struct Scene {
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    size: i32,
    width: i32,
    height: i32,
}

impl Scene {
    fn new(region: &MonitorRegion) -> Self {
        let size = (region.width.min(region.height) / 8).max(16);
        Self {
            x: region.width / 2,
            y: region.height / 2,
            dx: 4,
            dy: 5,
            size,
            width: region.width,
            height: region.height,
        }
    }

    fn step(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
        if self.x < 0 || self.x + self.size > self.width {
            self.dx = -self.dx;
        }
        if self.y < 0 || self.y + self.size > self.height {
            self.dy = -self.dy;
        }
    }

    fn rect(&self) -> RECT {
        RECT {
            left: self.x,
            top: self.y,
            right: self.x + self.size,
            bottom: self.y + self.size,
        }
    }
}

fn create_surface(region: &MonitorRegion) -> windows::core::Result<HWND> {
    unsafe {
        let instance = HINSTANCE(GetModuleHandleW(PCWSTR::null())?.0);
        let class = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        if RegisterClassW(&class) == 0 {
            return Err(windows::core::Error::from_win32());
        }
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            w!("Desktop Layer Demo"),
            WS_POPUP,
            region.left,
            region.top,
            region.width,
            region.height,
            HWND::default(),
            HMENU::default(),
            instance,
            None,
        )
    }
}

/// Drain the queue; true once WM_QUIT was seen.
fn pump_messages() -> bool {
    let mut quit = false;
    let mut msg = MSG::default();
    unsafe {
        while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
            if msg.message == WM_QUIT {
                quit = true;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    quit
}

unsafe fn fill(hdc: HDC, rect: &RECT, color: COLORREF) {
    let brush = CreateSolidBrush(color);
    FillRect(hdc, rect, brush);
    let _ = DeleteObject(HGDIOBJ(brush.0));
}

fn paint(window: HWND, scene: &Scene, cursor: Option<(i32, i32)>) {
    unsafe {
        let hdc = GetDC(window);
        if hdc.0.is_null() {
            return;
        }
        let mut client = RECT::default();
        if GetClientRect(window, &mut client).is_ok() {
            fill(hdc, &client, BACKGROUND);
        }
        fill(hdc, &scene.rect(), BALL);
        if let Some((x, y)) = cursor {
            let dot = RECT {
                left: x - 10,
                top: y - 10,
                right: x + 10,
                bottom: y + 10,
            };
            fill(hdc, &dot, CURSOR);
        }
        ReleaseDC(window, hdc);
    }
}

/// Embed, position and render until the user quits. The caller owns the
/// window and tears down whatever happens here.
fn present(
    layer: &mut WindowLayer<Win32Desktop>,
    hwnd: HWND,
    target: MonitorRegion,
) -> crate::error::Result<()> {
    let report = layer.attach(WindowHandle(hwnd.0 as isize), target)?;
    if !report.is_clean() {
        warn!("Surface embedded with {} failed steps", report.warnings.len());
    }

    let translator = layer.cursor_translator();
    let mut scene = Scene::new(&target);
    let mut mouse = MouseState::new();
    let mut occluded = false;

    loop {
        if pump_messages() || CLOSE_REQUESTED.load(Ordering::SeqCst) {
            return Ok(());
        }

        mouse.update(&Win32Desktop);
        if mouse.is_pressed(MouseButton::Right) {
            info!("Right click, exiting");
            return Ok(());
        }

        let now = layer.is_occluded_default(&target);
        if now != occluded {
            debug!("Surface occluded: {}", now);
            occluded = now;
        }

        if !should_skip_frame(&Win32Desktop, occluded) {
            scene.step();
            let cursor = translator
                .cursor(&Win32Desktop)
                .filter(|_| mouse.is_down(MouseButton::Left));
            paint(hwnd, &scene, cursor);
        }

        thread::sleep(FRAME);
    }
}

pub fn run(settings: LayerSettings) -> Result<(), Box<dyn std::error::Error>> {
    // Discovery must happen before our window exists.
    let mut layer = WindowLayer::initialize(Win32Desktop, settings)?;
    let target = layer.configured_target();
    info!("Target region {}", target);

    let hwnd = create_surface(&target)?;
    let outcome = present(&mut layer, hwnd, target);

    if let Err(e) = unsafe { DestroyWindow(hwnd) } {
        warn!("DestroyWindow failed: {}", e);
    }
    let restored = layer.teardown();
    outcome?;
    restored?;
    Ok(())
}
