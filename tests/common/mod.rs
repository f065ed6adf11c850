//! In-memory desktop used by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use desktop_layer_lib::config::shell::{
    BACKGROUND_CLASS, DESKTOP_OWNER_CLASS, ICONS_VIEW_CLASS, ICON_LIST_CLASS,
};
use desktop_layer_lib::embed::SurfaceOps;
use desktop_layer_lib::hierarchy::WindowTree;
use desktop_layer_lib::input::PointerSource;
use desktop_layer_lib::monitors::{DisplaySource, RawMonitor};
use desktop_layer_lib::occlusion::{WindowDescriptor, WindowSource};
use desktop_layer_lib::teardown::{WallpaperPath, WallpaperStore};
use desktop_layer_lib::{LayerError, MonitorRegion, MouseButton, Rect, Result, WindowHandle};

pub const OWNER: WindowHandle = WindowHandle(1);
pub const ICONS_HOST: WindowHandle = WindowHandle(5);
pub const ICONS_VIEW: WindowHandle = WindowHandle(10);
pub const ICON_LIST: WindowHandle = WindowHandle(11);
pub const BACKGROUND: WindowHandle = WindowHandle(20);
pub const SHELL: WindowHandle = WindowHandle(2);
pub const SURFACE: WindowHandle = WindowHandle(100);

struct Node {
    handle: WindowHandle,
    parent: Option<WindowHandle>,
    class: &'static str,
}

#[derive(Default)]
pub struct State {
    nodes: Vec<Node>,
    pub monitors: Vec<RawMonitor>,
    pub windows: RefCell<Vec<WindowDescriptor>>,
    pub shell: Option<WindowHandle>,
    pub dpi_fails: bool,
    pub bounds_fail: bool,
    pub spawn_requests: Cell<u32>,
    pub calls: RefCell<Vec<String>>,
    pub parents: RefCell<HashMap<WindowHandle, WindowHandle>>,
    pub bounds: RefCell<HashMap<WindowHandle, MonitorRegion>>,
    pub visible: RefCell<HashMap<WindowHandle, bool>>,
    pub wallpaper: Option<WallpaperPath>,
    pub applied: RefCell<Vec<WallpaperPath>>,
    pub pointer: Cell<(i32, i32)>,
    pub buttons: Cell<[bool; 5]>,
}

/// Cheap to clone: tests keep a handle to inspect state after the layer
/// has consumed its copy.
#[derive(Clone)]
pub struct FakeDesktop(pub Rc<State>);

impl FakeDesktop {
    pub fn state(&self) -> &State {
        &self.0
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.calls.borrow().clone()
    }

    pub fn add_window(&self, handle: isize, class: &str, rect: Rect) {
        self.0.windows.borrow_mut().push(WindowDescriptor {
            handle: WindowHandle(handle),
            class_name: class.to_string(),
            rect: Some(rect),
            visible: true,
            minimized: false,
            cloaked: false,
        });
    }

    fn record(&self, call: String) {
        self.0.calls.borrow_mut().push(call);
    }
}

pub struct Builder {
    state: State,
}

impl Builder {
    /// Windows 11 24H2 layout: icons view and background both under the owner.
    pub fn nested() -> Self {
        let mut builder = Builder {
            state: State::default(),
        };
        builder.node(OWNER, None, DESKTOP_OWNER_CLASS);
        builder.node(ICONS_VIEW, Some(OWNER), ICONS_VIEW_CLASS);
        builder.node(ICON_LIST, Some(ICONS_VIEW), ICON_LIST_CLASS);
        builder.node(BACKGROUND, Some(OWNER), BACKGROUND_CLASS);
        builder
    }

    /// Older layout: icons view in its own top-level host, background next.
    pub fn sibling() -> Self {
        let mut builder = Builder {
            state: State::default(),
        };
        builder.node(WindowHandle(30), None, "Notepad");
        builder.node(ICONS_HOST, None, BACKGROUND_CLASS);
        builder.node(ICONS_VIEW, Some(ICONS_HOST), ICONS_VIEW_CLASS);
        builder.node(ICON_LIST, Some(ICONS_VIEW), ICON_LIST_CLASS);
        builder.node(BACKGROUND, None, BACKGROUND_CLASS);
        builder.node(OWNER, None, DESKTOP_OWNER_CLASS);
        builder
    }

    /// Icons view still under the owner, background a top-level sibling.
    pub fn owner_icons() -> Self {
        let mut builder = Builder {
            state: State::default(),
        };
        builder.node(OWNER, None, DESKTOP_OWNER_CLASS);
        builder.node(ICONS_VIEW, Some(OWNER), ICONS_VIEW_CLASS);
        builder.node(ICON_LIST, Some(ICONS_VIEW), ICON_LIST_CLASS);
        builder.node(BACKGROUND, None, BACKGROUND_CLASS);
        builder
    }

    /// Legacy layout with no desktop owner window at all.
    pub fn no_owner() -> Self {
        let mut builder = Builder {
            state: State::default(),
        };
        builder.node(ICONS_HOST, None, BACKGROUND_CLASS);
        builder.node(ICONS_VIEW, Some(ICONS_HOST), ICONS_VIEW_CLASS);
        builder.node(BACKGROUND, None, BACKGROUND_CLASS);
        builder
    }

    /// Neither layout: the owner exists but nothing else.
    pub fn empty_shell() -> Self {
        let mut builder = Builder {
            state: State::default(),
        };
        builder.node(OWNER, None, DESKTOP_OWNER_CLASS);
        builder
    }

    fn node(&mut self, handle: WindowHandle, parent: Option<WindowHandle>, class: &'static str) {
        self.state.nodes.push(Node {
            handle,
            parent,
            class,
        });
    }

    pub fn monitor(mut self, left: i32, top: i32, width: i32, height: i32, primary: bool) -> Self {
        self.state.monitors.push(RawMonitor {
            left,
            top,
            width,
            height,
            is_primary: primary,
        });
        self
    }

    pub fn shell_window(mut self) -> Self {
        self.state.shell = Some(SHELL);
        self
    }

    pub fn bounds_fail(mut self) -> Self {
        self.state.bounds_fail = true;
        self
    }

    pub fn dpi_fails(mut self) -> Self {
        self.state.dpi_fails = true;
        self
    }

    pub fn wallpaper(mut self, path: &str) -> Self {
        self.state.wallpaper = Some(WallpaperPath(path.encode_utf16().collect()));
        self
    }

    pub fn build(self) -> FakeDesktop {
        FakeDesktop(Rc::new(self.state))
    }
}

impl DisplaySource for FakeDesktop {
    fn raw_monitors(&self) -> Vec<RawMonitor> {
        self.0.monitors.clone()
    }

    fn enable_per_monitor_dpi(&self) -> Result<()> {
        if self.0.dpi_fails {
            return Err(LayerError::os("SetProcessDpiAwareness", "access denied"));
        }
        Ok(())
    }
}

impl WindowTree for FakeDesktop {
    fn find_window(
        &self,
        parent: Option<WindowHandle>,
        after: Option<WindowHandle>,
        class: &str,
    ) -> Option<WindowHandle> {
        let mut siblings = self.0.nodes.iter().filter(|n| n.parent == parent);
        if let Some(after) = after {
            siblings.by_ref().find(|n| n.handle == after)?;
        }
        siblings.find(|n| n.class == class).map(|n| n.handle)
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        self.0
            .nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.handle)
            .collect()
    }

    fn send_message_timeout(
        &self,
        _target: WindowHandle,
        _message: u32,
        _wparam: usize,
        _lparam: isize,
        _timeout_ms: u32,
    ) -> Result<usize> {
        self.0.spawn_requests.set(self.0.spawn_requests.get() + 1);
        Ok(0)
    }
}

impl WindowSource for FakeDesktop {
    fn windows(&self) -> Box<dyn Iterator<Item = WindowDescriptor> + '_> {
        Box::new(self.0.windows.borrow().clone().into_iter())
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        self.0.shell
    }
}

impl SurfaceOps for FakeDesktop {
    fn style(&self, _window: WindowHandle) -> Result<u32> {
        Ok(0x8000_0000)
    }

    fn set_style(&self, window: WindowHandle, style: u32) -> Result<()> {
        self.record(format!("set_style {} {:#010x}", window.0, style));
        Ok(())
    }

    fn ex_style(&self, _window: WindowHandle) -> Result<u32> {
        Ok(0)
    }

    fn set_ex_style(&self, window: WindowHandle, ex_style: u32) -> Result<()> {
        self.record(format!("set_ex_style {} {:#010x}", window.0, ex_style));
        Ok(())
    }

    fn set_opacity(&self, window: WindowHandle, alpha: u8) -> Result<()> {
        self.record(format!("set_opacity {} {}", window.0, alpha));
        Ok(())
    }

    fn parent(&self, window: WindowHandle) -> Option<WindowHandle> {
        self.0.parents.borrow().get(&window).copied()
    }

    fn set_parent(&self, window: WindowHandle, parent: WindowHandle) -> Result<()> {
        self.record(format!("set_parent {} {}", window.0, parent.0));
        self.0.parents.borrow_mut().insert(window, parent);
        Ok(())
    }

    fn place_below(&self, window: WindowHandle, insert_after: WindowHandle) -> Result<()> {
        self.record(format!("place_below {} {}", window.0, insert_after.0));
        Ok(())
    }

    fn set_bounds(&self, window: WindowHandle, region: &MonitorRegion) -> Result<()> {
        self.record(format!("set_bounds {} {}", window.0, region));
        if self.0.bounds_fail {
            return Err(LayerError::os("SetWindowPos", "invalid window handle"));
        }
        self.0.bounds.borrow_mut().insert(window, *region);
        Ok(())
    }

    fn set_visible(&self, window: WindowHandle, visible: bool) -> Result<()> {
        self.record(format!("set_visible {} {}", window.0, visible));
        self.0.visible.borrow_mut().insert(window, visible);
        Ok(())
    }

    fn redraw(&self, window: WindowHandle) -> Result<()> {
        self.record(format!("redraw {}", window.0));
        Ok(())
    }
}

impl WallpaperStore for FakeDesktop {
    fn current_wallpaper(&self) -> Result<WallpaperPath> {
        self.0
            .wallpaper
            .clone()
            .ok_or_else(|| LayerError::os("SystemParametersInfoW", "no wallpaper key"))
    }

    fn apply_wallpaper(&self, path: &WallpaperPath) -> Result<()> {
        self.0.applied.borrow_mut().push(path.clone());
        Ok(())
    }
}

impl PointerSource for FakeDesktop {
    fn is_button_down(&self, button: MouseButton) -> bool {
        self.0.buttons.get()[button.index()]
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        Some(self.0.pointer.get())
    }
}
