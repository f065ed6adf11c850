//! Mouse polling for surfaces that never receive input messages.
//!
//! Once reparented behind the icons the surface gets no mouse messages, so
//! buttons are polled once per frame and cursor positions are translated
//! into surface-local coordinates.

use serde::Serialize;

use crate::geometry::{DesktopOrigin, MonitorRegion};

pub const MOUSE_BUTTON_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    pub const ALL: [MouseButton; MOUSE_BUTTON_COUNT] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::X1,
        MouseButton::X2,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Out-of-range indices map to `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Raw pointer state from the OS.
pub trait PointerSource {
    fn is_button_down(&self, button: MouseButton) -> bool;

    /// Cursor position in raw screen coordinates.
    fn cursor_position(&self) -> Option<(i32, i32)>;
}

/// Previous and current button snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    previous: [bool; MOUSE_BUTTON_COUNT],
    current: [bool; MOUSE_BUTTON_COUNT],
}

impl MouseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per frame.
    pub fn update<P: PointerSource + ?Sized>(&mut self, source: &P) {
        self.previous = self.current;
        for button in MouseButton::ALL {
            self.current[button.index()] = source.is_button_down(button);
        }
    }

    /// Down this frame, up the previous one.
    pub fn is_pressed(&self, button: MouseButton) -> bool {
        let i = button.index();
        self.current[i] && !self.previous[i]
    }

    pub fn is_down(&self, button: MouseButton) -> bool {
        self.current[button.index()]
    }

    /// Up this frame, down the previous one.
    pub fn is_released(&self, button: MouseButton) -> bool {
        let i = button.index();
        !self.current[i] && self.previous[i]
    }

    pub fn is_up(&self, button: MouseButton) -> bool {
        !self.current[button.index()]
    }
}

/// Converts raw screen positions to coordinates local to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorTranslator {
    origin: DesktopOrigin,
    selected: MonitorRegion,
}

impl CursorTranslator {
    pub fn new(origin: DesktopOrigin, selected: MonitorRegion) -> Self {
        Self { origin, selected }
    }

    pub fn to_surface(&self, raw_x: i32, raw_y: i32) -> (i32, i32) {
        let (x, y) = self.origin.normalize_point(raw_x, raw_y);
        (x - self.selected.left, y - self.selected.top)
    }

    /// Current cursor in surface coordinates, `None` when the OS refuses.
    pub fn cursor<P: PointerSource + ?Sized>(&self, source: &P) -> Option<(i32, i32)> {
        source
            .cursor_position()
            .map(|(x, y)| self.to_surface(x, y))
    }
}
