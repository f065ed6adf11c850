//! Handles, rectangles and the normalized virtual-desktop coordinate space.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw native window handle, stored as an integer so it can cross the
/// platform boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `None` for the null handle.
    pub fn non_null(self) -> Option<WindowHandle> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Edge-based rectangle; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Overlap of both rectangles, `None` when they do not share any pixel.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let overlap = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if overlap.is_empty() {
            None
        } else {
            Some(overlap)
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// A display (or the whole desktop) in normalized virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRegion {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl MonitorRegion {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left.saturating_add(self.width),
            self.top.saturating_add(self.height),
        )
    }

    /// Zero or negative extent; can happen for the whole-desktop fallback
    /// when the OS reports no displays.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl fmt::Display for MonitorRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Offset subtracted from raw display coordinates: the minimum left and top
/// across every display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopOrigin {
    pub x: i32,
    pub y: i32,
}

impl DesktopOrigin {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn normalize_rect(&self, raw: &Rect) -> Rect {
        raw.offset(-self.x, -self.y)
    }

    pub fn normalize_point(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.x, y - self.y)
    }
}
