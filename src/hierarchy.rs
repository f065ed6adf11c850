//! Desktop window hierarchy discovery.
//!
//! Two shell layouts exist in the wild:
//! - nested (Windows 11 24H2+): the icons view and the background window are
//!   both children of the desktop owner;
//! - sibling (older builds): the icons view lives in its own top-level
//!   window and the background window is the next top-level window after it.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::shell::{
    BACKGROUND_CLASS, DESKTOP_OWNER_CLASS, ICONS_VIEW_CLASS, ICON_LIST_CLASS,
    SPAWN_BACKGROUND_MESSAGE,
};
use crate::error::{LayerError, Result};
use crate::geometry::WindowHandle;

/// Read access to the OS window tree.
pub trait WindowTree {
    /// First window of class `class` among the children of `parent` (top-level
    /// windows when `parent` is `None`), searching after `after` when given.
    fn find_window(
        &self,
        parent: Option<WindowHandle>,
        after: Option<WindowHandle>,
        class: &str,
    ) -> Option<WindowHandle>;

    /// Top-level windows in z-order.
    fn top_level_windows(&self) -> Vec<WindowHandle>;

    /// Synchronous message bounded by `timeout_ms`.
    fn send_message_timeout(
        &self,
        target: WindowHandle,
        message: u32,
        wparam: usize,
        lparam: isize,
        timeout_ms: u32,
    ) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLayout {
    Nested,
    Sibling,
}

/// References into the shell's window tree. Borrowed from the OS, never owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HierarchyHandles {
    pub desktop_owner: Option<WindowHandle>,
    pub background: WindowHandle,
    pub icons_view: Option<WindowHandle>,
    /// The icons view is a direct child of the desktop owner.
    pub icons_view_in_owner: bool,
    pub icon_list: Option<WindowHandle>,
    pub layout: HierarchyLayout,
}

impl HierarchyHandles {
    /// Icons view usable as a z-order reference for children of the desktop
    /// owner: only when it is their sibling, whichever layout found the
    /// background window.
    pub fn z_order_anchor(&self) -> Option<WindowHandle> {
        self.icons_view.filter(|_| self.icons_view_in_owner)
    }
}

/// Timing knobs for [`locate`].
#[derive(Debug, Clone, Copy)]
pub struct Discovery {
    pub spawn_timeout_ms: u32,
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        use crate::config::discovery::*;
        Self {
            spawn_timeout_ms: SPAWN_TIMEOUT_MS,
            attempts: DEFAULT_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

/// Find the desktop owner, make it spawn the background window, then resolve
/// the background window through the nested layout or the sibling fallback.
pub fn locate<T: WindowTree + ?Sized>(tree: &T, discovery: &Discovery) -> Result<HierarchyHandles> {
    let desktop_owner = tree.find_window(None, None, DESKTOP_OWNER_CLASS);
    match desktop_owner {
        Some(owner) => request_background(tree, owner, discovery.spawn_timeout_ms),
        None => warn!("{} window not found, trying sibling layout only", DESKTOP_OWNER_CLASS),
    }

    let attempts = discovery.attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(handles) = resolve(tree, desktop_owner) {
            info!(
                "Desktop hierarchy resolved ({:?} layout): owner={:?} background={} icons={:?}",
                handles.layout, handles.desktop_owner, handles.background, handles.icons_view
            );
            return Ok(handles);
        }
        if attempt < attempts {
            debug!("Hierarchy lookup {}/{} found nothing, retrying", attempt, attempts);
            std::thread::sleep(discovery.interval);
        }
    }

    Err(LayerError::HierarchyNotFound)
}

/// Ask the desktop owner to create the background window. A timeout is not
/// fatal: the window may survive from an earlier session.
fn request_background<T: WindowTree + ?Sized>(tree: &T, owner: WindowHandle, timeout_ms: u32) {
    match tree.send_message_timeout(owner, SPAWN_BACKGROUND_MESSAGE, 0, 0, timeout_ms) {
        Ok(_) => debug!("Spawn request acknowledged by {}", owner),
        Err(e) => warn!("Spawn request to {} failed, continuing: {}", owner, e),
    }
}

fn resolve<T: WindowTree + ?Sized>(
    tree: &T,
    desktop_owner: Option<WindowHandle>,
) -> Option<HierarchyHandles> {
    let owned_icons_view =
        desktop_owner.and_then(|owner| tree.find_window(Some(owner), None, ICONS_VIEW_CLASS));
    let icon_list_of = |view: WindowHandle| tree.find_window(Some(view), None, ICON_LIST_CLASS);

    if let Some(owner) = desktop_owner {
        if let Some(background) = tree.find_window(Some(owner), None, BACKGROUND_CLASS) {
            return Some(HierarchyHandles {
                desktop_owner,
                background,
                icons_view: owned_icons_view,
                icons_view_in_owner: owned_icons_view.is_some(),
                icon_list: owned_icons_view.and_then(icon_list_of),
                layout: HierarchyLayout::Nested,
            });
        }
    }

    // The icons view may still live under the owner while the background
    // window is a top-level sibling; that handle wins as the z-order anchor.
    let (hosted_icons_view, background) = find_sibling_background(tree)?;
    let icons_view = owned_icons_view.unwrap_or(hosted_icons_view);
    Some(HierarchyHandles {
        desktop_owner,
        background,
        icons_view: Some(icons_view),
        icons_view_in_owner: owned_icons_view.is_some(),
        icon_list: icon_list_of(icons_view),
        layout: HierarchyLayout::Sibling,
    })
}

/// Sibling layout: the first top-level window hosting the icons view decides
/// the outcome; the background window is the next top-level window of the
/// background class after it.
fn find_sibling_background<T: WindowTree + ?Sized>(tree: &T) -> Option<(WindowHandle, WindowHandle)> {
    tree.top_level_windows().into_iter().find_map(|host| {
        tree.find_window(Some(host), None, ICONS_VIEW_CLASS)
            .map(|view| (host, view))
    })
    .and_then(|(host, view)| {
        tree.find_window(None, Some(host), BACKGROUND_CLASS)
            .map(|background| (view, background))
    })
}
