//! Surface embedding: restyle, reparent and z-order a caller-owned window so
//! it renders behind the desktop icons and above the static wallpaper.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::shell::DESKTOP_OWNER_CLASS;
use crate::error::{LayerError, Result};
use crate::geometry::{MonitorRegion, WindowHandle};
use crate::hierarchy::HierarchyHandles;

/// Window style bits touched while embedding (winuser.h values).
pub mod style {
    pub const WS_OVERLAPPEDWINDOW: u32 = 0x00CF_0000;
    pub const WS_POPUP: u32 = 0x8000_0000;
    pub const WS_CHILD: u32 = 0x4000_0000;
    pub const WS_EX_LAYERED: u32 = 0x0008_0000;

    /// Decorations and popup bit removed, child bit added.
    pub fn child_style(style: u32) -> u32 {
        (style & !(WS_OVERLAPPEDWINDOW | WS_POPUP)) | WS_CHILD
    }

    pub fn layered_ex_style(ex_style: u32) -> u32 {
        ex_style | WS_EX_LAYERED
    }
}

/// Where the surface is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedStrategy {
    /// Child of the desktop owner, between the icons view and the background
    /// window. Needed on builds where the background window no longer
    /// repaints foreign children.
    #[default]
    DesktopOwner,
    /// Child of the background window (legacy).
    BackgroundWindow,
}

/// Mutating window operations. Every call reports its own outcome; callers
/// decide whether a failure matters.
pub trait SurfaceOps {
    fn style(&self, window: WindowHandle) -> Result<u32>;
    fn set_style(&self, window: WindowHandle, style: u32) -> Result<()>;
    fn ex_style(&self, window: WindowHandle) -> Result<u32>;
    fn set_ex_style(&self, window: WindowHandle, ex_style: u32) -> Result<()>;
    /// Constant alpha for a layered window.
    fn set_opacity(&self, window: WindowHandle, alpha: u8) -> Result<()>;
    fn parent(&self, window: WindowHandle) -> Option<WindowHandle>;
    fn set_parent(&self, window: WindowHandle, parent: WindowHandle) -> Result<()>;
    /// Move `window` directly below `insert_after` without moving or resizing it.
    fn place_below(&self, window: WindowHandle, insert_after: WindowHandle) -> Result<()>;
    /// Move and resize without touching z-order.
    fn set_bounds(&self, window: WindowHandle, region: &MonitorRegion) -> Result<()>;
    /// Show or hide without activating.
    fn set_visible(&self, window: WindowHandle, visible: bool) -> Result<()>;
    /// Invalidate and repaint immediately.
    fn redraw(&self, window: WindowHandle) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedStep {
    Style,
    Layered,
    Reparent,
    ZOrder,
    Show,
    Redraw,
}

impl fmt::Display for EmbedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmbedStep::Style => "style",
            EmbedStep::Layered => "layered",
            EmbedStep::Reparent => "reparent",
            EmbedStep::ZOrder => "z-order",
            EmbedStep::Show => "show",
            EmbedStep::Redraw => "redraw",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct EmbedWarning {
    pub step: EmbedStep,
    pub error: LayerError,
}

/// What an embed pass did. Individual step failures are collected rather
/// than aborting the pass.
#[derive(Debug)]
pub struct EmbedReport {
    pub surface: WindowHandle,
    pub parent: WindowHandle,
    pub strategy: EmbedStrategy,
    pub reparented: bool,
    pub warnings: Vec<EmbedWarning>,
}

impl EmbedReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn check(&mut self, step: EmbedStep, outcome: Result<()>) {
        if let Err(error) = outcome {
            warn!("Embed step {} failed for {}: {}", step, self.surface, error);
            self.warnings.push(EmbedWarning { step, error });
        }
    }
}

/// Attach `surface` beneath the hierarchy according to `strategy`.
///
/// Fails only when the strategy's parent window is unknown; OS call failures
/// along the way end up in the report.
pub fn embed_surface<O: SurfaceOps + ?Sized>(
    ops: &O,
    handles: &HierarchyHandles,
    strategy: EmbedStrategy,
    surface: WindowHandle,
) -> Result<EmbedReport> {
    let parent = match strategy {
        EmbedStrategy::DesktopOwner => handles
            .desktop_owner
            .ok_or(LayerError::DesktopOwnerNotFound(DESKTOP_OWNER_CLASS))?,
        EmbedStrategy::BackgroundWindow => handles.background,
    };

    let mut report = EmbedReport {
        surface,
        parent,
        strategy,
        reparented: false,
        warnings: Vec::new(),
    };

    let restyle = ops
        .style(surface)
        .and_then(|current| ops.set_style(surface, style::child_style(current)));
    report.check(EmbedStep::Style, restyle);

    if strategy == EmbedStrategy::DesktopOwner {
        let layered = ops
            .ex_style(surface)
            .and_then(|current| ops.set_ex_style(surface, style::layered_ex_style(current)))
            .and_then(|_| ops.set_opacity(surface, u8::MAX));
        report.check(EmbedStep::Layered, layered);
    }

    if ops.parent(surface) == Some(parent) {
        debug!("{} already parented to {}, skipping reparent", surface, parent);
    } else {
        let outcome = ops.set_parent(surface, parent);
        report.reparented = outcome.is_ok();
        report.check(EmbedStep::Reparent, outcome);
    }

    if strategy == EmbedStrategy::DesktopOwner {
        // Below the icons, then the wallpaper below us.
        if let Some(icons) = handles.z_order_anchor() {
            report.check(EmbedStep::ZOrder, ops.place_below(surface, icons));
        } else {
            debug!("No icons view sibling, z-order is best effort");
        }
        report.check(EmbedStep::ZOrder, ops.place_below(handles.background, surface));
    }

    report.check(EmbedStep::Show, ops.set_visible(surface, true));
    report.check(EmbedStep::Redraw, ops.redraw(surface));

    info!(
        "Embedded {} under {} ({:?}, {} warnings)",
        surface,
        parent,
        strategy,
        report.warnings.len()
    );
    Ok(report)
}
