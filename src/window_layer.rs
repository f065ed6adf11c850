//! Window Layer: the embedding context.
//!
//! `WindowLayer` owns the discovered hierarchy handles, the last monitor
//! layout and the embedded surface. It is created once by [`WindowLayer::initialize`]
//! and driven from the thread that owns the host's message loop; nothing in
//! here spawns threads or locks.

use tracing::{debug, info, trace, warn};

use crate::config::shell::BACKGROUND_CLASS;
use crate::embed::{self, EmbedReport, SurfaceOps};
use crate::error::{LayerError, Result};
use crate::geometry::{DesktopOrigin, MonitorRegion, WindowHandle};
use crate::hierarchy::{self, HierarchyHandles, WindowTree};
use crate::input::CursorTranslator;
use crate::monitors::{self, DisplaySource, MonitorLayout, MonitorSelection};
use crate::occlusion::{OcclusionFilter, OcclusionQuery, WindowSource};
use crate::settings::{self, LayerSettings};
use crate::teardown::{self, WallpaperStore};

/// Everything the layer needs from the OS.
pub trait Platform: DisplaySource + WindowTree + WindowSource + SurfaceOps + WallpaperStore {}

impl<T> Platform for T where T: DisplaySource + WindowTree + WindowSource + SurfaceOps + WallpaperStore {}

pub struct WindowLayer<P: Platform> {
    platform: P,
    settings: LayerSettings,
    handles: HierarchyHandles,
    layout: MonitorLayout,
    surface: Option<WindowHandle>,
    selected: Option<MonitorRegion>,
    icons_hidden: bool,
}

impl<P: Platform> WindowLayer<P> {
    /// Discover the desktop hierarchy. Must run before the caller creates its
    /// surface; fails only when the background window cannot be found.
    pub fn initialize(platform: P, settings: LayerSettings) -> Result<Self> {
        let settings = settings.sanitized();
        let os = os_info::get();
        info!("Initializing desktop layer on {} {}", os.os_type(), os.version());

        if let Err(e) = platform.enable_per_monitor_dpi() {
            warn!("Per-monitor DPI awareness unavailable, coordinates may be scaled: {}", e);
        }

        let handles = hierarchy::locate(&platform, &settings.discovery())?;
        let layout = monitors::enumerate_monitors(&platform);

        Ok(Self {
            platform,
            settings,
            handles,
            layout,
            surface: None,
            selected: None,
            icons_hidden: false,
        })
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn settings(&self) -> &LayerSettings {
        &self.settings
    }

    pub fn handles(&self) -> &HierarchyHandles {
        &self.handles
    }

    pub fn surface(&self) -> Option<WindowHandle> {
        self.surface
    }

    pub fn origin(&self) -> DesktopOrigin {
        self.layout.origin
    }

    pub fn layout(&self) -> &MonitorLayout {
        &self.layout
    }

    /// Region most recently passed to [`Self::configure_positioning`].
    pub fn selected_region(&self) -> Option<MonitorRegion> {
        self.selected
    }

    /// Re-enumerate displays; replaces the layout and the desktop origin.
    pub fn enumerate_monitors(&mut self) -> &[MonitorRegion] {
        self.layout = monitors::enumerate_monitors(&self.platform);
        &self.layout.monitors
    }

    /// Fresh enumeration, then pick a display or the whole desktop.
    pub fn select_target(&mut self, selection: impl Into<MonitorSelection>) -> MonitorRegion {
        self.enumerate_monitors();
        self.layout.select(selection.into())
    }

    /// Target from the configured monitor selection.
    pub fn configured_target(&mut self) -> MonitorRegion {
        let selection = self.settings.monitor;
        self.select_target(selection)
    }

    /// Attach the caller's surface. Embedding the same surface again
    /// re-applies styles and z-order; a different one is refused.
    pub fn embed(&mut self, surface: WindowHandle) -> Result<EmbedReport> {
        if let Some(current) = self.surface {
            if current != surface {
                return Err(LayerError::AlreadyEmbedded(current));
            }
            debug!("Re-applying embedding for {}", surface);
        }

        let report = embed::embed_surface(&self.platform, &self.handles, self.settings.strategy, surface)?;
        self.surface = Some(surface);

        if self.settings.hide_desktop_icons {
            if let Err(e) = self.set_icons_visible(false) {
                warn!("Could not hide desktop icons: {}", e);
            }
        }
        Ok(report)
    }

    /// Move and resize the surface to `region` without touching z-order.
    /// The region is remembered for cursor translation even when the move fails.
    pub fn configure_positioning(&mut self, region: MonitorRegion) -> Result<()> {
        self.selected = Some(region);
        let surface = self.surface.ok_or(LayerError::NotEmbedded)?;
        self.platform.set_bounds(surface, &region).map_err(|e| {
            warn!("Could not position {} at {}: {}", surface, region, e);
            e
        })?;
        debug!("Positioned {} at {}", surface, region);
        Ok(())
    }

    /// Embed `surface` and move it onto `region`. Only the embedding can
    /// fail; a failed move leaves the surface at its creation geometry.
    pub fn attach(&mut self, surface: WindowHandle, region: MonitorRegion) -> Result<EmbedReport> {
        let report = self.embed(surface)?;
        // Logged by configure_positioning.
        let _ = self.configure_positioning(region);
        Ok(report)
    }

    /// Estimated share of `region` hidden by other windows.
    pub fn occlusion_fraction(&self, region: &MonitorRegion) -> f64 {
        let query = OcclusionQuery::collect(
            *region,
            self.platform.windows(),
            self.layout.origin,
            &self.occlusion_filter(),
        );
        let fraction = query.fraction(self.settings.sample_step);
        trace!(
            "Occlusion of {}: {:.3} from {} windows",
            region,
            fraction,
            query.occluders().len()
        );
        fraction
    }

    /// Whether at least `threshold` of `region` is covered.
    pub fn is_occluded(&self, region: &MonitorRegion, threshold: f64) -> bool {
        self.occlusion_fraction(region) >= settings::clamp_threshold(threshold)
    }

    /// [`Self::is_occluded`] with the configured threshold.
    pub fn is_occluded_default(&self, region: &MonitorRegion) -> bool {
        self.is_occluded(region, self.settings.occlusion_threshold)
    }

    fn occlusion_filter(&self) -> OcclusionFilter {
        let filter = OcclusionFilter::new()
            .exclude_handle(self.surface)
            .exclude_handle(Some(self.handles.background))
            .exclude_handle(self.handles.desktop_owner)
            .exclude_handle(self.platform.shell_window())
            .exclude_class(BACKGROUND_CLASS);
        self.settings
            .overlay_classes
            .iter()
            .fold(filter, |f, class| f.exclude_class(class.as_str()))
    }

    /// Show or hide the desktop icons. Teardown restores them.
    pub fn set_icons_visible(&mut self, visible: bool) -> Result<()> {
        let list = self.handles.icon_list.ok_or(LayerError::IconListNotFound)?;
        self.platform.set_visible(list, visible)?;
        self.icons_hidden = !visible;
        info!("Desktop icons visibility set to {}", visible);
        Ok(())
    }

    pub fn cursor_translator(&self) -> CursorTranslator {
        CursorTranslator::new(self.layout.origin, self.selected.unwrap_or(self.layout.desktop))
    }

    /// Call after the surface is destroyed: shows the icons again if we hid
    /// them and re-applies the wallpaper so the shell repaints.
    pub fn teardown(mut self) -> Result<()> {
        self.restore_icons();
        teardown::restore_wallpaper(&self.platform)
    }

    fn restore_icons(&mut self) {
        if !self.icons_hidden {
            return;
        }
        match self.set_icons_visible(true) {
            Ok(()) => info!("Desktop icons restored"),
            Err(e) => warn!("Failed to restore desktop icons: {}", e),
        }
        self.icons_hidden = false;
    }
}

impl<P: Platform> Drop for WindowLayer<P> {
    fn drop(&mut self) {
        self.restore_icons();
    }
}
