//! Well-known names, message ids and tuning defaults.

/// Desktop shell window classes
pub mod shell {
    /// Top-level desktop owner ("Program Manager")
    pub const DESKTOP_OWNER_CLASS: &str = "Progman";

    /// Window that paints the static wallpaper
    pub const BACKGROUND_CLASS: &str = "WorkerW";

    /// Window that hosts the desktop icons
    pub const ICONS_VIEW_CLASS: &str = "SHELLDLL_DefView";

    /// List view holding the individual icons, a child of the icons view
    pub const ICON_LIST_CLASS: &str = "SysListView32";

    /// Undocumented message asking the desktop owner to spawn the background window
    pub const SPAWN_BACKGROUND_MESSAGE: u32 = 0x052C;
}

/// Visibility estimation defaults
pub mod occlusion {
    /// Fraction of a region that must be covered before rendering is skipped
    pub const DEFAULT_THRESHOLD: f64 = 0.95;

    /// Distance between grid samples, in physical pixels
    pub const DEFAULT_SAMPLE_STEP: i32 = 100;

    /// Always-on-top overlays that never hide the wallpaper (NVIDIA in-game overlay)
    pub const DEFAULT_OVERLAY_CLASSES: &[&str] = &["CEF-OSC-WIDGET"];
}

/// Hierarchy discovery timing
pub mod discovery {
    /// Upper bound for the spawn message round trip
    pub const SPAWN_TIMEOUT_MS: u32 = 1000;

    /// Lookups performed before giving up
    pub const DEFAULT_ATTEMPTS: u32 = 1;

    /// Pause between lookups when more than one attempt is configured
    pub const DEFAULT_INTERVAL_MS: u64 = 50;
}
