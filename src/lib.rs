//! Desktop Layer
//!
//! Embeds an application-owned window into the Windows desktop so it renders
//! between the wallpaper and the desktop icons, and estimates how much of it
//! is hidden by other top-level windows.
//!
//! Policy lives in platform-agnostic modules behind small traits; the Win32
//! backend implements them on Windows only.

pub mod config;
pub mod embed;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod input;
pub mod logging;
pub mod monitors;
pub mod occlusion;
pub mod session;
pub mod settings;
pub mod teardown;
pub mod window_layer;

#[cfg(target_os = "windows")]
mod demo;
#[cfg(target_os = "windows")]
pub mod win32;

use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

pub use embed::{EmbedReport, EmbedStrategy};
pub use error::{LayerError, Result};
pub use geometry::{DesktopOrigin, MonitorRegion, Rect, WindowHandle};
pub use hierarchy::{HierarchyHandles, HierarchyLayout};
pub use input::{CursorTranslator, MouseButton, MouseState};
pub use monitors::{MonitorLayout, MonitorSelection};
pub use settings::LayerSettings;
pub use window_layer::{Platform, WindowLayer};

#[cfg(target_os = "windows")]
pub use win32::Win32Desktop;

/// Entry point of the demo binary. The only argument is an optional path to
/// a JSON settings file.
pub fn main() -> ExitCode {
    let settings = match std::env::args().nth(1) {
        Some(path) => match LayerSettings::load(Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => LayerSettings::default(),
    };

    if let Err(e) = logging::init_logging(settings.log_level.as_deref()) {
        eprintln!("{}", e);
    }

    info!("Starting desktop-layer v{}", env!("CARGO_PKG_VERSION"));

    match run(settings) {
        Ok(()) => {
            info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "windows")]
fn run(settings: LayerSettings) -> std::result::Result<(), Box<dyn std::error::Error>> {
    demo::run(settings)
}

#[cfg(not(target_os = "windows"))]
fn run(_settings: LayerSettings) -> std::result::Result<(), Box<dyn std::error::Error>> {
    Err(format!(
        "desktop embedding is unsupported on {}; it requires the Windows shell",
        std::env::consts::OS
    )
    .into())
}
