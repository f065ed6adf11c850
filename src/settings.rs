//! User-facing settings, loaded from JSON. Every field has a default so an
//! empty object (or no file at all) is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config;
use crate::embed::EmbedStrategy;
use crate::error::{LayerError, Result};
use crate::hierarchy::Discovery;
use crate::monitors::MonitorSelection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    pub strategy: EmbedStrategy,
    pub monitor: MonitorSelection,
    pub occlusion_threshold: f64,
    pub sample_step: i32,
    pub spawn_timeout_ms: u32,
    pub discovery_attempts: u32,
    pub discovery_interval_ms: u64,
    pub overlay_classes: Vec<String>,
    pub hide_desktop_icons: bool,
    /// `RUST_LOG`-style filter for the demo binary.
    pub log_level: Option<String>,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            strategy: EmbedStrategy::default(),
            monitor: MonitorSelection::WholeDesktop,
            occlusion_threshold: config::occlusion::DEFAULT_THRESHOLD,
            sample_step: config::occlusion::DEFAULT_SAMPLE_STEP,
            spawn_timeout_ms: config::discovery::SPAWN_TIMEOUT_MS,
            discovery_attempts: config::discovery::DEFAULT_ATTEMPTS,
            discovery_interval_ms: config::discovery::DEFAULT_INTERVAL_MS,
            overlay_classes: config::occlusion::DEFAULT_OVERLAY_CLASSES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            hide_desktop_icons: false,
            log_level: None,
        }
    }
}

impl LayerSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: LayerSettings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| LayerError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Clamp values into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.occlusion_threshold = clamp_threshold(self.occlusion_threshold);
        self.sample_step = self.sample_step.max(1);
        self.discovery_attempts = self.discovery_attempts.max(1);
        self
    }

    pub fn discovery(&self) -> Discovery {
        Discovery {
            spawn_timeout_ms: self.spawn_timeout_ms,
            attempts: self.discovery_attempts,
            interval: Duration::from_millis(self.discovery_interval_ms),
        }
    }
}

/// Thresholds live in [0, 1]; NaN becomes the default.
pub fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        config::occlusion::DEFAULT_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}
