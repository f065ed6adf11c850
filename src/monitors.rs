//! Display enumeration and normalization into virtual-desktop space.
//!
//! Raw display coordinates are arrangement dependent: a monitor placed to the
//! left of the primary one has a negative `left`. Every region handed out by
//! this module is shifted so the top-left-most point of the desktop is (0, 0).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, trace};

use crate::error::Result;
use crate::geometry::{DesktopOrigin, MonitorRegion};

/// A display as reported by the OS, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMonitor {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub is_primary: bool,
}

/// Source of display geometry.
pub trait DisplaySource {
    /// Every active physical display, in OS enumeration order.
    fn raw_monitors(&self) -> Vec<RawMonitor>;

    /// Width and height of the virtual desktop bounding box.
    ///
    /// The default derives it from the displays; the Win32 backend asks the
    /// OS directly.
    fn virtual_desktop_size(&self) -> (i32, i32) {
        bounding_size(&self.raw_monitors())
    }

    /// Ask for per-monitor DPI awareness so coordinates are physical pixels.
    fn enable_per_monitor_dpi(&self) -> Result<()>;
}

/// Which part of the desktop the surface should cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonitorSelection {
    #[default]
    WholeDesktop,
    Index(usize),
}

impl From<i32> for MonitorSelection {
    /// Negative indices select the whole desktop.
    fn from(index: i32) -> Self {
        usize::try_from(index)
            .map(MonitorSelection::Index)
            .unwrap_or(MonitorSelection::WholeDesktop)
    }
}

impl fmt::Display for MonitorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorSelection::WholeDesktop => write!(f, "all"),
            MonitorSelection::Index(i) => write!(f, "{}", i),
        }
    }
}

// Serialized as either the string "all" or a plain index.
impl Serialize for MonitorSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MonitorSelection::WholeDesktop => serializer.serialize_str("all"),
            MonitorSelection::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl<'de> Deserialize<'de> for MonitorSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Index(i64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Index(i) if i >= 0 => Ok(MonitorSelection::Index(i as usize)),
            Repr::Index(_) => Ok(MonitorSelection::WholeDesktop),
            Repr::Name(name) if name.eq_ignore_ascii_case("all") => Ok(MonitorSelection::WholeDesktop),
            Repr::Name(other) => Err(serde::de::Error::custom(format!(
                "invalid monitor selection {:?}, expected \"all\" or an index",
                other
            ))),
        }
    }
}

/// Result of one enumeration pass. Replaced wholesale on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorLayout {
    pub origin: DesktopOrigin,
    pub monitors: Vec<MonitorRegion>,
    pub primary: Option<usize>,
    /// Whole virtual desktop, anchored at the normalized origin.
    pub desktop: MonitorRegion,
}

impl MonitorLayout {
    /// Shift every display by the elementwise minimum of the raw left/top values.
    pub fn normalize(raw: &[RawMonitor], virtual_size: (i32, i32)) -> Self {
        // An empty list keeps the identity origin rather than a sentinel.
        let origin = raw
            .iter()
            .fold(None, |acc: Option<DesktopOrigin>, m| {
                Some(match acc {
                    None => DesktopOrigin::new(m.left, m.top),
                    Some(o) => DesktopOrigin::new(o.x.min(m.left), o.y.min(m.top)),
                })
            })
            .unwrap_or_default();

        let monitors = raw
            .iter()
            .map(|m| MonitorRegion::new(m.left - origin.x, m.top - origin.y, m.width, m.height))
            .collect();

        let (width, height) = virtual_size;
        Self {
            origin,
            monitors,
            primary: raw.iter().position(|m| m.is_primary),
            desktop: MonitorRegion::new(0, 0, width, height),
        }
    }

    /// Region for `selection`; an out-of-range index falls back to the whole desktop.
    pub fn select(&self, selection: MonitorSelection) -> MonitorRegion {
        match selection {
            MonitorSelection::Index(i) => match self.monitors.get(i) {
                Some(region) => *region,
                None => {
                    debug!(
                        "Monitor {} out of range ({} displays), using whole desktop",
                        i,
                        self.monitors.len()
                    );
                    self.desktop
                }
            },
            MonitorSelection::WholeDesktop => self.desktop,
        }
    }
}

/// Query the OS and normalize the result.
pub fn enumerate_monitors<S: DisplaySource + ?Sized>(source: &S) -> MonitorLayout {
    let raw = source.raw_monitors();
    let layout = MonitorLayout::normalize(&raw, source.virtual_desktop_size());
    debug!(
        "Enumerated {} monitors, desktop origin ({}, {}), desktop {}",
        layout.monitors.len(),
        layout.origin.x,
        layout.origin.y,
        layout.desktop
    );
    trace!("Monitors: {:?}", layout.monitors);
    layout
}

/// Bounding box extent of a set of displays.
pub fn bounding_size(raw: &[RawMonitor]) -> (i32, i32) {
    if raw.is_empty() {
        return (0, 0);
    }
    let left = raw.iter().map(|m| m.left).min().unwrap_or(0);
    let top = raw.iter().map(|m| m.top).min().unwrap_or(0);
    let right = raw.iter().map(|m| m.left.saturating_add(m.width)).max().unwrap_or(0);
    let bottom = raw.iter().map(|m| m.top.saturating_add(m.height)).max().unwrap_or(0);
    (right.saturating_sub(left), bottom.saturating_sub(top))
}
