//! Per-frame visibility estimate for the embedded surface.
//!
//! Every other top-level window that is actually on screen is clipped to the
//! target region; the covered fraction is then estimated by grid sampling.
//! Nothing is cached between calls since the window set changes every frame.

use tracing::trace;

use crate::geometry::{DesktopOrigin, MonitorRegion, Rect, WindowHandle};

/// Snapshot of one top-level window, as needed by the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub handle: WindowHandle,
    pub class_name: String,
    /// Raw screen rectangle; `None` when the OS could not report it.
    pub rect: Option<Rect>,
    pub visible: bool,
    pub minimized: bool,
    /// Suppressed by the compositor. A failed lookup reads as not cloaked.
    pub cloaked: bool,
}

/// Source of top-level window snapshots.
pub trait WindowSource {
    /// Top-level windows in z-order. Descriptors may be produced lazily.
    fn windows(&self) -> Box<dyn Iterator<Item = WindowDescriptor> + '_>;

    /// The shell's desktop window, if any.
    fn shell_window(&self) -> Option<WindowHandle>;
}

/// Decides which windows may hide the surface.
#[derive(Debug, Clone, Default)]
pub struct OcclusionFilter {
    excluded_handles: Vec<WindowHandle>,
    excluded_classes: Vec<String>,
}

impl OcclusionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_handle(mut self, handle: Option<WindowHandle>) -> Self {
        if let Some(handle) = handle.and_then(WindowHandle::non_null) {
            if !self.excluded_handles.contains(&handle) {
                self.excluded_handles.push(handle);
            }
        }
        self
    }

    pub fn exclude_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.excluded_classes.contains(&class) {
            self.excluded_classes.push(class);
        }
        self
    }

    pub fn admits(&self, window: &WindowDescriptor) -> bool {
        if self.excluded_handles.contains(&window.handle) {
            return false;
        }
        if !window.visible || window.minimized || window.cloaked {
            return false;
        }
        !self.excluded_classes.iter().any(|c| *c == window.class_name)
    }
}

/// A target region and the parts of it covered by other windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcclusionQuery {
    region: MonitorRegion,
    occluders: Vec<Rect>,
}

impl OcclusionQuery {
    pub fn new(region: MonitorRegion) -> Self {
        Self {
            region,
            occluders: Vec::new(),
        }
    }

    /// Build a query from a window sequence.
    pub fn collect<I>(region: MonitorRegion, windows: I, origin: DesktopOrigin, filter: &OcclusionFilter) -> Self
    where
        I: IntoIterator<Item = WindowDescriptor>,
    {
        let mut query = Self::new(region);
        for window in windows.into_iter().filter(|w| filter.admits(w)) {
            let Some(raw) = window.rect else {
                continue;
            };
            if query.add(origin.normalize_rect(&raw)) {
                trace!(
                    "Occluder {} ({}) at {:?}",
                    window.handle,
                    window.class_name,
                    raw
                );
            }
        }
        query
    }

    /// Record the part of `rect` (normalized coordinates) inside the region.
    /// Returns whether anything was recorded.
    pub fn add(&mut self, rect: Rect) -> bool {
        match rect.intersect(&self.region.to_rect()) {
            Some(overlap) => {
                self.occluders.push(overlap);
                true
            }
            None => false,
        }
    }

    pub fn region(&self) -> &MonitorRegion {
        &self.region
    }

    pub fn occluders(&self) -> &[Rect] {
        &self.occluders
    }

    pub fn fraction(&self, sample_step: i32) -> f64 {
        coverage_fraction(&self.region, &self.occluders, sample_step)
    }

    /// Inclusive: a fraction equal to the threshold counts as occluded.
    pub fn is_occluded(&self, threshold: f64, sample_step: i32) -> bool {
        self.fraction(sample_step) >= threshold
    }
}

/// Share of grid samples over `region` that fall inside at least one of
/// `occluders`. Samples start at the region's top-left corner and advance by
/// `sample_step` (minimum 1) on both axes. No samples means 0.0.
pub fn coverage_fraction(region: &MonitorRegion, occluders: &[Rect], sample_step: i32) -> f64 {
    if region.is_degenerate() {
        return 0.0;
    }
    let step = sample_step.max(1) as usize;
    let bounds = region.to_rect();

    let mut total: u64 = 0;
    let mut covered: u64 = 0;
    for y in (bounds.top..bounds.bottom).step_by(step) {
        for x in (bounds.left..bounds.right).step_by(step) {
            total += 1;
            if occluders.iter().any(|r| r.contains(x, y)) {
                covered += 1;
            }
        }
    }

    if total == 0 {
        return 0.0;
    }
    covered as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(handle: isize, class: &str, rect: Rect) -> WindowDescriptor {
        WindowDescriptor {
            handle: WindowHandle(handle),
            class_name: class.to_string(),
            rect: Some(rect),
            visible: true,
            minimized: false,
            cloaked: false,
        }
    }

    #[test]
    fn test_half_covered_region() {
        let region = MonitorRegion::new(0, 0, 1000, 1000);
        let mut query = OcclusionQuery::new(region);
        query.add(Rect::new(0, 0, 500, 1000));

        assert_eq!(query.fraction(100), 0.5);
        assert!(query.is_occluded(0.4, 100));
        assert!(!query.is_occluded(0.6, 100));
        assert!(query.is_occluded(0.5, 100));
    }

    #[test]
    fn test_exact_cover_and_empty_set() {
        let region = MonitorRegion::new(1920, 0, 2560, 1440);
        assert_eq!(coverage_fraction(&region, &[], 100), 0.0);
        assert_eq!(coverage_fraction(&region, &[region.to_rect()], 100), 1.0);
    }

    #[test]
    fn test_degenerate_region_reports_zero() {
        let region = MonitorRegion::new(0, 0, 0, 0);
        assert_eq!(coverage_fraction(&region, &[Rect::new(0, 0, 10, 10)], 100), 0.0);
    }

    #[test]
    fn test_fraction_is_monotonic() {
        let region = MonitorRegion::new(0, 0, 1000, 800);
        let rects = [
            Rect::new(0, 0, 300, 300),
            Rect::new(200, 200, 700, 500),
            Rect::new(650, 0, 1000, 800),
            Rect::new(0, 0, 300, 300),
        ];
        let mut previous = 0.0;
        for n in 0..=rects.len() {
            let current = coverage_fraction(&region, &rects[..n], 100);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_non_positive_step_is_clamped() {
        let region = MonitorRegion::new(0, 0, 4, 4);
        assert_eq!(coverage_fraction(&region, &[Rect::new(0, 0, 2, 4)], 0), 0.5);
    }

    #[test]
    fn test_add_clips_to_region() {
        let mut query = OcclusionQuery::new(MonitorRegion::new(100, 100, 200, 200));
        assert!(query.add(Rect::new(0, 0, 150, 150)));
        assert!(!query.add(Rect::new(400, 400, 500, 500)));
        assert_eq!(query.occluders(), &[Rect::new(100, 100, 150, 150)]);
    }

    #[test]
    fn test_filter_rules() {
        let filter = OcclusionFilter::new()
            .exclude_handle(Some(WindowHandle(7)))
            .exclude_handle(None)
            .exclude_class("WorkerW");
        let rect = Rect::new(0, 0, 10, 10);

        assert!(filter.admits(&window(1, "Notepad", rect)));
        assert!(!filter.admits(&window(7, "Notepad", rect)));
        assert!(!filter.admits(&window(2, "WorkerW", rect)));

        let mut hidden = window(3, "Notepad", rect);
        hidden.visible = false;
        assert!(!filter.admits(&hidden));

        let mut minimized = window(4, "Notepad", rect);
        minimized.minimized = true;
        assert!(!filter.admits(&minimized));

        let mut cloaked = window(5, "ApplicationFrameWindow", rect);
        cloaked.cloaked = true;
        assert!(!filter.admits(&cloaked));
    }

    #[test]
    fn test_collect_normalizes_and_skips_missing_rects() {
        let origin = DesktopOrigin::new(-1920, 0);
        let region = MonitorRegion::new(0, 0, 1920, 1080);
        let mut no_rect = window(2, "Notepad", Rect::default());
        no_rect.rect = None;
        let windows = vec![
            // Raw left half of the left monitor.
            window(1, "Notepad", Rect::new(-1920, 0, -960, 1080)),
            no_rect,
            // Entirely on the other monitor.
            window(3, "Chrome_WidgetWin_1", Rect::new(0, 0, 800, 600)),
        ];

        let query = OcclusionQuery::collect(region, windows, origin, &OcclusionFilter::new());
        assert_eq!(query.occluders(), &[Rect::new(0, 0, 960, 1080)]);
        assert_eq!(query.fraction(100), 0.5);
    }
}
