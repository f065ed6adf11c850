//! Restoring the native desktop background after the surface is gone.

use std::fmt;

use tracing::info;

use crate::error::Result;

/// Wallpaper path exactly as the OS stores it (UTF-16, not interpreted).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WallpaperPath(pub Vec<u16>);

impl WallpaperPath {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WallpaperPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.0))
    }
}

/// Access to the OS wallpaper setting.
pub trait WallpaperStore {
    fn current_wallpaper(&self) -> Result<WallpaperPath>;

    /// Apply and broadcast the change so the shell repaints its background.
    fn apply_wallpaper(&self, path: &WallpaperPath) -> Result<()>;
}

/// Re-apply the configured wallpaper verbatim to force a clean redraw.
pub fn restore_wallpaper<S: WallpaperStore + ?Sized>(store: &S) -> Result<()> {
    let path = store.current_wallpaper()?;
    store.apply_wallpaper(&path)?;
    if path.is_empty() {
        info!("Desktop background refreshed (no wallpaper image configured)");
    } else {
        info!("Desktop background refreshed with {}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayerError;
    use std::cell::RefCell;

    struct MemoryStore {
        current: Option<WallpaperPath>,
        applied: RefCell<Vec<WallpaperPath>>,
    }

    impl WallpaperStore for MemoryStore {
        fn current_wallpaper(&self) -> Result<WallpaperPath> {
            self.current
                .clone()
                .ok_or_else(|| LayerError::os("SystemParametersInfoW", "read failed"))
        }

        fn apply_wallpaper(&self, path: &WallpaperPath) -> Result<()> {
            self.applied.borrow_mut().push(path.clone());
            Ok(())
        }
    }

    #[test]
    fn test_restore_reapplies_verbatim() {
        // Lone surrogate must survive untouched.
        let raw = vec![0x0043, 0x003A, 0xD800, 0x0061];
        let store = MemoryStore {
            current: Some(WallpaperPath(raw.clone())),
            applied: RefCell::new(Vec::new()),
        };
        restore_wallpaper(&store).unwrap();
        assert_eq!(store.applied.borrow().as_slice(), &[WallpaperPath(raw)]);
    }

    #[test]
    fn test_restore_skips_apply_when_read_fails() {
        let store = MemoryStore {
            current: None,
            applied: RefCell::new(Vec::new()),
        };
        assert!(restore_wallpaper(&store).is_err());
        assert!(store.applied.borrow().is_empty());
    }
}
